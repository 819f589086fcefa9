use super::Scope;
use crate::{host::Fqdn, Checker, Context};
use mesh_validator_core::{
    AuthPolicy, Check, HasTrafficPolicy, MeshConfig, MtlsMode, Object, RoutingPolicy, TlsMode,
};
use std::collections::BTreeMap;

const MESH_POLICY_MISSING: &str = "destinationrules.mtls.meshpolicymissing";
const NAMESPACE_POLICY_MISSING: &str = "destinationrules.mtls.nspolicymissing";
const MESH_POLICY_MTLS_ENABLED: &str = "destinationrules.mtls.meshpolicymtlsenabled";
const NAMESPACE_POLICY_MTLS_ENABLED: &str = "destinationrules.mtls.nspolicymtlsenabled";
const POLICY_MTLS_ENABLED: &str = "destinationrules.mtls.policymtlsenabled";

const TLS_MODE_PATH: &str = "spec/trafficPolicy/tls/mode";

/// The mesh-wide and namespace-wide authentication policies, resolved by precedence.
#[derive(Debug, Default)]
pub struct AuthPolicies<'a> {
    mesh: Option<&'a AuthPolicy>,
    namespaces: BTreeMap<&'a str, &'a AuthPolicy>,
}

/// Compares a routing policy's client TLS mode with the server-side mode in effect for the
/// hosts it applies to.
pub(super) struct MtlsChecker<'a> {
    pub ctx: Context<'a>,
    pub auth_policies: &'a AuthPolicies<'a>,
    pub routing_policy: &'a RoutingPolicy,
}

// === impl AuthPolicies ===

impl<'a> AuthPolicies<'a> {
    /// Indexes the policies that apply to a whole namespace. Policies in the root namespace apply
    /// to the whole mesh. Workload-scoped policies are ignored.
    ///
    /// When several policies claim the same scope, the one with the lowest name wins.
    pub fn new(policies: &'a [AuthPolicy], config: &MeshConfig) -> Self {
        let mut index = Self::default();
        for policy in policies.iter().filter(|p| p.is_namespace_wide()) {
            if policy.namespace == config.root_namespace {
                index.mesh = Some(Self::lowest(index.mesh, policy));
            } else {
                let ns = policy.namespace.as_str();
                let current = index.namespaces.get(ns).copied();
                index.namespaces.insert(ns, Self::lowest(current, policy));
            }
        }
        index
    }

    fn lowest(current: Option<&'a AuthPolicy>, policy: &'a AuthPolicy) -> &'a AuthPolicy {
        match current {
            Some(current) if current.name <= policy.name => {
                tracing::debug!(
                    namespace = %policy.namespace,
                    name = %policy.name,
                    winner = %current.name,
                    "Ignoring conflicting authentication policy",
                );
                current
            }
            _ => policy,
        }
    }

    pub fn mesh_mode(&self) -> MtlsMode {
        self.mesh.map(|p| p.mode).unwrap_or_default()
    }

    /// The mode in effect for a namespace: its own policy unless unset, otherwise the mesh's.
    pub fn namespace_mode(&self, ns: &str) -> MtlsMode {
        match self.namespaces.get(ns).map(|p| p.mode) {
            Some(MtlsMode::Unset) | None => self.mesh_mode(),
            Some(mode) => mode,
        }
    }
}

// === impl MtlsChecker ===

impl Checker for MtlsChecker<'_> {
    fn check(&self) -> Vec<Check> {
        let dr = self.routing_policy;
        let code = match (Scope::of(dr, &self.ctx), dr.tls_mode()) {
            (Scope::Mesh, TlsMode::MeshMutual) if !self.auth_policies.mesh_mode().accepts_mtls() => {
                MESH_POLICY_MISSING
            }
            (Scope::Namespace(ns), TlsMode::MeshMutual)
                if !self.auth_policies.namespace_mode(ns).accepts_mtls() =>
            {
                NAMESPACE_POLICY_MISSING
            }
            (Scope::Mesh, TlsMode::Disable)
                if self.auth_policies.mesh_mode() == MtlsMode::Strict =>
            {
                MESH_POLICY_MTLS_ENABLED
            }
            (Scope::Namespace(ns), TlsMode::Disable)
                if self.auth_policies.namespace_mode(ns) == MtlsMode::Strict =>
            {
                NAMESPACE_POLICY_MTLS_ENABLED
            }
            (Scope::Object, TlsMode::Disable) if self.requires_mtls() => POLICY_MTLS_ENABLED,
            _ => return vec![],
        };

        tracing::debug!(
            namespace = %dr.namespace(),
            name = %dr.name(),
            %code,
            "Mutual TLS mismatch",
        );
        vec![Check::error(code, TLS_MODE_PATH)]
    }
}

impl MtlsChecker<'_> {
    /// Whether servers for the policy's host only accept mutual TLS.
    fn requires_mtls(&self) -> bool {
        let dr = self.routing_policy;
        let fqdn = Fqdn::qualify(&dr.host, &dr.namespace, &self.ctx);
        match self.ctx.config.service_namespace(fqdn.as_str()) {
            Some(ns) => self.auth_policies.namespace_mode(ns) == MtlsMode::Strict,
            None => false,
        }
    }
}
