mod mtls;
mod multi_match;
mod traffic_policy;

pub use self::mtls::AuthPolicies;
use self::{mtls::MtlsChecker, multi_match::MultiMatchChecker, traffic_policy::TrafficPolicyChecker};
use crate::{export_to::ExportToNamespaceChecker, Checker, Context, GroupChecker, ObjectChecker};
use mesh_validator_core::{Object, RoutingPolicy, Validation, Validations};

/// Validates routing policies declared in, or exported into, a namespace.
pub struct RoutingPolicyChecker<'a> {
    pub ctx: Context<'a>,
    pub auth_policies: &'a AuthPolicies<'a>,
    pub routing_policies: &'a [RoutingPolicy],
    pub exported_routing_policies: &'a [RoutingPolicy],
}

impl ObjectChecker for RoutingPolicyChecker<'_> {
    fn check(&self) -> Validations {
        let _span = tracing::debug_span!(
            "routing_policies",
            local = self.routing_policies.len(),
            exported = self.exported_routing_policies.len(),
        )
        .entered();

        let mut validations = self.run_individual_checks();
        validations.merge(self.run_group_checks());
        validations
    }
}

impl RoutingPolicyChecker<'_> {
    fn run_individual_checks(&self) -> Validations {
        self.routing_policies
            .iter()
            .map(|dr| self.run_checks(dr))
            .collect()
    }

    fn run_checks(&self, dr: &RoutingPolicy) -> Validation {
        let mut validation = Validation::new(&dr.key());

        let mut checkers: Vec<Box<dyn Checker + '_>> = vec![Box::new(ExportToNamespaceChecker {
            object: dr,
            namespaces: self.ctx.namespaces,
        })];

        // Mutual TLS consistency only matters when the mesh doesn't negotiate it automatically.
        if !self.ctx.config.auto_mtls {
            checkers.push(Box::new(MtlsChecker {
                ctx: self.ctx,
                auth_policies: self.auth_policies,
                routing_policy: dr,
            }));
        }

        for checker in checkers {
            validation.add_checks(checker.check());
        }
        validation
    }

    fn run_group_checks(&self) -> Validations {
        let mut checkers: Vec<Box<dyn GroupChecker + '_>> = vec![Box::new(MultiMatchChecker {
            ctx: self.ctx,
            routing_policies: self.routing_policies,
            exported_routing_policies: self.exported_routing_policies,
        })];

        if !self.ctx.config.auto_mtls {
            checkers.push(Box::new(TrafficPolicyChecker {
                ctx: self.ctx,
                routing_policies: self.routing_policies,
                exported_routing_policies: self.exported_routing_policies,
            }));
        }

        let mut validations = Validations::default();
        for checker in checkers {
            validations.merge(checker.check());
        }
        validations
    }
}

/// Where a routing policy's declaration applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Scope<'a> {
    /// Every host in the mesh, e.g. `*.local`.
    Mesh,

    /// Every host in a namespace, e.g. `*.bookinfo.svc.cluster.local`.
    Namespace(&'a str),

    /// A single host or external wildcard.
    Object,
}

// === impl Scope ===

impl<'a> Scope<'a> {
    pub(crate) fn of(dr: &'a RoutingPolicy, ctx: &Context<'_>) -> Self {
        let Some(suffix) = dr.host.strip_prefix("*.") else {
            return Self::Object;
        };

        if suffix == "local" || suffix == ctx.config.cluster_domain {
            return Self::Mesh;
        }

        if suffix == format!("{}.{}", dr.namespace, ctx.config.service_suffix()) {
            return Self::Namespace(&dr.namespace);
        }

        Self::Object
    }

    pub(crate) fn is_wide(&self) -> bool {
        !matches!(self, Self::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_validator_core::{ExternalHosts, MeshConfig, Namespaces};
    use rstest::rstest;

    #[rstest]
    #[case::mesh_local("bookinfo", "*.local", Scope::Mesh)]
    #[case::mesh_domain("bookinfo", "*.cluster.local", Scope::Mesh)]
    #[case::namespace("bookinfo", "*.bookinfo.svc.cluster.local", Scope::Namespace("bookinfo"))]
    #[case::other_namespace("bookinfo", "*.default.svc.cluster.local", Scope::Object)]
    #[case::service("bookinfo", "reviews.bookinfo.svc.cluster.local", Scope::Object)]
    #[case::external("bookinfo", "*.wikipedia.org", Scope::Object)]
    fn scope(#[case] ns: &str, #[case] host: &str, #[case] expected: Scope<'static>) {
        let config = MeshConfig::default();
        let namespaces = Namespaces::default();
        let external_hosts = ExternalHosts::default();
        let ctx = Context {
            config: &config,
            namespaces: &namespaces,
            external_hosts: &external_hosts,
        };
        let dr = RoutingPolicy::new(ns, "dr", host);
        assert_eq!(Scope::of(&dr, &ctx), expected);
    }
}
