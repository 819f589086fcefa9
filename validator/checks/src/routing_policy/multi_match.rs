use crate::{host, Context, GroupChecker};
use ahash::AHashSet as HashSet;
use mesh_validator_core::{
    Check, HasSubsets, HasTrafficPolicy, MeshConfig, Object, RoutingPolicy, TlsMode, ValidationKey,
    Validations, ALL_SUBSETS,
};
use std::collections::{BTreeMap, BTreeSet};

const MULTI_MATCH: &str = "destinationrules.multimatch";

/// Flags routing policies whose hosts overlap, so that more than one of them could apply to the
/// same destination.
pub(super) struct MultiMatchChecker<'a> {
    pub ctx: Context<'a>,
    pub routing_policies: &'a [RoutingPolicy],
    pub exported_routing_policies: &'a [RoutingPolicy],
}

impl GroupChecker for MultiMatchChecker<'_> {
    fn check(&self) -> Validations {
        let candidates = self.candidates();

        let mut conflicts = BTreeMap::<ValidationKey, BTreeSet<ValidationKey>>::new();
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if !host::conflicting(*a, *b, &self.ctx) || !subsets_overlap(*a, *b) {
                    continue;
                }

                tracing::debug!(
                    a.namespace = %a.namespace,
                    a.name = %a.name,
                    b.namespace = %b.namespace,
                    b.name = %b.name,
                    "Multiple routing policies match host",
                );
                conflicts.entry(a.key()).or_default().insert(b.key());
                conflicts.entry(b.key()).or_default().insert(a.key());
            }
        }

        let mut validations = Validations::default();
        for (key, partners) in conflicts {
            let validation = validations.entry(key);
            validation.add_check(Check::warning(MULTI_MATCH, "spec/host"));
            validation.references.extend(partners);
        }
        validations
    }
}

impl<'a> MultiMatchChecker<'a> {
    /// Local and exported policies, each identity once, excluding policies that only declare
    /// mesh-wide or namespace-wide mutual TLS. Those are validated by the mutual TLS checkers.
    fn candidates(&self) -> Vec<&'a RoutingPolicy> {
        let mut seen = HashSet::new();
        self.routing_policies
            .iter()
            .chain(self.exported_routing_policies)
            .filter(|dr| seen.insert(dr.key()))
            .filter(|dr| !self.is_wide_mtls(dr))
            .collect()
    }

    fn is_wide_mtls(&self, dr: &RoutingPolicy) -> bool {
        dr.tls_mode() == TlsMode::MeshMutual
            && dr.subsets.is_empty()
            && is_wide_host(&dr.host, self.ctx.config)
    }
}

/// Whether `host` covers the whole mesh (`*.local`, `*.<cluster domain>`) or a whole namespace
/// (`*.<ns>.svc.<cluster domain>`). The namespace need not be the policy's own.
fn is_wide_host(host: &str, config: &MeshConfig) -> bool {
    let Some(suffix) = host.strip_prefix("*.") else {
        return false;
    };

    if suffix == "local" || suffix == config.cluster_domain {
        return true;
    }

    suffix
        .strip_suffix(config.service_suffix().as_str())
        .and_then(|ns| ns.strip_suffix('.'))
        .is_some_and(|ns| !ns.is_empty() && !ns.contains('.'))
}

/// Policies without subsets apply to every subset of the host; otherwise they only collide when
/// they name a common subset or one of them matches all subsets.
fn subsets_overlap<A: HasSubsets, B: HasSubsets>(a: &A, b: &B) -> bool {
    let (a, b) = (a.subsets(), b.subsets());
    if a.is_empty() || b.is_empty() {
        return true;
    }

    if a.iter().chain(b).any(|s| s == ALL_SUBSETS) {
        return true;
    }

    a.iter().any(|s| b.contains(s))
}
