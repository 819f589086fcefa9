use crate::{host, Context, GroupChecker};
use ahash::AHashSet as HashSet;
use mesh_validator_core::{Check, Object, RoutingSpec, ValidationKey, Validations};
use std::collections::{BTreeMap, BTreeSet};

const SINGLE_HOST: &str = "virtualservices.singlehost";

/// Routing specs without gateways are bound to the sidecars of the mesh.
const MESH_GATEWAY: &str = "mesh";

/// Flags routing specs that declare routes for the same host on the same gateway.
pub(super) struct SingleHostChecker<'a> {
    pub ctx: Context<'a>,
    pub routing_specs: &'a [RoutingSpec],
    pub exported_routing_specs: &'a [RoutingSpec],
}

impl GroupChecker for SingleHostChecker<'_> {
    fn check(&self) -> Validations {
        let mut seen = HashSet::new();
        let candidates = self
            .routing_specs
            .iter()
            .chain(self.exported_routing_specs)
            .filter(|vs| seen.insert(vs.key()))
            .collect::<Vec<_>>();

        let mut conflicts = BTreeMap::<ValidationKey, BTreeSet<ValidationKey>>::new();
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if !shares_gateway(a, b) || !host::conflicting(*a, *b, &self.ctx) {
                    continue;
                }

                tracing::debug!(
                    a.namespace = %a.namespace,
                    a.name = %a.name,
                    b.namespace = %b.namespace,
                    b.name = %b.name,
                    "Multiple routing specs declare host",
                );
                conflicts.entry(a.key()).or_default().insert(b.key());
                conflicts.entry(b.key()).or_default().insert(a.key());
            }
        }

        let mut validations = Validations::default();
        for (key, partners) in conflicts {
            let validation = validations.entry(key);
            validation.add_check(Check::warning(SINGLE_HOST, "spec/hosts"));
            validation.references.extend(partners);
        }
        validations
    }
}

fn gateways(vs: &RoutingSpec) -> impl Iterator<Item = &str> + '_ {
    let implicit = vs.gateways.is_empty().then_some(MESH_GATEWAY);
    vs.gateways.iter().map(String::as_str).chain(implicit)
}

fn shares_gateway(a: &RoutingSpec, b: &RoutingSpec) -> bool {
    gateways(a).any(|ga| gateways(b).any(|gb| ga == gb))
}
