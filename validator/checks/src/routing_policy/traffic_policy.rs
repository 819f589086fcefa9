use super::Scope;
use crate::{host::Fqdn, Context, GroupChecker};
use mesh_validator_core::{
    Check, HasTrafficPolicy, Object, RoutingPolicy, TlsMode, TrafficPolicy, Validations,
};
use std::collections::BTreeMap;

const NO_TLS_SETTINGS: &str = "destinationrules.trafficpolicy.notlssettings";

/// Flags routing policies whose traffic policy omits TLS settings while a mesh-wide or
/// namespace-wide policy enables mutual TLS for their host. A traffic policy replaces the wider
/// one entirely, so omitting TLS silently disables mutual TLS for that host.
pub(super) struct TrafficPolicyChecker<'a> {
    pub ctx: Context<'a>,
    pub routing_policies: &'a [RoutingPolicy],
    pub exported_routing_policies: &'a [RoutingPolicy],
}

impl GroupChecker for TrafficPolicyChecker<'_> {
    fn check(&self) -> Validations {
        let mut mesh = None;
        let mut namespaces = BTreeMap::new();
        for dr in self
            .routing_policies
            .iter()
            .chain(self.exported_routing_policies)
        {
            match Scope::of(dr, &self.ctx) {
                Scope::Mesh => {
                    mesh.get_or_insert(dr);
                }
                Scope::Namespace(ns) => {
                    namespaces.entry(ns).or_insert(dr);
                }
                Scope::Object => {}
            }
        }

        let mut validations = Validations::default();
        for dr in self.routing_policies {
            let Some(traffic_policy) = dr.traffic_policy() else {
                continue;
            };
            if Scope::of(dr, &self.ctx).is_wide() {
                continue;
            }

            let fqdn = Fqdn::qualify(&dr.host, &dr.namespace, &self.ctx);
            let Some(ns) = self.ctx.config.service_namespace(fqdn.as_str()) else {
                continue;
            };

            // A namespace-wide policy takes precedence over the mesh-wide one, even when it
            // doesn't enable mutual TLS itself.
            let Some(wide) = namespaces.get(ns).copied().or(mesh) else {
                continue;
            };
            if wide.tls_mode() != TlsMode::MeshMutual {
                continue;
            }

            let paths = missing_tls_paths(traffic_policy);
            if paths.is_empty() {
                continue;
            }

            tracing::debug!(
                namespace = %dr.namespace,
                name = %dr.name,
                enabled_by = %wide.name,
                "Traffic policy overrides mutual TLS",
            );
            let validation = validations.entry(dr.key());
            validation.add_checks(paths.into_iter().map(|p| Check::warning(NO_TLS_SETTINGS, p)));
            validation.add_reference(wide.key());
        }
        validations
    }
}

fn missing_tls_paths(traffic_policy: &TrafficPolicy) -> Vec<String> {
    let mut paths = vec![];
    if traffic_policy.tls_mode == TlsMode::Unset {
        paths.push("spec/trafficPolicy".to_string());
    }
    for (idx, port) in traffic_policy.port_level.iter().enumerate() {
        if port.tls_mode == TlsMode::Unset {
            paths.push(format!("spec/trafficPolicy/portLevelSettings[{idx}]"));
        }
    }
    paths
}
