use crate::{export::mutually_visible, host::Fqdn, Checker, Context};
use mesh_validator_core::{Check, HasSubsets, Object, RoutingPolicy, RoutingSpec, ALL_SUBSETS};

const SUBSET_NOT_FOUND: &str = "virtualservices.subsetpresent.subsetnotfound";

/// Requires every subset referenced by a route destination to be declared by a visible routing
/// policy for the same host.
pub(super) struct SubsetPresenceChecker<'a> {
    pub ctx: Context<'a>,
    pub routing_spec: &'a RoutingSpec,
    pub routing_policies: &'a [RoutingPolicy],
    pub exported_routing_policies: &'a [RoutingPolicy],
}

impl Checker for SubsetPresenceChecker<'_> {
    fn check(&self) -> Vec<Check> {
        let vs = self.routing_spec;
        let mut checks = vec![];
        for (path, dst) in vs.route_destinations() {
            let Some(subset) = dst.subset.as_deref() else {
                continue;
            };

            let host = Fqdn::qualify(&dst.host, vs.namespace(), &self.ctx);
            if !self.subset_declared(&host, subset) {
                tracing::debug!(
                    namespace = %vs.namespace,
                    name = %vs.name,
                    %host,
                    %subset,
                    "Subset not found",
                );
                checks.push(Check::error(SUBSET_NOT_FOUND, path));
            }
        }
        checks
    }
}

impl SubsetPresenceChecker<'_> {
    fn subset_declared(&self, host: &Fqdn, subset: &str) -> bool {
        self.routing_policies
            .iter()
            .chain(self.exported_routing_policies)
            .filter(|dr| mutually_visible(*dr, self.routing_spec, self.ctx.namespaces))
            .filter(|dr| Fqdn::qualify(&dr.host, dr.namespace(), &self.ctx).overlaps(host))
            .any(|dr| {
                dr.subsets()
                    .iter()
                    .any(|s| s == subset || s == ALL_SUBSETS)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_validator_core::{
        ExternalHosts, MeshConfig, Namespaces, Route, RouteDestination, RouteProtocol, Severity,
    };
    use pretty_assertions::assert_eq;

    fn check(vs: &RoutingSpec, local: &[RoutingPolicy], exported: &[RoutingPolicy]) -> Vec<Check> {
        let config = MeshConfig::default();
        let namespaces = ["bookinfo", "bookinfo2"].into_iter().collect::<Namespaces>();
        let external_hosts = ExternalHosts::default();
        SubsetPresenceChecker {
            ctx: Context {
                config: &config,
                namespaces: &namespaces,
                external_hosts: &external_hosts,
            },
            routing_spec: vs,
            routing_policies: local,
            exported_routing_policies: exported,
        }
        .check()
    }

    fn reviews(subsets: &[&str]) -> RoutingSpec {
        let route = subsets.iter().fold(Route::new(RouteProtocol::Http, 0), |route, s| {
            route.with_destination(RouteDestination::new("reviews").with_subset(s))
        });
        RoutingSpec::new("bookinfo", "reviews", ["reviews"]).with_route(route)
    }

    #[test]
    fn subsets_present() {
        let dr = RoutingPolicy::new("bookinfo", "reviews", "reviews.bookinfo.svc.cluster.local")
            .with_subsets(["v1", "v2"]);
        assert!(check(&reviews(&["v1", "v2"]), &[dr], &[]).is_empty());
    }

    #[test]
    fn subset_missing() {
        let dr = RoutingPolicy::new("bookinfo", "reviews", "reviews").with_subsets(["v1"]);
        let checks = check(&reviews(&["v1", "v3"]), &[dr], &[]);
        assert_eq!(
            checks,
            vec![Check {
                code: SUBSET_NOT_FOUND,
                severity: Severity::Error,
                path: "spec/http[0]/route[1]/destination".to_string(),
            }]
        );
    }

    #[test]
    fn subset_declared_by_exported_policy() {
        let dr = RoutingPolicy::new("bookinfo2", "reviews", "reviews.bookinfo").with_subsets(["v1"]);
        assert!(check(&reviews(&["v1"]), &[], &[dr]).is_empty());
    }

    #[test]
    fn subset_declared_by_invisible_policy() {
        let dr = RoutingPolicy::new("bookinfo2", "reviews", "reviews.bookinfo")
            .with_subsets(["v1"])
            .with_export_to(["."]);
        assert_eq!(check(&reviews(&["v1"]), &[], &[dr]).len(), 1);
    }

    #[test]
    fn subset_declared_for_other_host() {
        let dr = RoutingPolicy::new("bookinfo", "ratings", "ratings").with_subsets(["v1"]);
        assert_eq!(check(&reviews(&["v1"]), &[dr], &[]).len(), 1);
    }

    #[test]
    fn wildcard_policy_declares_subset() {
        let dr = RoutingPolicy::new("bookinfo", "all", "*.bookinfo.svc.cluster.local")
            .with_subsets(["v1"]);
        assert!(check(&reviews(&["v1"]), &[dr], &[]).is_empty());
    }

    #[test]
    fn destinations_without_subset() {
        let vs = RoutingSpec::new("bookinfo", "reviews", ["reviews"]).with_route(
            Route::new(RouteProtocol::Tcp, 0).with_destination(RouteDestination::new("reviews")),
        );
        assert!(check(&vs, &[], &[]).is_empty());
    }
}
