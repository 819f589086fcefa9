use crate::Checker;
use mesh_validator_core::{Check, RoutingSpec};

const WEIGHT_RANGE: &str = "virtualservices.route.weightrange";
const ALL_WEIGHTS_PRESENT: &str = "virtualservices.route.allweightspresent";
const REPEATED_SUBSET: &str = "virtualservices.route.repeatedsubset";

/// Validates the weights and destinations of each route.
pub(super) struct RouteChecker<'a> {
    pub routing_spec: &'a RoutingSpec,
}

impl Checker for RouteChecker<'_> {
    fn check(&self) -> Vec<Check> {
        let mut checks = vec![];
        for route in &self.routing_spec.routes {
            for (idx, dst) in route.destinations.iter().enumerate() {
                if let Some(weight) = dst.weight {
                    if !(0..=100).contains(&weight) {
                        checks.push(Check::error(
                            WEIGHT_RANGE,
                            format!("{}/route[{idx}]/weight", route.path()),
                        ));
                    }
                }
            }

            // Weights are either given for every destination or for none.
            if route.destinations.len() > 1 {
                let weighted = route
                    .destinations
                    .iter()
                    .filter(|d| d.weight.is_some())
                    .count();
                if weighted > 0 && weighted < route.destinations.len() {
                    checks.push(Check::warning(ALL_WEIGHTS_PRESENT, route.path()));
                }
            }

            for (idx, dst) in route.destinations.iter().enumerate() {
                let repeated = route.destinations[..idx]
                    .iter()
                    .any(|prior| prior.host == dst.host && prior.subset == dst.subset);
                if repeated {
                    checks.push(Check::warning(REPEATED_SUBSET, route.destination_path(idx)));
                }
            }
        }
        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_validator_core::{Route, RouteDestination, RouteProtocol};
    use pretty_assertions::assert_eq;

    fn check(route: Route) -> Vec<(&'static str, String)> {
        let vs = RoutingSpec::new("bookinfo", "reviews", ["reviews"]).with_route(route);
        RouteChecker { routing_spec: &vs }
            .check()
            .into_iter()
            .map(|c| (c.code, c.path))
            .collect()
    }

    #[test]
    fn balanced_weights() {
        let route = Route::new(RouteProtocol::Http, 0)
            .with_destination(RouteDestination::new("reviews").with_subset("v1").with_weight(80))
            .with_destination(RouteDestination::new("reviews").with_subset("v2").with_weight(20));
        assert!(check(route).is_empty());
    }

    #[test]
    fn weight_out_of_range() {
        let route = Route::new(RouteProtocol::Http, 1)
            .with_destination(RouteDestination::new("reviews").with_subset("v1").with_weight(120))
            .with_destination(RouteDestination::new("reviews").with_subset("v2").with_weight(-20));
        assert_eq!(
            check(route),
            vec![
                (WEIGHT_RANGE, "spec/http[1]/route[0]/weight".to_string()),
                (WEIGHT_RANGE, "spec/http[1]/route[1]/weight".to_string()),
            ]
        );
    }

    #[test]
    fn partial_weights() {
        let route = Route::new(RouteProtocol::Tcp, 0)
            .with_destination(RouteDestination::new("reviews").with_subset("v1").with_weight(100))
            .with_destination(RouteDestination::new("reviews").with_subset("v2"));
        assert_eq!(
            check(route),
            vec![(ALL_WEIGHTS_PRESENT, "spec/tcp[0]".to_string())]
        );
    }

    #[test]
    fn single_destination_without_weight() {
        let route = Route::new(RouteProtocol::Tls, 0)
            .with_destination(RouteDestination::new("reviews").with_subset("v1"));
        assert!(check(route).is_empty());
    }

    #[test]
    fn repeated_subset() {
        let route = Route::new(RouteProtocol::Http, 0)
            .with_destination(RouteDestination::new("reviews").with_subset("v1").with_weight(50))
            .with_destination(RouteDestination::new("reviews").with_subset("v1").with_weight(50));
        assert_eq!(
            check(route),
            vec![(REPEATED_SUBSET, "spec/http[0]/route[1]/destination".to_string())]
        );
    }
}
