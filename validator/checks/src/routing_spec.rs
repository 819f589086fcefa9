mod route;
mod single_host;
mod subset_presence;

use self::{route::RouteChecker, single_host::SingleHostChecker, subset_presence::SubsetPresenceChecker};
use crate::{export_to::ExportToNamespaceChecker, Checker, Context, GroupChecker, ObjectChecker};
use mesh_validator_core::{Object, RoutingPolicy, RoutingSpec, Validation, Validations};

/// Validates routing specs declared in, or exported into, a namespace.
pub struct RoutingSpecChecker<'a> {
    pub ctx: Context<'a>,
    pub routing_specs: &'a [RoutingSpec],
    pub exported_routing_specs: &'a [RoutingSpec],
    pub routing_policies: &'a [RoutingPolicy],
    pub exported_routing_policies: &'a [RoutingPolicy],
}

impl ObjectChecker for RoutingSpecChecker<'_> {
    fn check(&self) -> Validations {
        let _span = tracing::debug_span!(
            "routing_specs",
            local = self.routing_specs.len(),
            exported = self.exported_routing_specs.len(),
        )
        .entered();

        let mut validations = self.run_individual_checks();
        validations.merge(self.run_group_checks());
        validations
    }
}

impl RoutingSpecChecker<'_> {
    fn run_individual_checks(&self) -> Validations {
        self.routing_specs
            .iter()
            .map(|vs| self.run_checks(vs))
            .collect()
    }

    fn run_checks(&self, vs: &RoutingSpec) -> Validation {
        let mut validation = Validation::new(&vs.key());

        let checkers: Vec<Box<dyn Checker + '_>> = vec![
            Box::new(RouteChecker { routing_spec: vs }),
            Box::new(SubsetPresenceChecker {
                ctx: self.ctx,
                routing_spec: vs,
                routing_policies: self.routing_policies,
                exported_routing_policies: self.exported_routing_policies,
            }),
            Box::new(ExportToNamespaceChecker {
                object: vs,
                namespaces: self.ctx.namespaces,
            }),
        ];

        for checker in checkers {
            validation.add_checks(checker.check());
        }
        validation
    }

    fn run_group_checks(&self) -> Validations {
        let checkers: Vec<Box<dyn GroupChecker + '_>> = vec![Box::new(SingleHostChecker {
            ctx: self.ctx,
            routing_specs: self.routing_specs,
            exported_routing_specs: self.exported_routing_specs,
        })];

        let mut validations = Validations::default();
        for checker in checkers {
            validations.merge(checker.check());
        }
        validations
    }
}
