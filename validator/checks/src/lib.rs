//! Mesh configuration checkers
//!
//! Each resource family is validated by an object checker that runs two kinds of checkers:
//!
//! 1. Individual checkers validate a single object in isolation (plus whatever read-only context
//!    it needs) and produce a list of checks for that object.
//! 2. Group checkers validate the relationships between all objects of a family and may add
//!    findings to any object, including objects exported from other namespaces.
//!
//! Individual results are folded into the result map before any group checker runs, so every
//! local object has exactly one entry even when it has no findings.
//!
//! Visibility between objects is governed by their export directives (see [`export`]) and
//! hosts are compared after qualification relative to their declaring namespace (see [`host`]).

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod export;
mod export_to;
pub mod host;
mod routing_policy;
mod routing_spec;


pub use self::{
    routing_policy::{AuthPolicies, RoutingPolicyChecker},
    routing_spec::RoutingSpecChecker,
};
use mesh_validator_core::{
    AuthPolicy, Check, ExternalHosts, ExternalServiceRegistration, MeshConfig, Namespaces,
    RoutingPolicy, RoutingSpec, Validations,
};

/// Read-only state shared by every checker.
#[derive(Copy, Clone, Debug)]
pub struct Context<'a> {
    pub config: &'a MeshConfig,
    pub namespaces: &'a Namespaces,
    pub external_hosts: &'a ExternalHosts,
}

/// Validates a single object.
pub trait Checker {
    fn check(&self) -> Vec<Check>;
}

/// Validates relationships across a set of objects.
pub trait GroupChecker {
    fn check(&self) -> Validations;
}

/// Runs all individual and group checkers for one resource family.
pub trait ObjectChecker {
    fn check(&self) -> Validations;
}

/// The objects visible from a single home namespace.
///
/// `routing_policies` and `routing_specs` are the objects declared in the home namespace; the
/// `exported_*` lists hold objects from other namespaces that export into it.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub namespace: String,
    pub namespaces: Namespaces,
    pub routing_policies: Vec<RoutingPolicy>,
    pub exported_routing_policies: Vec<RoutingPolicy>,
    pub routing_specs: Vec<RoutingSpec>,
    pub exported_routing_specs: Vec<RoutingSpec>,
    pub registrations: Vec<ExternalServiceRegistration>,
    pub auth_policies: Vec<AuthPolicy>,
}

/// Validates every resource family in a snapshot and merges the results.
pub fn validate(snapshot: &Snapshot, config: &MeshConfig) -> Validations {
    let _span = tracing::debug_span!("validate", namespace = %snapshot.namespace).entered();

    let external_hosts = ExternalHosts::from_registrations(&snapshot.registrations);
    let ctx = Context {
        config,
        namespaces: &snapshot.namespaces,
        external_hosts: &external_hosts,
    };
    let auth_policies = AuthPolicies::new(&snapshot.auth_policies, config);

    let mut validations = RoutingPolicyChecker {
        ctx,
        auth_policies: &auth_policies,
        routing_policies: &snapshot.routing_policies,
        exported_routing_policies: &snapshot.exported_routing_policies,
    }
    .check();

    validations.merge(
        RoutingSpecChecker {
            ctx,
            routing_specs: &snapshot.routing_specs,
            exported_routing_specs: &snapshot.exported_routing_specs,
            routing_policies: &snapshot.routing_policies,
            exported_routing_policies: &snapshot.exported_routing_policies,
        }
        .check(),
    );

    tracing::debug!(objects = validations.len(), "Validated");
    validations
}
