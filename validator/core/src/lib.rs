//! Mesh configuration validation model
//!
//! Holds the types shared by every checker: the resource kinds that take part in traffic
//! management validation, the narrow capabilities each kind exposes, and the validation store
//! that checkers append their findings to.
//!
//! ```text
//! [ RoutingSpec ] -> [ RoutingPolicy ] <- [ AuthPolicy ]
//!        \                 /
//!         [ ExternalServiceRegistration ]
//! ```
//!
//! Nothing in this crate performs I/O. Snapshots are built by a caller and handed to the
//! checkers by reference; results are returned as a [`Validations`] map keyed by
//! [`ValidationKey`].

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod config;
mod namespaces;
pub mod object;
pub mod validation;

pub use self::{
    config::MeshConfig,
    namespaces::{ExternalHosts, Namespaces},
    object::{
        AuthPolicy, ExternalServiceRegistration, HasExportTo, HasHost, HasSubsets,
        HasTrafficPolicy, Kind, MtlsMode, Object, PortTrafficPolicy, Route, RouteDestination,
        RouteProtocol, RoutingPolicy, RoutingSpec, TlsMode, TrafficPolicy, ALL_SUBSETS,
    },
    validation::{Check, Checks, Severity, Validation, ValidationKey, Validations},
};
