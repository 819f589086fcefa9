//! Mesh configuration resources as they appear in manifests
//!
//! The resource types mirror the networking and security APIs closely enough to deserialize
//! manifests exported from a cluster. Only the fields that take part in validation are modeled;
//! everything else is ignored when deserializing.
//!
//! Each resource converts fallibly into its validation model counterpart. Conversion is where
//! objects without an identity are rejected, so nothing downstream has to handle them.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod manifest;
pub mod networking;
pub mod security;

pub use self::{
    manifest::Manifests,
    networking::{DestinationRule, ServiceEntry, VirtualService},
    security::PeerAuthentication,
};
pub use k8s_openapi::api::core::v1::Namespace;
pub use kube::{core::ObjectMeta, ResourceExt};
use mesh_validator_core::Kind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} must have a name")]
    MissingName(Kind),

    #[error("{kind} {name} must have a namespace")]
    MissingNamespace { kind: Kind, name: String },

    #[error("manifest document has no kind")]
    MissingKind,

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Returns the namespace and name of an object, failing if either is missing or empty.
pub(crate) fn identity(kind: Kind, meta: &ObjectMeta) -> Result<(String, String), Error> {
    let name = match meta.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::MissingName(kind)),
    };
    match meta.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => Ok((ns.to_string(), name)),
        _ => Err(Error::MissingNamespace { kind, name }),
    }
}
