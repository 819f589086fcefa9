use crate::{identity, Error};
use mesh_validator_core::{self as model, Kind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declares the mutual TLS mode that workloads accept.
///
/// A policy in the mesh's root namespace without a selector applies to the whole mesh; a policy
/// without a selector elsewhere applies to its namespace.
#[derive(Clone, Debug, Default, PartialEq, kube::CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "security.istio.io",
    version = "v1beta1",
    kind = "PeerAuthentication",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PeerAuthenticationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<WorkloadSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtls: Option<PeerAuthenticationMtls>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct PeerAuthenticationMtls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<MtlsMode>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MtlsMode {
    Unset,
    Disable,
    Permissive,
    Strict,
}

// === impl MtlsMode ===

impl From<MtlsMode> for model::MtlsMode {
    fn from(mode: MtlsMode) -> Self {
        match mode {
            MtlsMode::Unset => Self::Unset,
            MtlsMode::Disable => Self::Disable,
            MtlsMode::Permissive => Self::Permissive,
            MtlsMode::Strict => Self::Strict,
        }
    }
}

// === impl PeerAuthentication ===

impl TryFrom<PeerAuthentication> for model::AuthPolicy {
    type Error = Error;

    fn try_from(pa: PeerAuthentication) -> Result<Self, Error> {
        let (namespace, name) = identity(Kind::AuthPolicy, &pa.metadata)?;
        let PeerAuthenticationSpec { selector, mtls } = pa.spec;
        Ok(model::AuthPolicy {
            name,
            namespace,
            selector: selector.map(|s| s.match_labels).unwrap_or_default(),
            mode: mtls
                .and_then(|m| m.mode)
                .map(Into::into)
                .unwrap_or_default(),
        })
    }
}
