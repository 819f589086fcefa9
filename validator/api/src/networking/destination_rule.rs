use crate::{identity, Error};
use mesh_validator_core::{self as model, Kind};
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Declares the policies that apply to traffic for a host after routing has occurred.
#[derive(Clone, Debug, Default, PartialEq, kube::CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.istio.io",
    version = "v1beta1",
    kind = "DestinationRule",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRuleSpec {
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,

    /// A null or `~` value selects every subset of the host, and is read as a single subset
    /// named `~`.
    #[serde(
        default,
        deserialize_with = "deserialize_subsets",
        skip_serializing_if = "Vec::is_empty"
    )]
    #[schemars(with = "Vec<Subset>")]
    pub subsets: Vec<Subset>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTlsSettings>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_level_settings: Vec<PortTrafficPolicy>,

    // Settings that don't take part in validation are kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier_detection: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortTrafficPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTlsSettings>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct PortSelector {
    pub number: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientTlsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ClientTlsMode>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientTlsMode {
    Disable,
    Simple,
    Mutual,
    IstioMutual,
}

/// A named set of endpoints of the host, selected by labels.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subset {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,
}

fn deserialize_subsets<'de, D>(deserializer: D) -> Result<Vec<Subset>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Subsets {
        Named(Vec<Subset>),
        All(Option<String>),
    }

    match Subsets::deserialize(deserializer)? {
        Subsets::Named(subsets) => Ok(subsets),
        Subsets::All(None) => Ok(vec![Subset::all()]),
        Subsets::All(Some(s)) if s == model::ALL_SUBSETS => Ok(vec![Subset::all()]),
        Subsets::All(Some(s)) => Err(de::Error::invalid_value(
            de::Unexpected::Str(&s),
            &"a list of subsets or `~`",
        )),
    }
}

// === impl Subset ===

impl Subset {
    fn all() -> Self {
        Self {
            name: model::ALL_SUBSETS.to_string(),
            ..Default::default()
        }
    }
}

// === impl ClientTlsMode ===

impl From<ClientTlsMode> for model::TlsMode {
    fn from(mode: ClientTlsMode) -> Self {
        match mode {
            ClientTlsMode::Disable => Self::Disable,
            ClientTlsMode::Simple => Self::Simple,
            ClientTlsMode::Mutual => Self::Mutual,
            ClientTlsMode::IstioMutual => Self::MeshMutual,
        }
    }
}

fn tls_mode(tls: Option<&ClientTlsSettings>) -> model::TlsMode {
    tls.and_then(|tls| tls.mode)
        .map(Into::into)
        .unwrap_or_default()
}

// === impl TrafficPolicy ===

impl From<TrafficPolicy> for model::TrafficPolicy {
    fn from(tp: TrafficPolicy) -> Self {
        Self {
            tls_mode: tls_mode(tp.tls.as_ref()),
            port_level: tp
                .port_level_settings
                .iter()
                .map(|pl| model::PortTrafficPolicy {
                    port: pl.port.as_ref().map(|p| p.number).unwrap_or_default(),
                    tls_mode: tls_mode(pl.tls.as_ref()),
                })
                .collect(),
        }
    }
}

// === impl DestinationRule ===

impl TryFrom<DestinationRule> for model::RoutingPolicy {
    type Error = Error;

    fn try_from(dr: DestinationRule) -> Result<Self, Error> {
        let (namespace, name) = identity(Kind::RoutingPolicy, &dr.metadata)?;
        let DestinationRuleSpec {
            host,
            traffic_policy,
            subsets,
            export_to,
        } = dr.spec;

        Ok(model::RoutingPolicy {
            name,
            namespace,
            host,
            subsets: subsets.into_iter().map(|s| s.name).collect(),
            export_to,
            traffic_policy: traffic_policy.map(Into::into),
        })
    }
}
