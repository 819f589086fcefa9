use crate::{identity, Error};
use mesh_validator_core::{self as model, Kind, RouteProtocol};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declares how requests for a set of hosts are routed to destinations.
#[derive(Clone, Debug, Default, PartialEq, kube::CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.istio.io",
    version = "v1beta1",
    kind = "VirtualService",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    /// Gateways and sidecars the routes apply to. When empty, the routes apply to every sidecar
    /// in the mesh.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http: Vec<RouteRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tcp: Vec<RouteRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls: Vec<RouteRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

/// A rule of any protocol. Match conditions and filters are not modeled.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct RouteRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<RouteDestination>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct RouteDestination {
    pub destination: Destination,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Destination {
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSelector>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct PortSelector {
    pub number: u32,
}

// === impl VirtualService ===

impl TryFrom<VirtualService> for model::RoutingSpec {
    type Error = Error;

    fn try_from(vs: VirtualService) -> Result<Self, Error> {
        let (namespace, name) = identity(Kind::RoutingSpec, &vs.metadata)?;
        let VirtualServiceSpec {
            hosts,
            gateways,
            http,
            tcp,
            tls,
            export_to,
        } = vs.spec;

        let routes = [
            (RouteProtocol::Http, http),
            (RouteProtocol::Tcp, tcp),
            (RouteProtocol::Tls, tls),
        ]
        .into_iter()
        .flat_map(|(protocol, rules)| {
            rules
                .into_iter()
                .enumerate()
                .map(move |(idx, rule)| model::Route {
                    protocol,
                    index: idx,
                    destinations: rule.route.into_iter().map(Into::into).collect(),
                })
        })
        .collect();

        Ok(model::RoutingSpec {
            name,
            namespace,
            hosts,
            gateways,
            export_to,
            routes,
        })
    }
}

impl From<RouteDestination> for model::RouteDestination {
    fn from(RouteDestination { destination, weight }: RouteDestination) -> Self {
        Self {
            host: destination.host,
            subset: destination.subset,
            weight,
        }
    }
}
