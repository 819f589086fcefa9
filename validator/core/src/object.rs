use crate::validation::ValidationKey;
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// A subset name that matches every subset of a host.
pub const ALL_SUBSETS: &str = "~";

/// The kinds of configuration resources that take part in validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Kind {
    /// Declares traffic policy and named subsets for a host (DestinationRule-like).
    #[serde(rename = "destinationrule")]
    RoutingPolicy,

    /// Declares route destinations for incoming traffic (VirtualService-like).
    #[serde(rename = "virtualservice")]
    RoutingSpec,

    /// Registers an externally reachable hostname (ServiceEntry-like).
    #[serde(rename = "serviceentry")]
    ExternalServiceRegistration,

    /// Declares the required mutual TLS mode at mesh or namespace scope (PeerAuthentication-like).
    #[serde(rename = "peerauthentication")]
    AuthPolicy,
}

/// Client-side TLS mode declared by a routing policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TlsMode {
    #[default]
    Unset,
    Disable,
    Simple,
    Mutual,
    /// Mutual TLS using mesh-issued certificates.
    MeshMutual,
}

/// Server-side mutual TLS mode required by an authentication policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MtlsMode {
    #[default]
    Unset,
    Disable,
    Permissive,
    Strict,
}

/// Identity shared by every resource kind.
pub trait Object {
    const KIND: Kind;

    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    fn key(&self) -> ValidationKey {
        ValidationKey::new(Self::KIND, self.namespace(), self.name())
    }
}

/// Resources that declare one or more destination hosts.
pub trait HasHost: Object {
    fn hosts(&self) -> &[String];
}

/// Resources that declare named subsets of their host.
pub trait HasSubsets: Object {
    fn subsets(&self) -> &[String];
}

/// Resources that carry a client traffic policy.
pub trait HasTrafficPolicy: Object {
    fn traffic_policy(&self) -> Option<&TrafficPolicy>;

    /// The top-level TLS mode, `Unset` when no traffic policy is declared.
    fn tls_mode(&self) -> TlsMode {
        self.traffic_policy()
            .map(|tp| tp.tls_mode)
            .unwrap_or_default()
    }
}

/// Resources that restrict the namespaces they are visible in.
pub trait HasExportTo: Object {
    fn export_to(&self) -> &[String];
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrafficPolicy {
    pub tls_mode: TlsMode,
    pub port_level: Vec<PortTrafficPolicy>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortTrafficPolicy {
    pub port: u32,
    pub tls_mode: TlsMode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub name: String,
    pub namespace: String,
    pub host: String,
    pub subsets: Vec<String>,
    pub export_to: Vec<String>,
    pub traffic_policy: Option<TrafficPolicy>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteProtocol {
    Http,
    Tcp,
    Tls,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteDestination {
    pub host: String,
    pub subset: Option<String>,
    pub weight: Option<i64>,
}

/// A single route rule: a position within the resource's routes of one protocol, and the
/// destinations it splits traffic across.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub protocol: RouteProtocol,
    pub index: usize,
    pub destinations: Vec<RouteDestination>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingSpec {
    pub name: String,
    pub namespace: String,
    pub hosts: Vec<String>,
    pub gateways: Vec<String>,
    pub export_to: Vec<String>,
    pub routes: Vec<Route>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalServiceRegistration {
    pub name: String,
    pub namespace: String,
    pub hosts: Vec<String>,
    pub export_to: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthPolicy {
    pub name: String,
    pub namespace: String,

    /// Workload labels the policy applies to. Empty applies to the whole namespace.
    pub selector: BTreeMap<String, String>,
    pub mode: MtlsMode,
}

// === impl Kind ===

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoutingPolicy => "destinationrule",
            Self::RoutingSpec => "virtualservice",
            Self::ExternalServiceRegistration => "serviceentry",
            Self::AuthPolicy => "peerauthentication",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl MtlsMode ===

impl MtlsMode {
    /// Whether servers accept mutual TLS under this mode.
    pub fn accepts_mtls(&self) -> bool {
        matches!(self, Self::Permissive | Self::Strict)
    }
}

// === impl RoutingPolicy ===

impl RoutingPolicy {
    pub fn new(namespace: impl ToString, name: impl ToString, host: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            host: host.to_string(),
            subsets: vec![],
            export_to: vec![],
            traffic_policy: None,
        }
    }

    pub fn with_subsets<S: ToString>(mut self, subsets: impl IntoIterator<Item = S>) -> Self {
        self.subsets = subsets.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_export_to<S: ToString>(mut self, export_to: impl IntoIterator<Item = S>) -> Self {
        self.export_to = export_to.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tls_mode(mut self, tls_mode: TlsMode) -> Self {
        self.traffic_policy
            .get_or_insert_with(TrafficPolicy::default)
            .tls_mode = tls_mode;
        self
    }

    pub fn with_traffic_policy(mut self, traffic_policy: TrafficPolicy) -> Self {
        self.traffic_policy = Some(traffic_policy);
        self
    }
}

impl Object for RoutingPolicy {
    const KIND: Kind = Kind::RoutingPolicy;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl HasHost for RoutingPolicy {
    fn hosts(&self) -> &[String] {
        std::slice::from_ref(&self.host)
    }
}

impl HasSubsets for RoutingPolicy {
    fn subsets(&self) -> &[String] {
        &self.subsets
    }
}

impl HasTrafficPolicy for RoutingPolicy {
    fn traffic_policy(&self) -> Option<&TrafficPolicy> {
        self.traffic_policy.as_ref()
    }
}

impl HasExportTo for RoutingPolicy {
    fn export_to(&self) -> &[String] {
        &self.export_to
    }
}

// === impl RouteProtocol ===

impl RouteProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tcp => "tcp",
            Self::Tls => "tls",
        }
    }
}

// === impl Route ===

impl Route {
    pub fn new(protocol: RouteProtocol, index: usize) -> Self {
        Self {
            protocol,
            index,
            destinations: vec![],
        }
    }

    pub fn with_destination(mut self, destination: RouteDestination) -> Self {
        self.destinations.push(destination);
        self
    }

    /// E.g. `spec/http[0]`
    pub fn path(&self) -> String {
        format!("spec/{}[{}]", self.protocol.as_str(), self.index)
    }

    /// E.g. `spec/http[0]/route[1]/destination`
    pub fn destination_path(&self, idx: usize) -> String {
        format!("{}/route[{}]/destination", self.path(), idx)
    }
}

// === impl RouteDestination ===

impl RouteDestination {
    pub fn new(host: impl ToString) -> Self {
        Self {
            host: host.to_string(),
            subset: None,
            weight: None,
        }
    }

    pub fn with_subset(mut self, subset: impl ToString) -> Self {
        self.subset = Some(subset.to_string());
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = Some(weight);
        self
    }
}

// === impl RoutingSpec ===

impl RoutingSpec {
    pub fn new<S: ToString>(
        namespace: impl ToString,
        name: impl ToString,
        hosts: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            hosts: hosts.into_iter().map(|h| h.to_string()).collect(),
            gateways: vec![],
            export_to: vec![],
            routes: vec![],
        }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_gateways<S: ToString>(mut self, gateways: impl IntoIterator<Item = S>) -> Self {
        self.gateways = gateways.into_iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_export_to<S: ToString>(mut self, export_to: impl IntoIterator<Item = S>) -> Self {
        self.export_to = export_to.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// Iterates over every route destination along with the path that locates it.
    pub fn route_destinations(&self) -> impl Iterator<Item = (String, &RouteDestination)> + '_ {
        self.routes.iter().flat_map(|route| {
            route
                .destinations
                .iter()
                .enumerate()
                .map(move |(idx, dst)| (route.destination_path(idx), dst))
        })
    }
}

impl Object for RoutingSpec {
    const KIND: Kind = Kind::RoutingSpec;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl HasHost for RoutingSpec {
    fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

impl HasExportTo for RoutingSpec {
    fn export_to(&self) -> &[String] {
        &self.export_to
    }
}

// === impl ExternalServiceRegistration ===

impl ExternalServiceRegistration {
    pub fn new(namespace: impl ToString, name: impl ToString, hosts: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            hosts,
            export_to: vec![],
        }
    }
}

impl Object for ExternalServiceRegistration {
    const KIND: Kind = Kind::ExternalServiceRegistration;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl HasHost for ExternalServiceRegistration {
    fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

impl HasExportTo for ExternalServiceRegistration {
    fn export_to(&self) -> &[String] {
        &self.export_to
    }
}

// === impl AuthPolicy ===

impl AuthPolicy {
    pub fn new(namespace: impl ToString, name: impl ToString, mode: MtlsMode) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            selector: BTreeMap::new(),
            mode,
        }
    }

    /// Whether the policy applies to every workload in its namespace.
    pub fn is_namespace_wide(&self) -> bool {
        self.selector.is_empty()
    }
}

impl Object for AuthPolicy {
    const KIND: Kind = Kind::AuthPolicy;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
