use crate::object::{ExternalServiceRegistration, HasHost};
use ahash::AHashSet as HashSet;

/// The set of namespaces known to exist in the cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespaces(HashSet<String>);

/// Literal hostnames registered by external service registrations.
///
/// External hosts are namespace-independent: they are compared verbatim and never qualified
/// with a namespace or the cluster domain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExternalHosts(HashSet<String>);

// === impl Namespaces ===

impl Namespaces {
    pub fn contains(&self, ns: &str) -> bool {
        self.0.contains(ns)
    }

    pub fn insert(&mut self, ns: impl Into<String>) -> bool {
        self.0.insert(ns.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Namespaces {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for Namespaces {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(Into::into))
    }
}

// === impl ExternalHosts ===

impl ExternalHosts {
    /// Flattens the hosts of every registration into a single set.
    pub fn from_registrations<'r>(
        registrations: impl IntoIterator<Item = &'r ExternalServiceRegistration>,
    ) -> Self {
        registrations
            .into_iter()
            .flat_map(|se| se.hosts().iter().cloned())
            .collect()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.0.contains(host)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExternalHosts {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
