use crate::{export::mutually_visible, Context};
use mesh_validator_core::{HasExportTo, HasHost};
use std::fmt;

/// Matches every host.
pub const ANY_HOST: &str = "*";

/// A host qualified relative to the namespace that declared it.
///
/// Short in-cluster names are expanded with the declaring namespace and the cluster domain.
/// Registered external hosts and hosts that are already qualified are kept verbatim, so they
/// compare literally no matter which namespace declared them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fqdn(String);

// === impl Fqdn ===

impl Fqdn {
    pub fn qualify(host: &str, ns: &str, ctx: &Context<'_>) -> Self {
        if host == ANY_HOST || ctx.external_hosts.contains(host) {
            return Self(host.to_string());
        }

        match host.matches('.').count() {
            // `reviews`
            0 => Self(ctx.config.service_fqdn(ns, host)),
            // `reviews.bookinfo`
            1 => Self(format!("{}.{}", host, ctx.config.service_suffix())),
            _ => Self(host.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.starts_with('*')
    }

    /// Whether `self`, as a pattern, matches `other`.
    ///
    /// A leading `*` label stands for exactly one label, so `*.ns.svc.cluster.local` matches
    /// `svc.ns.svc.cluster.local` but not `a.svc.ns.svc.cluster.local`. A bare `*` matches
    /// everything.
    pub fn matches(&self, other: &Fqdn) -> bool {
        if self.0 == ANY_HOST || self.0 == other.0 {
            return true;
        }

        let Some(suffix) = self.0.strip_prefix("*.") else {
            return false;
        };
        match other
            .0
            .strip_suffix(suffix)
            .and_then(|prefix| prefix.strip_suffix('.'))
        {
            Some(label) => !label.is_empty() && !label.contains('.'),
            None => false,
        }
    }

    /// Whether the two hosts can resolve to a common destination.
    pub fn overlaps(&self, other: &Fqdn) -> bool {
        self.matches(other) || other.matches(self)
    }
}

impl fmt::Display for Fqdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Qualifies every host declared by an object.
pub fn qualified_hosts<T: HasHost>(obj: &T, ctx: &Context<'_>) -> Vec<Fqdn> {
    obj.hosts()
        .iter()
        .map(|host| Fqdn::qualify(host, obj.namespace(), ctx))
        .collect()
}

/// Whether two distinct, mutually visible objects declare overlapping hosts.
pub fn conflicting<A, B>(a: &A, b: &B, ctx: &Context<'_>) -> bool
where
    A: HasHost + HasExportTo,
    B: HasHost + HasExportTo,
{
    if a.key() == b.key() || !mutually_visible(a, b, ctx.namespaces) {
        return false;
    }

    let a_hosts = qualified_hosts(a, ctx);
    let b_hosts = qualified_hosts(b, ctx);
    a_hosts
        .iter()
        .any(|a| b_hosts.iter().any(|b| a.overlaps(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_validator_core::{ExternalHosts, MeshConfig, Namespaces, RoutingPolicy};
    use rstest::rstest;

    fn with_ctx<T>(external: &[&str], f: impl FnOnce(&Context<'_>) -> T) -> T {
        let config = MeshConfig::default();
        let namespaces = ["test", "test2", "test3"].into_iter().collect::<Namespaces>();
        let external_hosts = external.iter().copied().collect::<ExternalHosts>();
        f(&Context {
            config: &config,
            namespaces: &namespaces,
            external_hosts: &external_hosts,
        })
    }

    #[rstest]
    #[case::short("host1", "test", "host1.test.svc.cluster.local")]
    #[case::namespaced("host1.test2", "test", "host1.test2.svc.cluster.local")]
    #[case::qualified(
        "host1.test3.svc.cluster.local",
        "test",
        "host1.test3.svc.cluster.local"
    )]
    #[case::external_name("api.example.com", "test", "api.example.com")]
    #[case::any("*", "test", "*")]
    #[case::wildcard_short("*.test2", "test", "*.test2.svc.cluster.local")]
    #[case::registered("redis", "test", "redis")]
    #[case::registered_dotted("redis.cache", "test", "redis.cache")]
    fn qualify(#[case] host: &str, #[case] ns: &str, #[case] expected: &str) {
        let fqdn = with_ctx(&["redis", "redis.cache"], |ctx| Fqdn::qualify(host, ns, ctx));
        assert_eq!(fqdn.as_str(), expected);
    }

    #[rstest]
    #[case::identical("host1.test.svc.cluster.local", "host1.test.svc.cluster.local", true)]
    #[case::wildcard("*.test.svc.cluster.local", "host1.test.svc.cluster.local", true)]
    #[case::wildcard_reversed("host1.test.svc.cluster.local", "*.test.svc.cluster.local", true)]
    #[case::wildcard_other_ns("*.test.svc.cluster.local", "host1.other.svc.cluster.local", false)]
    #[case::wildcard_one_label("*.test.svc.cluster.local", "a.host1.test.svc.cluster.local", false)]
    #[case::wildcard_pair("*.test.svc.cluster.local", "*.test.svc.cluster.local", true)]
    #[case::wildcard_pair_distinct("*.test.svc.cluster.local", "*.test2.svc.cluster.local", false)]
    #[case::any("*", "host1.other.svc.cluster.local", true)]
    #[case::any_wildcard("*", "*.test.svc.cluster.local", true)]
    #[case::external_wildcards("*.wikipedia.org", "*.wikipedia.org", true)]
    #[case::external_wildcard("*.wikipedia.org", "en.wikipedia.org", true)]
    #[case::distinct("host1.test.svc.cluster.local", "host2.test.svc.cluster.local", false)]
    #[case::suffix_only("*.test.svc.cluster.local", "xtest.svc.cluster.local", false)]
    fn overlaps(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        let a = Fqdn(a.to_string());
        let b = Fqdn(b.to_string());
        assert_eq!(a.overlaps(&b), expected);
        assert_eq!(b.overlaps(&a), expected);
    }

    #[test]
    fn never_conflicts_with_itself() {
        let dr = RoutingPolicy::new("test", "rule1", "host1");
        with_ctx(&[], |ctx| assert!(!conflicting(&dr, &dr, ctx)));
    }

    #[test]
    fn short_hosts_qualified_per_namespace() {
        let a = RoutingPolicy::new("test", "rule1", "host1");
        let b = RoutingPolicy::new("test2", "rule2", "host1");
        let c = RoutingPolicy::new("test2", "rule3", "host1.test");
        with_ctx(&[], |ctx| {
            assert!(!conflicting(&a, &b, ctx));
            assert!(conflicting(&a, &c, ctx));
        });
    }

    #[test]
    fn requires_mutual_visibility() {
        let a = RoutingPolicy::new("test", "rule1", "host1.test.svc.cluster.local")
            .with_export_to(["."]);
        let b = RoutingPolicy::new("test2", "rule2", "host1.test.svc.cluster.local");
        with_ctx(&[], |ctx| assert!(!conflicting(&a, &b, ctx)));
    }
}
