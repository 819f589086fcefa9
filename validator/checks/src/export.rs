use ahash::AHashSet as HashSet;
use mesh_validator_core::{HasExportTo, Namespaces};

/// Restricts an object to its own namespace.
pub const EXPORT_PRIVATE: &str = ".";

/// Exports an object to every namespace.
pub const EXPORT_ALL: &str = "*";

/// The namespaces in which an object takes part in conflict detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Visible in every namespace.
    Everywhere,

    /// Visible only in the listed namespaces.
    Namespaces(HashSet<String>),
}

// === impl Visibility ===

impl Visibility {
    /// Resolves an object's export directives.
    ///
    /// An object without directives is treated as visible everywhere, regardless of how the
    /// resource would actually propagate. Directives naming a namespace that is not known are
    /// ignored here; they are reported by the export target checker. An object whose directives
    /// all name unknown namespaces resolves to an empty set, so it is not visible even in its
    /// own namespace.
    pub fn resolve(export_to: &[String], home: &str, known: &Namespaces) -> Self {
        if export_to.is_empty() {
            return Self::Everywhere;
        }

        let mut namespaces = HashSet::new();
        for directive in export_to {
            match directive.as_str() {
                EXPORT_ALL => return Self::Everywhere,
                EXPORT_PRIVATE => {
                    namespaces.insert(home.to_string());
                }
                ns if known.contains(ns) => {
                    namespaces.insert(home.to_string());
                    namespaces.insert(ns.to_string());
                }
                ns => tracing::trace!(%home, %ns, "Ignoring export to unknown namespace"),
            }
        }
        Self::Namespaces(namespaces)
    }

    pub fn of<T: HasExportTo>(obj: &T, known: &Namespaces) -> Self {
        Self::resolve(obj.export_to(), obj.namespace(), known)
    }

    pub fn contains(&self, ns: &str) -> bool {
        match self {
            Self::Everywhere => true,
            Self::Namespaces(namespaces) => namespaces.contains(ns),
        }
    }
}

/// Two objects may only conflict when each one's namespace lies within the other's visibility.
pub fn mutually_visible<A, B>(a: &A, b: &B, known: &Namespaces) -> bool
where
    A: HasExportTo,
    B: HasExportTo,
{
    Visibility::of(a, known).contains(b.namespace())
        && Visibility::of(b, known).contains(a.namespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashset;
    use mesh_validator_core::RoutingPolicy;
    use rstest::rstest;

    fn known() -> Namespaces {
        ["bookinfo", "bookinfo2", "bookinfo3", "default"]
            .into_iter()
            .collect()
    }

    fn export_to(directives: &[&str]) -> Vec<String> {
        directives.iter().map(|d| d.to_string()).collect()
    }

    #[rstest]
    #[case::empty(&[], "default", true)]
    #[case::all(&["*"], "bookinfo3", true)]
    #[case::all_after_private(&[".", "*"], "bookinfo3", true)]
    #[case::private_home(&["."], "bookinfo", true)]
    #[case::private_other(&["."], "bookinfo2", false)]
    #[case::literal_target(&["bookinfo2"], "bookinfo2", true)]
    #[case::literal_home(&["bookinfo2"], "bookinfo", true)]
    #[case::literal_other(&["bookinfo2"], "bookinfo3", false)]
    #[case::union(&[".", "bookinfo3"], "bookinfo3", true)]
    #[case::unknown(&["missing"], "missing", false)]
    #[case::unknown_home(&["missing"], "bookinfo", false)]
    fn resolve(#[case] directives: &[&str], #[case] ns: &str, #[case] visible: bool) {
        let visibility = Visibility::resolve(&export_to(directives), "bookinfo", &known());
        assert_eq!(visibility.contains(ns), visible);
    }

    #[test]
    fn resolves_literal_set() {
        let visibility = Visibility::resolve(
            &export_to(&["bookinfo2", "bookinfo3", "missing"]),
            "bookinfo",
            &known(),
        );
        let expected: HashSet<String> = hashset! {
            "bookinfo".to_string(),
            "bookinfo2".to_string(),
            "bookinfo3".to_string(),
        }
        .into_iter()
        .collect();
        assert_eq!(visibility, Visibility::Namespaces(expected));
    }

    #[test]
    fn mutual_visibility_requires_both_sides() {
        let a = RoutingPolicy::new("bookinfo", "a", "reviews").with_export_to(["bookinfo2"]);
        let b = RoutingPolicy::new("bookinfo2", "b", "reviews").with_export_to(["."]);
        assert!(!mutually_visible(&a, &b, &known()));
        assert!(!mutually_visible(&b, &a, &known()));

        let b = b.with_export_to(["bookinfo"]);
        assert!(mutually_visible(&a, &b, &known()));
        assert!(mutually_visible(&b, &a, &known()));
    }
}
