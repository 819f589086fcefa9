use crate::{
    api,
    checks::{self, export::Visibility, Snapshot},
    core::{
        AuthPolicy, ExternalServiceRegistration, HasExportTo, MeshConfig, Namespaces,
        RoutingPolicy, RoutingSpec, Validations,
    },
};
use std::collections::BTreeSet;

/// Every resource read from manifests, converted to the validation model.
#[derive(Clone, Debug, Default)]
pub struct Resources {
    /// Namespaces known to exist: declared namespaces plus every namespace that holds a
    /// resource.
    pub namespaces: Namespaces,
    pub routing_policies: Vec<RoutingPolicy>,
    pub routing_specs: Vec<RoutingSpec>,
    pub registrations: Vec<ExternalServiceRegistration>,
    pub auth_policies: Vec<AuthPolicy>,
}

// === impl Resources ===

impl TryFrom<api::Manifests> for Resources {
    type Error = api::Error;

    fn try_from(manifests: api::Manifests) -> Result<Self, api::Error> {
        let api::Manifests {
            namespaces,
            destination_rules,
            virtual_services,
            service_entries,
            peer_authentications,
        } = manifests;

        let routing_policies = destination_rules
            .into_iter()
            .map(RoutingPolicy::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let routing_specs = virtual_services
            .into_iter()
            .map(RoutingSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let registrations = service_entries
            .into_iter()
            .map(ExternalServiceRegistration::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let auth_policies = peer_authentications
            .into_iter()
            .map(AuthPolicy::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut known = namespaces
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect::<Namespaces>();
        known.extend(routing_policies.iter().map(|dr| dr.namespace.clone()));
        known.extend(routing_specs.iter().map(|vs| vs.namespace.clone()));
        known.extend(registrations.iter().map(|se| se.namespace.clone()));
        known.extend(auth_policies.iter().map(|pa| pa.namespace.clone()));

        Ok(Self {
            namespaces: known,
            routing_policies,
            routing_specs,
            registrations,
            auth_policies,
        })
    }
}

impl Resources {
    /// Namespaces that declare routing resources.
    pub fn home_namespaces(&self) -> BTreeSet<&str> {
        self.routing_policies
            .iter()
            .map(|dr| dr.namespace.as_str())
            .chain(self.routing_specs.iter().map(|vs| vs.namespace.as_str()))
            .collect()
    }

    /// The resources visible from `ns`: those declared in it, and those exported into it from
    /// other namespaces.
    pub fn snapshot(&self, ns: &str) -> Snapshot {
        let (routing_policies, exported_routing_policies) = self.split(&self.routing_policies, ns);
        let (routing_specs, exported_routing_specs) = self.split(&self.routing_specs, ns);
        let registrations = self
            .registrations
            .iter()
            .filter(|se| self.visible_in(*se, ns))
            .cloned()
            .collect();

        Snapshot {
            namespace: ns.to_string(),
            namespaces: self.namespaces.clone(),
            routing_policies,
            exported_routing_policies,
            routing_specs,
            exported_routing_specs,
            registrations,
            auth_policies: self.auth_policies.clone(),
        }
    }

    /// Validates the resources visible from `namespace`, or from every home namespace when none
    /// is given, merging the results.
    pub fn validate(&self, namespace: Option<&str>, config: &MeshConfig) -> Validations {
        let namespaces = match namespace {
            Some(ns) => vec![ns],
            None => self.home_namespaces().into_iter().collect(),
        };

        let mut validations = Validations::default();
        for ns in namespaces {
            let snapshot = self.snapshot(ns);
            tracing::debug!(
                namespace = %ns,
                routing_policies = snapshot.routing_policies.len(),
                exported_routing_policies = snapshot.exported_routing_policies.len(),
                routing_specs = snapshot.routing_specs.len(),
                exported_routing_specs = snapshot.exported_routing_specs.len(),
                "Validating namespace",
            );
            validations.merge(checks::validate(&snapshot, config));
        }
        validations
    }

    fn split<T: HasExportTo + Clone>(&self, objects: &[T], ns: &str) -> (Vec<T>, Vec<T>) {
        let mut local = vec![];
        let mut exported = vec![];
        for obj in objects {
            if obj.namespace() == ns {
                local.push(obj.clone());
            } else if self.visible_in(obj, ns) {
                exported.push(obj.clone());
            }
        }
        (local, exported)
    }

    fn visible_in<T: HasExportTo>(&self, obj: &T, ns: &str) -> bool {
        Visibility::of(obj, &self.namespaces).contains(ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Kind, Severity, ValidationKey};
    use pretty_assertions::assert_eq;

    fn resources() -> Resources {
        let manifests = r#"
apiVersion: v1
kind: Namespace
metadata:
  name: empty
---
apiVersion: networking.istio.io/v1beta1
kind: DestinationRule
metadata:
  name: reviews
  namespace: bookinfo
spec:
  host: reviews
---
apiVersion: networking.istio.io/v1beta1
kind: DestinationRule
metadata:
  name: reviews-private
  namespace: bookinfo
spec:
  host: reviews
  exportTo: ["."]
---
apiVersion: networking.istio.io/v1beta1
kind: DestinationRule
metadata:
  name: reviews
  namespace: bookinfo2
spec:
  host: reviews.bookinfo.svc.cluster.local
  exportTo: ["bookinfo"]
---
apiVersion: networking.istio.io/v1beta1
kind: DestinationRule
metadata:
  name: ratings
  namespace: bookinfo3
spec:
  host: ratings.bookinfo3.svc.cluster.local
  exportTo: ["."]
"#
        .parse::<api::Manifests>()
        .expect("manifests must parse");
        Resources::try_from(manifests).expect("resources must convert")
    }

    fn key(ns: &str, name: &str) -> ValidationKey {
        ValidationKey::new(Kind::RoutingPolicy, ns, name)
    }

    #[test]
    fn known_namespaces() {
        let resources = resources();
        for ns in ["empty", "bookinfo", "bookinfo2", "bookinfo3"] {
            assert!(resources.namespaces.contains(ns), "{ns} must be known");
        }
        assert_eq!(
            resources.home_namespaces().into_iter().collect::<Vec<_>>(),
            vec!["bookinfo", "bookinfo2", "bookinfo3"]
        );
    }

    #[test]
    fn snapshot_splits_local_and_exported() {
        let resources = resources();

        let snapshot = resources.snapshot("bookinfo");
        let names = |drs: &[RoutingPolicy]| {
            drs.iter()
                .map(|dr| format!("{}/{}", dr.namespace, dr.name))
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(&snapshot.routing_policies),
            vec!["bookinfo/reviews", "bookinfo/reviews-private"]
        );
        assert_eq!(
            names(&snapshot.exported_routing_policies),
            vec!["bookinfo2/reviews"]
        );

        let snapshot = resources.snapshot("bookinfo3");
        assert_eq!(names(&snapshot.routing_policies), vec!["bookinfo3/ratings"]);
        assert_eq!(names(&snapshot.exported_routing_policies), vec!["bookinfo/reviews"]);
    }

    #[test]
    fn validates_every_home_namespace() {
        let config = MeshConfig {
            auto_mtls: true,
            ..Default::default()
        };
        let vals = resources().validate(None, &config);

        assert_eq!(vals.len(), 4);
        for (dr, partners) in [
            (
                key("bookinfo", "reviews"),
                vec![key("bookinfo", "reviews-private"), key("bookinfo2", "reviews")],
            ),
            (
                key("bookinfo", "reviews-private"),
                vec![key("bookinfo", "reviews")],
            ),
            (key("bookinfo2", "reviews"), vec![key("bookinfo", "reviews")]),
        ] {
            let v = vals.get(&dr).expect("validation must exist");
            assert_eq!(v.checks.len(), 1, "{dr:?}");
            assert_eq!(v.checks[0].severity, Severity::Warning);
            assert_eq!(v.references, partners.into_iter().collect::<BTreeSet<_>>());
        }
        assert!(vals.get(&key("bookinfo3", "ratings")).unwrap().checks.is_empty());
    }

    #[test]
    fn validates_one_namespace() {
        let config = MeshConfig {
            auto_mtls: true,
            ..Default::default()
        };
        let vals = resources().validate(Some("bookinfo3"), &config);
        assert_eq!(
            vals.keys().cloned().collect::<Vec<_>>(),
            vec![key("bookinfo3", "ratings")]
        );
    }
}
