use crate::{DestinationRule, Error, Namespace, PeerAuthentication, ServiceEntry, VirtualService};
use kube::Resource;
use serde::Deserialize;
use serde_yaml::Value;

/// Resources read from manifest documents.
///
/// Input may hold any number of YAML documents (JSON is accepted as well), including `List`
/// documents as produced by `kubectl get -o yaml`. Documents of kinds that don't take part in
/// validation are skipped.
#[derive(Clone, Debug, Default)]
pub struct Manifests {
    pub namespaces: Vec<Namespace>,
    pub destination_rules: Vec<DestinationRule>,
    pub virtual_services: Vec<VirtualService>,
    pub service_entries: Vec<ServiceEntry>,
    pub peer_authentications: Vec<PeerAuthentication>,
}

// === impl Manifests ===

impl Manifests {
    /// Reads every document in `input`.
    pub fn read_str(&mut self, input: &str) -> Result<(), Error> {
        for document in serde_yaml::Deserializer::from_str(input) {
            let value = Value::deserialize(document)?;
            self.push(value)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
            + self.destination_rules.len()
            + self.virtual_services.len()
            + self.service_entries.len()
            + self.peer_authentications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, value: Value) -> Result<(), Error> {
        // Empty documents, e.g. a trailing `---`.
        if value.is_null() {
            return Ok(());
        }

        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(Error::MissingKind)?
            .to_string();
        let api_version = value
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let group = api_version
            .rsplit_once('/')
            .map(|(group, _)| group)
            .unwrap_or_default();

        if group.is_empty() && kind == "List" {
            if let Some(Value::Sequence(items)) = value.get("items") {
                for item in items.clone() {
                    self.push(item)?;
                }
            }
            return Ok(());
        }

        if is::<Namespace>(group, &kind) {
            self.namespaces.push(serde_yaml::from_value(value)?);
        } else if is::<DestinationRule>(group, &kind) {
            self.destination_rules.push(serde_yaml::from_value(value)?);
        } else if is::<VirtualService>(group, &kind) {
            self.virtual_services.push(serde_yaml::from_value(value)?);
        } else if is::<ServiceEntry>(group, &kind) {
            self.service_entries.push(serde_yaml::from_value(value)?);
        } else if is::<PeerAuthentication>(group, &kind) {
            self.peer_authentications.push(serde_yaml::from_value(value)?);
        } else {
            tracing::debug!(%api_version, %kind, "Skipping unsupported resource");
        }
        Ok(())
    }
}

impl std::str::FromStr for Manifests {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Error> {
        let mut manifests = Self::default();
        manifests.read_str(input)?;
        Ok(manifests)
    }
}

/// Whether a document's API group and kind identify resource type `K`. Any version is accepted.
fn is<K>(group: &str, kind: &str) -> bool
where
    K: Resource<DynamicType = ()>,
{
    K::group(&()) == group && K::kind(&()) == kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_multiple_documents() {
        let manifests = r#"
apiVersion: v1
kind: Namespace
metadata:
  name: bookinfo
---
apiVersion: networking.istio.io/v1alpha3
kind: DestinationRule
metadata:
  name: reviews
  namespace: bookinfo
spec:
  host: reviews
---
apiVersion: networking.istio.io/v1beta1
kind: VirtualService
metadata:
  name: reviews
  namespace: bookinfo
spec:
  hosts: [reviews]
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: reviews-v1
  namespace: bookinfo
---
apiVersion: networking.istio.io/v1
kind: ServiceEntry
metadata:
  name: wikipedia
  namespace: bookinfo
spec:
  hosts: ["*.wikipedia.org"]
---
apiVersion: security.istio.io/v1beta1
kind: PeerAuthentication
metadata:
  name: default
  namespace: istio-system
spec:
  mtls:
    mode: STRICT
---
"#
        .parse::<Manifests>()
        .expect("manifests must parse");

        assert_eq!(manifests.len(), 5);
        assert_eq!(manifests.namespaces[0].name_any(), "bookinfo");
        assert_eq!(manifests.destination_rules[0].spec.host, "reviews");
        assert_eq!(manifests.virtual_services[0].spec.hosts, vec!["reviews"]);
        assert_eq!(
            manifests.service_entries[0].spec.hosts,
            vec!["*.wikipedia.org"]
        );
        assert_eq!(
            manifests.peer_authentications[0].namespace().as_deref(),
            Some("istio-system")
        );
    }

    #[test]
    fn reads_lists() {
        let manifests = r#"
{
  "apiVersion": "v1",
  "kind": "List",
  "items": [
    {
      "apiVersion": "networking.istio.io/v1beta1",
      "kind": "DestinationRule",
      "metadata": {"name": "reviews", "namespace": "bookinfo"},
      "spec": {"host": "reviews", "subsets": [{"name": "v1"}]}
    },
    {
      "apiVersion": "networking.istio.io/v1beta1",
      "kind": "DestinationRule",
      "metadata": {"name": "ratings", "namespace": "bookinfo"},
      "spec": {"host": "ratings"}
    }
  ]
}
"#
        .parse::<Manifests>()
        .expect("manifests must parse");

        assert_eq!(manifests.destination_rules.len(), 2);
        assert_eq!(manifests.destination_rules[0].spec.subsets[0].name, "v1");
    }

    #[test]
    fn same_kind_in_other_group_is_skipped() {
        let manifests = r#"
apiVersion: example.com/v1
kind: VirtualService
metadata:
  name: reviews
  namespace: bookinfo
"#
        .parse::<Manifests>()
        .expect("manifests must parse");
        assert!(manifests.is_empty());
    }

    #[test]
    fn document_without_kind() {
        let err = "metadata:\n  name: reviews\n"
            .parse::<Manifests>()
            .expect_err("document must be rejected");
        assert!(matches!(err, Error::MissingKind));
    }

    #[test]
    fn malformed_resource() {
        let err = r#"
apiVersion: networking.istio.io/v1beta1
kind: DestinationRule
metadata:
  name: reviews
  namespace: bookinfo
spec:
  subsets: v1
"#
        .parse::<Manifests>()
        .expect_err("document must be rejected");
        assert!(matches!(err, Error::Parse(_)));
    }
}
