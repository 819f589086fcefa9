use crate::{identity, Error};
use mesh_validator_core::{self as model, Kind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Adds entries to the mesh's service registry, typically for hosts outside the cluster.
#[derive(Clone, Debug, Default, PartialEq, kube::CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.istio.io",
    version = "v1beta1",
    kind = "ServiceEntry",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntrySpec {
    pub hosts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    MeshExternal,
    MeshInternal,
}

impl TryFrom<ServiceEntry> for model::ExternalServiceRegistration {
    type Error = Error;

    fn try_from(se: ServiceEntry) -> Result<Self, Error> {
        let (namespace, name) = identity(Kind::ExternalServiceRegistration, &se.metadata)?;
        Ok(model::ExternalServiceRegistration {
            name,
            namespace,
            hosts: se.spec.hosts,
            export_to: se.spec.export_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn converts_external_hosts() {
        let se = serde_yaml::from_str::<ServiceEntry>(
            r#"
apiVersion: networking.istio.io/v1beta1
kind: ServiceEntry
metadata:
  name: external-svc
  namespace: bookinfo
spec:
  hosts:
  - api.dropboxapi.com
  - www.googleapis.com
  location: MESH_EXTERNAL
  ports:
  - number: 443
    name: https
    protocol: TLS
"#,
        )
        .expect("manifest must parse");
        assert_eq!(se.spec.location, Some(Location::MeshExternal));

        let se = model::ExternalServiceRegistration::try_from(se).expect("resource must convert");
        assert_eq!(
            se,
            model::ExternalServiceRegistration::new(
                "bookinfo",
                "external-svc",
                vec![
                    "api.dropboxapi.com".to_string(),
                    "www.googleapis.com".to_string()
                ],
            )
        );
    }
}
