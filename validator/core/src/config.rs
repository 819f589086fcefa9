/// Mesh-wide settings that influence how hosts are qualified and which mutual TLS checks apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshConfig {
    /// E.g. "cluster.local"
    pub cluster_domain: String,

    /// The namespace where mesh-wide authentication policies are declared.
    pub root_namespace: String,

    /// Indicates that the mesh negotiates mutual TLS automatically, in which case the mutual TLS
    /// consistency checks are skipped.
    pub auto_mtls: bool,
}

// === impl MeshConfig ===

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            cluster_domain: "cluster.local".to_string(),
            root_namespace: "istio-system".to_string(),
            auto_mtls: false,
        }
    }
}

impl MeshConfig {
    /// The suffix shared by every in-cluster service host, e.g. `svc.cluster.local`.
    pub fn service_suffix(&self) -> String {
        format!("svc.{}", self.cluster_domain)
    }

    pub fn service_fqdn(&self, ns: &str, svc: &str) -> String {
        format!("{}.{}.svc.{}", svc, ns, self.cluster_domain)
    }

    /// Returns the namespace component of an in-cluster service FQDN.
    pub fn service_namespace<'h>(&self, fqdn: &'h str) -> Option<&'h str> {
        let rest = fqdn.strip_suffix(&self.cluster_domain)?;
        let rest = rest.strip_suffix(".svc.")?;
        let (_, ns) = rest.rsplit_once('.')?;
        if ns.is_empty() {
            return None;
        }
        Some(ns)
    }
}
