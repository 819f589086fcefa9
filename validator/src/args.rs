use crate::{api, core::MeshConfig, Resources};
use anyhow::{Context, Result};
use clap::Parser;
use std::{io, path::PathBuf};

#[derive(Debug, Parser)]
#[clap(name = "mesh-validator", about = "Validates mesh traffic configuration")]
pub struct Args {
    #[clap(
        long,
        default_value = "mesh_validator=info,warn",
        env = "MESH_VALIDATOR_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(long, default_value = "cluster.local", env = "MESH_VALIDATOR_CLUSTER_DOMAIN")]
    cluster_domain: String,

    /// The namespace whose authentication policies apply to the whole mesh.
    #[clap(long, default_value = "istio-system", env = "MESH_VALIDATOR_ROOT_NAMESPACE")]
    root_namespace: String,

    /// Skips mutual TLS checks for meshes where clients negotiate mutual TLS automatically.
    #[clap(long, env = "MESH_VALIDATOR_AUTO_MTLS")]
    auto_mtls: bool,

    /// Only validates the resources visible from this namespace.
    #[clap(long, short)]
    namespace: Option<String>,

    /// Namespaces that exist in the cluster but are not declared in any manifest.
    #[clap(long = "known-namespace")]
    known_namespaces: Vec<String>,

    #[clap(long)]
    pretty: bool,

    /// Manifest files to read. `-` reads from stdin.
    #[clap(required = true)]
    manifests: Vec<PathBuf>,
}

impl Args {
    pub fn parse_and_run() -> Result<()> {
        let args = Self::parse();
        args.log_format.clone().try_init(args.log_level.clone())?;
        args.run(&mut io::stdout().lock())
    }

    /// Validates the manifests and writes the results as JSON to `out`.
    pub fn run(self, out: &mut impl io::Write) -> Result<()> {
        let Self {
            log_level: _,
            log_format: _,
            cluster_domain,
            root_namespace,
            auto_mtls,
            namespace,
            known_namespaces,
            pretty,
            manifests,
        } = self;

        let config = MeshConfig {
            cluster_domain,
            root_namespace,
            auto_mtls,
        };

        let mut resources = Resources::try_from(read_manifests(&manifests)?)?;
        resources.namespaces.extend(known_namespaces);
        tracing::info!(
            namespaces = resources.namespaces.len(),
            routing_policies = resources.routing_policies.len(),
            routing_specs = resources.routing_specs.len(),
            registrations = resources.registrations.len(),
            auth_policies = resources.auth_policies.len(),
            "Loaded resources",
        );

        let validations = resources.validate(namespace.as_deref(), &config);
        let invalid = validations.values().filter(|v| !v.valid).count();
        tracing::info!(objects = validations.len(), invalid, "Validated");

        if pretty {
            serde_json::to_writer_pretty(&mut *out, &validations)?;
        } else {
            serde_json::to_writer(&mut *out, &validations)?;
        }
        writeln!(out)?;
        Ok(())
    }
}

fn read_manifests(paths: &[PathBuf]) -> Result<api::Manifests> {
    let mut manifests = api::Manifests::default();
    for path in paths {
        let input = if path.as_os_str() == "-" {
            io::read_to_string(io::stdin()).context("failed to read stdin")?
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        };
        manifests
            .read_str(&input)
            .with_context(|| format!("invalid manifest {}", path.display()))?;
        tracing::debug!(path = %path.display(), resources = manifests.len(), "Read manifest");
    }
    Ok(manifests)
}
