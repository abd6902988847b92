//! `provider.tf`: provider installation plus one configuration block per
//! environment.

use hcl::{Block, Body, Value};
use std::path::{Path, PathBuf};

use crate::generate::blocks;
use crate::generate::error::GenerateResult;
use crate::generate::synthesize::{DEFAULT_ENVIRONMENT_ALIAS, PROVIDER_NAME};
use crate::traits::FileSystem;

pub const PROVIDER_FILE: &str = "provider.tf";
pub const PROVIDER_SOURCE: &str = "grafana/grafana";

/// How one environment's provider is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentProvider {
    /// A single Grafana instance, the unaliased default provider
    Grafana { url: String, auth: String },
    /// The Grafana Cloud API, aliased `cloud`
    Cloud { access_policy_token: String },
    /// One Grafana Cloud stack, aliased by its environment label
    Stack {
        alias: String,
        url: String,
        auth: String,
    },
}

impl EnvironmentProvider {
    /// Alias import blocks reference, if any
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Grafana { .. } => None,
            Self::Cloud { .. } => Some(DEFAULT_ENVIRONMENT_ALIAS),
            Self::Stack { alias, .. } => Some(alias),
        }
    }

    /// `provider "grafana" { ... }`
    pub fn block(&self) -> Block {
        let builder = Block::builder("provider").add_label(PROVIDER_NAME);
        match self {
            Self::Grafana { url, auth } => builder
                .add_attribute(("url", url.as_str()))
                .add_attribute(("auth", auth.as_str()))
                .build(),
            Self::Cloud {
                access_policy_token,
            } => builder
                .add_attribute(("alias", DEFAULT_ENVIRONMENT_ALIAS))
                .add_attribute(("cloud_access_policy_token", access_policy_token.as_str()))
                .build(),
            Self::Stack { alias, url, auth } => builder
                .add_attribute(("alias", alias.as_str()))
                .add_attribute(("url", url.as_str()))
                .add_attribute(("auth", auth.as_str()))
                .build(),
        }
    }
}

/// Path of `provider.tf` inside `output_dir`
pub fn provider_file(output_dir: &Path) -> PathBuf {
    output_dir.join(PROVIDER_FILE)
}

/// `terraform { required_providers { grafana = { source, version } } }`
///
/// A leading `v` on `version` is dropped.
pub fn required_providers_block(version: &str) -> Block {
    let mut requirement = hcl::value::Map::new();
    requirement.insert("source".to_string(), Value::from(PROVIDER_SOURCE));
    requirement.insert(
        "version".to_string(),
        Value::from(version.trim_start_matches('v')),
    );

    Block::builder("terraform")
        .add_block(
            Block::builder("required_providers")
                .add_attribute((PROVIDER_NAME, Value::Object(requirement)))
                .build(),
        )
        .build()
}

/// Start `provider.tf` with the provider installation block
pub fn write_requirements(fs: &dyn FileSystem, output_dir: &Path, version: &str) -> GenerateResult<()> {
    let body = Body::builder()
        .add_block(required_providers_block(version))
        .build();
    blocks::write_body(fs, &provider_file(output_dir), &body)
}

/// Append an environment's configuration block to `provider.tf`
pub fn append_environment(
    fs: &dyn FileSystem,
    output_dir: &Path,
    provider: &EnvironmentProvider,
) -> GenerateResult<()> {
    blocks::append_blocks(fs, &provider_file(output_dir), vec![provider.block()])
}
