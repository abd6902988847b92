//! Resolved run configuration.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

use crate::executor::terraform::DEFAULT_BINARY;
use crate::generate::convert::OutputFormat;
use crate::grafana::DEFAULT_CLOUD_API_URL;

const REDACTED: &str = "<redacted>";

fn redact<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str(REDACTED)
    }
}

fn redact_option<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => redact(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// A single Grafana instance to generate from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrafanaConfig {
    pub url: String,
    /// `user:password` or a service account token
    #[serde(serialize_with = "redact")]
    pub auth: String,
}

/// A Grafana Cloud organisation whose stacks are all generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(serialize_with = "redact")]
    pub access_policy_token: String,
    pub org: String,
    /// Credential for the stacks' own APIs; falls back to the access policy token
    #[serde(default, serialize_with = "redact_option")]
    pub stack_auth: Option<String>,
    #[serde(default = "default_cloud_api_url")]
    pub api_url: String,
}

impl CloudConfig {
    /// Credential used against every discovered stack
    pub fn stack_credential(&self) -> &str {
        self.stack_auth
            .as_deref()
            .unwrap_or(&self.access_policy_token)
    }
}

fn default_cloud_api_url() -> String {
    DEFAULT_CLOUD_API_URL.to_string()
}

fn default_terraform_binary() -> String {
    DEFAULT_BINARY.to_string()
}

/// Everything a run needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub output_dir: PathBuf,
    #[serde(default)]
    pub clobber: bool,
    #[serde(default)]
    pub format: OutputFormat,
    /// Provider version pinned in `provider.tf`, without a leading `v`
    pub provider_version: String,
    /// `<type>.<name>` glob patterns; empty selects everything
    #[serde(default)]
    pub include_resources: Vec<String>,
    #[serde(default = "default_terraform_binary")]
    pub terraform_binary: String,
    #[serde(default)]
    pub grafana: Option<GrafanaConfig>,
    #[serde(default)]
    pub cloud: Option<CloudConfig>,
}

impl Config {
    pub fn new(output_dir: impl Into<PathBuf>, provider_version: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            clobber: false,
            format: OutputFormat::default(),
            provider_version: normalize_version(provider_version),
            include_resources: Vec::new(),
            terraform_binary: default_terraform_binary(),
            grafana: None,
            cloud: None,
        }
    }

    /// Check the configuration before anything is touched
    pub fn validate(&self) -> Result<()> {
        if self.grafana.is_none() && self.cloud.is_none() {
            bail!("either a Grafana URL or a Grafana Cloud access policy token must be set");
        }

        if self.output_dir.as_os_str().is_empty() {
            bail!("output directory must not be empty");
        }

        semver::Version::parse(&self.provider_version).with_context(|| {
            format!(
                "terraform provider version {:?} is not a valid semantic version",
                self.provider_version
            )
        })?;

        if let Some(grafana) = &self.grafana {
            url::Url::parse(&grafana.url)
                .with_context(|| format!("invalid Grafana URL: {}", grafana.url))?;
            if grafana.auth.is_empty() {
                bail!("Grafana auth must be set together with the Grafana URL");
            }
        }

        if let Some(cloud) = &self.cloud {
            url::Url::parse(&cloud.api_url)
                .with_context(|| format!("invalid Grafana Cloud API URL: {}", cloud.api_url))?;
            if cloud.org.is_empty() {
                bail!("the Grafana Cloud organisation must be set");
            }
        }

        if self.terraform_binary.is_empty() {
            bail!("terraform binary must not be empty");
        }

        Ok(())
    }

    /// JSON rendering with every credential redacted
    pub fn to_redacted_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Drop the leading `v` of a version such as `v3.4.1`
pub fn normalize_version(version: &str) -> String {
    version.trim().trim_start_matches('v').to_string()
}
