//! One generation run: prepare the output directory, install the provider,
//! run one pass per environment and convert the result.
//!
//! Stages follow each other strictly and the first error ends the run:
//! directory prepared, provider block written, provider initialized, then
//! one pass per environment and the optional format conversion.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::Context;
use crate::executor::{Executor, TerraformExecutor};
use crate::generate::catalog::{Catalog, ListerData};
use crate::generate::convert;
use crate::generate::enumerate::{collect_results, enumerate};
use crate::generate::error::{GenerateError, GenerateResult};
use crate::generate::filter::{ResourceFilter, filter_resources};
use crate::generate::materialize::materialize;
use crate::generate::provider::{self, EnvironmentProvider};
use crate::generate::synthesize::{DEFAULT_ENVIRONMENT_ALIAS, synthesize};
use crate::grafana::Client;
use crate::grafana::cloud::{GrafanaComStacks, StackDiscovery, cloud_catalog};
use crate::grafana::resources::grafana_catalog;
use crate::traits::FileSystem;

/// Progress of a run, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DirectoryPrepared,
    ProviderBlockWritten,
    ProviderInitialized,
    Pass,
    FormatConverted,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DirectoryPrepared => "directory prepared",
            Stage::ProviderBlockWritten => "provider block written",
            Stage::ProviderInitialized => "provider initialized",
            Stage::Pass => "environment pass",
            Stage::FormatConverted => "format converted",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of one environment pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Environment label; empty for a direct Grafana instance
    pub label: String,
    /// Import blocks written
    pub imports: usize,
    pub imports_file: PathBuf,
    pub resources_file: Option<PathBuf>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passes: Vec<PassSummary>,
    /// Files written by the format conversion
    pub converted: Vec<PathBuf>,
}

impl RunSummary {
    pub fn total_imports(&self) -> usize {
        self.passes.iter().map(|p| p.imports).sum()
    }
}

/// One target of a pass
struct Environment {
    label: String,
    provider: EnvironmentProvider,
    client: Client,
    data: ListerData,
}

/// Drives generation runs
pub struct Generator {
    ctx: Context,
    executor: Arc<dyn Executor>,
    grafana_catalog: Catalog,
    cloud_catalog: Catalog,
    stacks: Option<Arc<dyn StackDiscovery>>,
}

impl Generator {
    /// Generator with the built-in catalogs, running `config.terraform_binary`
    /// through the context's command executor
    pub fn new(ctx: Context, config: &Config) -> Self {
        let executor = Arc::new(TerraformExecutor::new(
            config.terraform_binary.clone(),
            Arc::clone(&ctx.command),
        ));

        Self {
            ctx,
            executor,
            grafana_catalog: grafana_catalog(),
            cloud_catalog: cloud_catalog(),
            stacks: None,
        }
    }

    /// Replace the catalogs used for instance and cloud passes
    #[cfg(test)]
    pub fn with_catalogs(mut self, grafana: Catalog, cloud: Catalog) -> Self {
        self.grafana_catalog = grafana;
        self.cloud_catalog = cloud;
        self
    }

    /// Replace how cloud stacks are discovered
    #[cfg(test)]
    pub fn with_stack_discovery(mut self, stacks: Arc<dyn StackDiscovery>) -> Self {
        self.stacks = Some(stacks);
        self
    }

    fn fs(&self) -> &dyn FileSystem {
        self.ctx.fs.as_ref()
    }

    /// Run the whole pipeline for `config`
    pub async fn run(&self, config: &Config, cancel: &CancellationToken) -> GenerateResult<RunSummary> {
        // Malformed filters fail before anything is touched
        let filter = ResourceFilter::parse(&config.include_resources)?;
        let output_dir = config.output_dir.as_path();
        let mut summary = RunSummary::default();

        self.prepare_output_dir(output_dir, config.clobber)?;
        self.advance(Stage::DirectoryPrepared);

        provider::write_requirements(self.fs(), output_dir, &config.provider_version)?;
        self.advance(Stage::ProviderBlockWritten);

        let installed = self.executor.check_installed(output_dir);
        self.ctx
            .output
            .status_check(self.executor.get_name(), installed.is_ok());
        installed?;
        self.ctx
            .output
            .info(&format!("Running {} init", self.executor.get_name()));
        self.executor.init(output_dir)?;
        self.advance(Stage::ProviderInitialized);

        if let Some(cloud) = &config.cloud {
            let client = Client::cloud(&cloud.api_url, &cloud.access_policy_token)?;
            let environment = Environment {
                label: DEFAULT_ENVIRONMENT_ALIAS.to_string(),
                provider: EnvironmentProvider::Cloud {
                    access_policy_token: cloud.access_policy_token.clone(),
                },
                client: client.clone(),
                data: ListerData::new(DEFAULT_ENVIRONMENT_ALIAS).with_cloud_org(&cloud.org),
            };
            summary
                .passes
                .push(self.run_pass(&environment, &self.cloud_catalog, &filter, output_dir, cancel).await?);

            let discovery: Arc<dyn StackDiscovery> = match &self.stacks {
                Some(stacks) => Arc::clone(stacks),
                None => Arc::new(GrafanaComStacks::new(client, &cloud.org)),
            };
            let mut stacks = discovery
                .list_stacks(cancel)
                .await
                .map_err(GenerateError::StackDiscovery)?;
            stacks.sort_by(|a, b| a.slug.cmp(&b.slug));
            tracing::info!(count = stacks.len(), org = %cloud.org, "discovered stacks");

            // Stacks run one after another so the tool is never invoked concurrently
            for stack in stacks {
                let label = stack.label();
                let environment = Environment {
                    provider: EnvironmentProvider::Stack {
                        alias: label.clone(),
                        url: stack.url.clone(),
                        auth: cloud.stack_credential().to_string(),
                    },
                    client: Client::grafana(&stack.url, cloud.stack_credential())?,
                    data: ListerData::new(&label),
                    label,
                };
                summary
                    .passes
                    .push(self.run_pass(&environment, &self.grafana_catalog, &filter, output_dir, cancel).await?);
            }
        }

        if let Some(grafana) = &config.grafana {
            let environment = Environment {
                label: String::new(),
                provider: EnvironmentProvider::Grafana {
                    url: grafana.url.clone(),
                    auth: grafana.auth.clone(),
                },
                client: Client::grafana(&grafana.url, &grafana.auth)?,
                data: ListerData::default(),
            };
            summary
                .passes
                .push(self.run_pass(&environment, &self.grafana_catalog, &filter, output_dir, cancel).await?);
        }

        summary.converted = convert::convert(self.fs(), output_dir, config.format)?;
        if !summary.converted.is_empty() {
            self.advance(Stage::FormatConverted);
        }

        self.advance(Stage::Done);
        Ok(summary)
    }

    fn prepare_output_dir(&self, output_dir: &Path, clobber: bool) -> GenerateResult<()> {
        if self.fs().exists(output_dir) {
            if !clobber {
                return Err(GenerateError::OutputExists {
                    path: output_dir.to_path_buf(),
                });
            }
            self.ctx
                .output
                .warning(&format!("Deleting all files in {}", output_dir.display()));
            self.fs().remove_dir_all(output_dir)?;
        }

        self.ctx
            .output
            .info(&format!("Generating resources to {}", output_dir.display()));
        self.fs().create_dir_all(output_dir)?;
        Ok(())
    }

    async fn run_pass(
        &self,
        environment: &Environment,
        catalog: &Catalog,
        filter: &ResourceFilter,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> GenerateResult<PassSummary> {
        self.advance(Stage::Pass);
        let display_label = if environment.label.is_empty() {
            "grafana"
        } else {
            environment.label.as_str()
        };
        self.ctx.output.section("Generating resources");
        self.ctx.output.environment_badge(display_label);

        provider::append_environment(self.fs(), output_dir, &environment.provider)?;

        let selected = filter_resources(catalog, filter);
        if selected.is_empty() {
            tracing::info!(environment = display_label, "no resource types selected");
        }
        tracing::debug!(
            environment = display_label,
            url = %environment.client.base_url(),
            types = ?selected.names(),
            "enumerating resource types"
        );

        let results = enumerate(&selected, cancel, &environment.client, &environment.data).await;
        let listed = collect_results(results)?;
        let directives = synthesize(&listed, filter, environment.provider.alias());

        let files = materialize(
            self.fs(),
            self.executor.as_ref(),
            &directives,
            output_dir,
            &environment.label,
        )?;

        self.ctx.output.success(&format!(
            "Generated {} import blocks for {}",
            directives.len(),
            display_label
        ));

        Ok(PassSummary {
            label: environment.label.clone(),
            imports: directives.len(),
            imports_file: files.imports_file,
            resources_file: files.resources_file,
        })
    }

    fn advance(&self, stage: Stage) {
        tracing::debug!(stage = %stage, "generation stage");
    }
}

/// Run the pipeline with the built-in catalogs and stack discovery
pub async fn run(ctx: &Context, config: &Config, cancel: &CancellationToken) -> GenerateResult<RunSummary> {
    Generator::new(ctx.clone(), config).run(config, cancel).await
}
