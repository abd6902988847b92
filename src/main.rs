mod config;
mod context;
mod executor;
mod generate;
mod grafana;
mod logging;
mod output;
mod traits;

use anyhow::{Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use config::{CloudConfig, Config, GrafanaConfig};
use context::Context;
use generate::RunSummary;
use generate::convert::OutputFormat;

#[derive(Parser)]
#[command(name = "grafana-generate")]
#[command(about = "Generate Terraform configuration for the resources of an existing Grafana instance or Grafana Cloud organisation", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory to write the generated files to
    #[arg(short, long, env = "GRAFANA_GENERATE_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Delete the output directory first if it already exists
    #[arg(long, env = "GRAFANA_GENERATE_CLOBBER")]
    clobber: bool,

    /// Format of the generated files: hcl, json or crossplane
    #[arg(long, default_value = "hcl", env = "GRAFANA_GENERATE_OUTPUT_FORMAT")]
    output_format: OutputFormat,

    /// Only generate resources matching these `<type>.<name>` globs (e.g. `grafana_folder.*`)
    #[arg(long, value_delimiter = ',', env = "GRAFANA_GENERATE_INCLUDE_RESOURCES")]
    include_resources: Vec<String>,

    /// Version of the Grafana Terraform provider to pin in provider.tf
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"), env = "GRAFANA_GENERATE_TERRAFORM_PROVIDER_VERSION")]
    terraform_provider_version: String,

    /// Terraform-compatible binary to run (terraform or tofu)
    #[arg(long, default_value = "terraform", env = "GRAFANA_GENERATE_TERRAFORM_BINARY")]
    terraform_binary: String,

    /// URL of the Grafana instance to generate from
    #[arg(long, env = "GRAFANA_URL", requires = "grafana_auth")]
    grafana_url: Option<String>,

    /// Service account token or `user:password` for the Grafana instance
    #[arg(long, env = "GRAFANA_AUTH", hide_env_values = true)]
    grafana_auth: Option<String>,

    /// Grafana Cloud access policy token; generates the whole organisation
    #[arg(long, env = "GRAFANA_CLOUD_ACCESS_POLICY_TOKEN", hide_env_values = true, requires = "cloud_org")]
    cloud_access_policy_token: Option<String>,

    /// Grafana Cloud organisation slug
    #[arg(long, env = "GRAFANA_CLOUD_ORG")]
    cloud_org: Option<String>,

    /// Token used against each stack (defaults to the access policy token)
    #[arg(long, env = "GRAFANA_CLOUD_STACK_AUTH", hide_env_values = true)]
    cloud_stack_auth: Option<String>,

    /// Grafana Cloud API URL
    #[arg(long, default_value = grafana::DEFAULT_CLOUD_API_URL, env = "GRAFANA_CLOUD_API_URL")]
    cloud_api_url: String,

    /// Print the resolved configuration (secrets redacted) and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.output_dir, &self.terraform_provider_version);
        config.clobber = self.clobber;
        config.format = self.output_format;
        config.include_resources = self
            .include_resources
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        config.terraform_binary = self.terraform_binary;

        if let Some(url) = self.grafana_url {
            config.grafana = Some(GrafanaConfig {
                url,
                auth: self.grafana_auth.unwrap_or_default(),
            });
        }

        if let Some(token) = self.cloud_access_policy_token {
            config.cloud = Some(CloudConfig {
                access_policy_token: token,
                org: self.cloud_org.unwrap_or_default(),
                stack_auth: self.cloud_stack_auth,
                api_url: self.cloud_api_url,
            });
        }

        config
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let ctx = Context::new();
    if let Err(err) = execute(&ctx, cli).await {
        ctx.output.error(&error_message(&err));
        std::process::exit(1);
    }
}

async fn execute(ctx: &Context, cli: Cli) -> Result<()> {
    let print_config = cli.print_config;
    let config = cli.into_config();
    config.validate()?;

    if print_config {
        println!("{}", config.to_redacted_json()?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupted, cancelling");
        on_interrupt.cancel();
    })
    .context("Failed to install the Ctrl-C handler")?;

    let summary = generate::run(ctx, &config, &cancel).await?;
    print_summary(ctx, &config, &summary);

    Ok(())
}

/// The error and its causes, skipping causes the message already spells out
fn error_message(err: &anyhow::Error) -> String {
    let mut message = err.to_string();
    for cause in err.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

fn print_summary(ctx: &Context, config: &Config, summary: &RunSummary) {
    ctx.output.section("Summary");
    for pass in &summary.passes {
        let label = if pass.label.is_empty() {
            "grafana"
        } else {
            pass.label.as_str()
        };
        ctx.output
            .key_value(label, &format!("{} import blocks", pass.imports));
        ctx.output
            .dimmed(&format!("  {}", pass.imports_file.display()));
        if let Some(resources) = &pass.resources_file {
            ctx.output.dimmed(&format!("  {}", resources.display()));
        }
    }
    for file in &summary.converted {
        ctx.output.dimmed(&format!("  converted {}", file.display()));
    }
    ctx.output.success(&format!(
        "Generated {} import blocks into {}",
        summary.total_imports(),
        config.output_dir.display()
    ));
}
