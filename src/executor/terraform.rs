use std::path::Path;
use std::process::Output;
use std::sync::Arc;

use super::executor::Executor;
use crate::generate::error::{GenerateError, GenerateResult};
use crate::traits::CommandExecutor;

/// Default binary name
pub const DEFAULT_BINARY: &str = "terraform";

/// Terraform/OpenTofu executor over an injectable command runner
pub struct TerraformExecutor {
    binary: String,
    command: Arc<dyn CommandExecutor>,
}

impl TerraformExecutor {
    pub fn new(binary: impl Into<String>, command: Arc<dyn CommandExecutor>) -> Self {
        Self {
            binary: binary.into(),
            command,
        }
    }

    fn run(&self, args: &[&str], working_dir: &Path) -> GenerateResult<Output> {
        let command_line = format!("{} {}", self.binary, args.join(" "));
        tracing::debug!(command = %command_line, dir = %working_dir.display(), "running external tool");

        let output = self
            .command
            .execute(&self.binary, args, working_dir)
            .map_err(|e| GenerateError::ExternalToolFailure {
                command: command_line.clone(),
                exit_code: None,
                output: format!("{:#}", e),
            })?;

        if !output.status.success() {
            return Err(GenerateError::ExternalToolFailure {
                command: command_line,
                exit_code: output.status.code(),
                output: diagnostics(&output),
            });
        }

        Ok(output)
    }
}

impl Executor for TerraformExecutor {
    fn check_installed(&self, working_dir: &Path) -> GenerateResult<()> {
        self.run(&["version"], working_dir).map(|_| ())
    }

    fn init(&self, working_dir: &Path) -> GenerateResult<Output> {
        self.run(&["init", "-input=false"], working_dir)
    }

    fn plan_generate(&self, working_dir: &Path, out_file: &str) -> GenerateResult<Output> {
        let out_arg = format!("-generate-config-out={}", out_file);
        self.run(&["plan", "-input=false", &out_arg], working_dir)
    }

    fn get_name(&self) -> &str {
        &self.binary
    }
}

/// Captured stdout and stderr, verbatim apart from surrounding whitespace
fn diagnostics(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
