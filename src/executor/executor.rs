use std::path::Path;
use std::process::Output;

use crate::generate::error::GenerateResult;

/// Trait for the external configuration tool (Terraform or OpenTofu)
///
/// Every call blocks until the subprocess exits. A non-zero exit status is
/// an `ExternalToolFailure` carrying the tool's output.
pub trait Executor: Send + Sync {
    /// Check that the tool can be started, by running `version` in `working_dir`
    fn check_installed(&self, working_dir: &Path) -> GenerateResult<()>;

    /// Initialize the working directory, downloading the provider
    fn init(&self, working_dir: &Path) -> GenerateResult<Output>;

    /// Plan in `working_dir`, writing configuration for every import block
    /// that has none yet to `out_file` (relative to `working_dir`)
    fn plan_generate(&self, working_dir: &Path, out_file: &str) -> GenerateResult<Output>;

    /// Get the name of the binary this executor runs (e.g., "terraform", "tofu")
    fn get_name(&self) -> &str;
}
