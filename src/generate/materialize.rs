//! Hand-off to the external configuration tool: import blocks go in, a
//! generated resources file comes out and is put into canonical order.

use hcl::Body;
use std::path::{Path, PathBuf};

use crate::executor::Executor;
use crate::generate::blocks;
use crate::generate::error::GenerateResult;
use crate::generate::synthesize::ImportDirective;
use crate::traits::FileSystem;

pub const IMPORTS_FILE: &str = "imports.tf";
pub const RESOURCES_FILE: &str = "resources.tf";

/// `<label>-<suffix>`, or just `suffix` for the unlabelled environment
pub fn labelled_file_name(label: &str, suffix: &str) -> String {
    if label.is_empty() {
        suffix.to_string()
    } else {
        format!("{}-{}", label, suffix)
    }
}

/// Files written by one materialized pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedFiles {
    pub imports_file: PathBuf,
    /// `None` when the tool had nothing to generate
    pub resources_file: Option<PathBuf>,
}

/// Write the import file, let the tool generate configuration, sort it
///
/// Any failure of the tool aborts with its diagnostics attached.
pub fn materialize(
    fs: &dyn FileSystem,
    executor: &dyn Executor,
    directives: &[ImportDirective],
    output_dir: &Path,
    label: &str,
) -> GenerateResult<MaterializedFiles> {
    let imports_file = output_dir.join(labelled_file_name(label, IMPORTS_FILE));
    let resources_name = labelled_file_name(label, RESOURCES_FILE);
    let resources_file = output_dir.join(&resources_name);

    let body: Body = directives.iter().map(blocks::import_block).collect();
    blocks::write_body(fs, &imports_file, &body)?;
    tracing::info!(
        file = %imports_file.display(),
        count = directives.len(),
        "wrote import blocks"
    );

    // The tool refuses to overwrite an existing generated file
    if fs.exists(&resources_file) {
        tracing::debug!(file = %resources_file.display(), "removing stale generated file");
        fs.remove_file(&resources_file)?;
    }

    executor.plan_generate(output_dir, &resources_name)?;

    if !fs.exists(&resources_file) {
        tracing::debug!(file = %resources_file.display(), "no configuration was generated");
        return Ok(MaterializedFiles {
            imports_file,
            resources_file: None,
        });
    }

    blocks::sort_file(fs, &resources_file)?;

    Ok(MaterializedFiles {
        imports_file,
        resources_file: Some(resources_file),
    })
}
