//! Converting the generated tree to an alternate serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::generate::error::{GenerateError, GenerateResult};
use crate::traits::FileSystem;

/// Serialization of the generated files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Hcl,
    Json,
    Crossplane,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hcl => "hcl",
            Self::Json => "json",
            Self::Crossplane => "crossplane",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hcl" => Ok(Self::Hcl),
            "json" => Ok(Self::Json),
            "crossplane" => Ok(Self::Crossplane),
            other => Err(format!(
                "unknown output format '{}' (expected hcl, json or crossplane)",
                other
            )),
        }
    }
}

/// Bring the files in `output_dir` into `format`
///
/// Returns the files written. HCL is the native format and needs no work.
pub fn convert(fs: &dyn FileSystem, output_dir: &Path, format: OutputFormat) -> GenerateResult<Vec<PathBuf>> {
    match format {
        OutputFormat::Hcl => Ok(Vec::new()),
        OutputFormat::Json => convert_to_json(fs, output_dir),
        OutputFormat::Crossplane => Err(GenerateError::NotSupported {
            format: format.to_string(),
        }),
    }
}

/// Rewrite every `*.tf` in `output_dir` as Terraform JSON (`*.tf.json`)
///
/// Files are converted in path order and each original is removed once its
/// JSON sibling is written.
pub fn convert_to_json(fs: &dyn FileSystem, output_dir: &Path) -> GenerateResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    for path in fs.read_dir(output_dir)? {
        if path.extension().and_then(|e| e.to_str()) != Some("tf") || !fs.is_file(&path) {
            continue;
        }

        let contents = fs.read_to_string(&path)?;
        let value: serde_json::Value =
            hcl::from_str(&contents).map_err(|source| GenerateError::Hcl {
                path: path.clone(),
                source,
            })?;

        let mut json_path = path.clone().into_os_string();
        json_path.push(".json");
        let json_path = PathBuf::from(json_path);

        let rendered = serde_json::to_string_pretty(&value).map_err(anyhow::Error::from)?;
        fs.write(&json_path, &rendered)?;
        fs.remove_file(&path)?;

        tracing::debug!(from = %path.display(), to = %json_path.display(), "converted to JSON");
        written.push(json_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFileSystem;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("hcl".parse::<OutputFormat>().unwrap(), OutputFormat::Hcl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "crossplane".parse::<OutputFormat>().unwrap(),
            OutputFormat::Crossplane
        );
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_crossplane_is_not_supported() {
        let fs = MockFileSystem::new();
        let err = convert(&fs, Path::new("/out"), OutputFormat::Crossplane).unwrap_err();
        assert!(matches!(err, GenerateError::NotSupported { .. }));
        assert_eq!(err.to_string(), "crossplane output format is not yet supported");
    }

    #[test]
    fn test_hcl_leaves_files_alone() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/provider.tf"), "terraform {}\n").unwrap();

        assert!(convert(&fs, Path::new("/out"), OutputFormat::Hcl).unwrap().is_empty());
        assert!(fs.has_file(Path::new("/out/provider.tf")));
    }

    #[test]
    fn test_json_conversion_replaces_tf_files() {
        let fs = MockFileSystem::new();
        fs.write(
            Path::new("/out/resources.tf"),
            "resource \"grafana_folder\" \"xyz\" {\n  title = \"XYZ\"\n}\n",
        )
        .unwrap();
        fs.write(
            Path::new("/out/imports.tf"),
            "import {\n  to = grafana_folder.xyz\n  id = \"xyz\"\n}\n",
        )
        .unwrap();
        fs.write(Path::new("/out/notes.txt"), "keep me").unwrap();

        let written = convert(&fs, Path::new("/out"), OutputFormat::Json).unwrap();
        assert_eq!(
            written,
            vec![
                PathBuf::from("/out/imports.tf.json"),
                PathBuf::from("/out/resources.tf.json"),
            ]
        );

        assert!(!fs.has_file(Path::new("/out/resources.tf")));
        assert!(fs.has_file(Path::new("/out/notes.txt")));

        let resources: serde_json::Value = serde_json::from_str(
            &fs.get_file_contents(Path::new("/out/resources.tf.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            resources["resource"]["grafana_folder"]["xyz"]["title"],
            serde_json::json!("XYZ")
        );
    }

    #[test]
    fn test_json_conversion_reports_bad_hcl() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/broken.tf"), "resource {").unwrap();

        let err = convert_to_json(&fs, Path::new("/out")).unwrap_err();
        assert!(matches!(err, GenerateError::Hcl { .. }));
    }
}
