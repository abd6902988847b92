use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a resource lister
pub type ListerError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for the resource generation pipeline
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Output directory is already there and clobbering was not requested
    #[error("output dir {} already exists. Use the clobber option to delete it", .path.display())]
    OutputExists { path: PathBuf },

    /// Inclusion filter is not `<type>.<name>` or is not a valid glob
    #[error("included resource {pattern:?} is invalid: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// A resource type failed to list its identifiers
    #[error("failed to generate {resource} resources: {source}")]
    ListerFailure {
        resource: String,
        #[source]
        source: ListerError,
    },

    /// Listing was aborted through the cancellation token
    #[error("listing {resource} resources was cancelled")]
    Cancelled { resource: String },

    /// The external configuration tool exited unsuccessfully
    #[error("{command} failed{}: {output}", .exit_code.map(|c| format!(" (exit code {})", c)).unwrap_or_default())]
    ExternalToolFailure {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The requested output format has no converter
    #[error("{format} output format is not yet supported")]
    NotSupported { format: String },

    /// Stack discovery for a cloud configuration failed
    #[error("failed to list cloud stacks: {0}")]
    StackDiscovery(#[source] ListerError),

    /// A generated file could not be parsed or rendered as HCL
    #[error("failed to process HCL in {}: {source}", .path.display())]
    Hcl {
        path: PathBuf,
        #[source]
        source: hcl::Error,
    },

    /// File system operation failed
    #[error(transparent)]
    FileSystem(#[from] anyhow::Error),
}

/// Result type for generation operations
pub type GenerateResult<T> = Result<T, GenerateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_exists_message_mentions_clobber() {
        let err = GenerateError::OutputExists {
            path: PathBuf::from("/tmp/out"),
        };
        let message = err.to_string();
        assert!(message.contains("/tmp/out"));
        assert!(message.contains("clobber"));
    }

    #[test]
    fn test_lister_failure_names_resource() {
        let err = GenerateError::ListerFailure {
            resource: "grafana_folder".to_string(),
            source: "HTTP 500".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to generate grafana_folder resources: HTTP 500"
        );
    }

    #[test]
    fn test_external_tool_failure_includes_exit_code_and_output() {
        let err = GenerateError::ExternalToolFailure {
            command: "terraform plan".to_string(),
            exit_code: Some(1),
            output: "Error: Invalid provider".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "terraform plan failed (exit code 1): Error: Invalid provider"
        );

        let err = GenerateError::ExternalToolFailure {
            command: "terraform init".to_string(),
            exit_code: None,
            output: "killed".to_string(),
        };
        assert_eq!(err.to_string(), "terraform init failed: killed");
    }

    #[test]
    fn test_not_supported_names_format() {
        let err = GenerateError::NotSupported {
            format: "crossplane".to_string(),
        };
        assert_eq!(err.to_string(), "crossplane output format is not yet supported");
    }
}
