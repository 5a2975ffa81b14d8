use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("SMTP transport error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),

    #[error("Email build error: {0}")]
    EmailBuildError(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    AddressError(#[from] lettre::address::AddressError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Input file '{path}' has no '{field}' column")]
    MissingInputFieldError { path: String, field: String },

    #[error("Input file '{path}' contains no codes")]
    EmptyInputError { path: String },

    #[error("Cannot load {kind} from '{path}': {message}")]
    ResourceError {
        kind: String,
        path: String,
        message: String,
    },

    #[error("Template rendering failed: {message}")]
    RenderError { message: String },

    #[error("Failed to persist {artifact}: {message}")]
    PersistenceError { artifact: String, message: String },

    #[error("Invalid status transition for CEP {code}: {message}")]
    InvalidTransition { code: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Mail,
    Persistence,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BatchError::ConfigError { .. }
            | BatchError::MissingConfigError { .. }
            | BatchError::InvalidConfigValueError { .. }
            | BatchError::ConfigValidationError { .. }
            | BatchError::ResourceError { .. } => ErrorCategory::Configuration,
            BatchError::MissingInputFieldError { .. }
            | BatchError::EmptyInputError { .. }
            | BatchError::CsvError(_) => ErrorCategory::Input,
            BatchError::ApiError(_) => ErrorCategory::Network,
            BatchError::SmtpError(_)
            | BatchError::EmailBuildError(_)
            | BatchError::AddressError(_)
            | BatchError::RenderError { .. } => ErrorCategory::Mail,
            BatchError::IoError(_) | BatchError::PersistenceError { .. } => {
                ErrorCategory::Persistence
            }
            BatchError::SerializationError(_) | BatchError::InvalidTransition { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Mail => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
            ErrorCategory::Persistence => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BatchError::MissingInputFieldError { path, field } => {
                format!("The input file {} does not contain a '{}' column", path, field)
            }
            BatchError::EmptyInputError { path } => {
                format!("The input file {} has no CEPs to process", path)
            }
            BatchError::ResourceError { kind, path, .. } => {
                format!("Could not read the {} file at {}", kind, path)
            }
            BatchError::PersistenceError { artifact, .. } => {
                format!("Could not save the {}", artifact)
            }
            BatchError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            BatchError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file and the paths passed on the command line"
            }
            ErrorCategory::Input => {
                "Make sure the input CSV exists, has a header row and a CEP column"
            }
            ErrorCategory::Network => "Check network connectivity and the provider endpoints",
            ErrorCategory::Mail => "Check the SMTP host, sender address and credentials file",
            ErrorCategory::Persistence => {
                "Make sure the output directory exists and is writable"
            }
            ErrorCategory::Processing => "Re-run with --verbose and inspect the log file",
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_input_errors_are_high_severity() {
        let err = BatchError::MissingInputFieldError {
            path: "ceps.csv".to_string(),
            field: "CEP".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("'CEP'"));
    }

    #[test]
    fn test_persistence_errors_are_critical() {
        let err = BatchError::PersistenceError {
            artifact: "dataset".to_string(),
            message: "disk full".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.to_string(), "Failed to persist dataset: disk full");
    }
}
