use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Source '{source_name}' produced no candidates: {message}")]
    SourceError { source_name: String, message: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// Which part of a run a terminal failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Store,
    Processing,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_)
            | EtlError::CsvError(_)
            | EtlError::IoError(_)
            | EtlError::SourceError { .. } => ErrorCategory::Source,
            EtlError::DatabaseError(_) | EtlError::StoreUnavailable { .. } => ErrorCategory::Store,
            EtlError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    /// Process exit code for a terminal failure. A completed run always exits 0.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Source => 2,
            ErrorCategory::Store => 3,
            ErrorCategory::Processing => 4,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line flags or the TOML configuration file"
            }
            ErrorCategory::Source => {
                "Verify the source URL is reachable or the CSV file exists and is readable"
            }
            ErrorCategory::Store => {
                "Verify the database path is writable and existing rows do not violate the dedup key"
            }
            ErrorCategory::Processing => "Re-run with --verbose and inspect the log output",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
