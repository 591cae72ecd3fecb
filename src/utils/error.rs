use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarmsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing column '{column}' in {source_name}")]
    SchemaError { source_name: String, column: String },

    #[error("Data processing error in {stage}: {details}")]
    ProcessingError { stage: String, details: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, CarmsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    SourceData,
    Database,
    Network,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CarmsError {
    pub fn processing(stage: &str, details: impl Into<String>) -> Self {
        CarmsError::ProcessingError {
            stage: stage.to_string(),
            details: details.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CarmsError::ConfigError { .. }
            | CarmsError::ConfigValidationError { .. }
            | CarmsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            CarmsError::SpreadsheetError(_)
            | CarmsError::CsvError(_)
            | CarmsError::SchemaError { .. } => ErrorCategory::SourceData,
            CarmsError::DatabaseError(_) => ErrorCategory::Database,
            CarmsError::ApiError(_) => ErrorCategory::Network,
            CarmsError::SerializationError(_)
            | CarmsError::ProcessingError { .. }
            | CarmsError::ValidationError { .. } => ErrorCategory::Processing,
            CarmsError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CarmsError::ApiError(_) => ErrorSeverity::Medium,
            CarmsError::DatabaseError(sqlx::Error::PoolTimedOut)
            | CarmsError::DatabaseError(sqlx::Error::Io(_)) => ErrorSeverity::Medium,
            CarmsError::DatabaseError(_) => ErrorSeverity::Critical,
            CarmsError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check carms.toml, the .env file and the DATABASE_URL / RAW_DATA_DIR environment variables"
            }
            ErrorCategory::SourceData => {
                "Make sure the discipline and program master sheets exist in the raw data directory with the expected header row"
            }
            ErrorCategory::Database => {
                "Make sure PostgreSQL is running and reachable, then run `carms init-db`"
            }
            ErrorCategory::Network => "Make sure the API is running and API_URL points at it",
            ErrorCategory::Processing => "Inspect the source rows reported in the log and re-run the load",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CarmsError::SchemaError {
                source_name,
                column,
            } => format!("{} is missing the required column '{}'", source_name, column),
            CarmsError::DatabaseError(_) => format!("The warehouse rejected the operation: {}", self),
            CarmsError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound => {
                format!("A required file was not found: {}", e)
            }
            other => other.to_string(),
        }
    }
}
