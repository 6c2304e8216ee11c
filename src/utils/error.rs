use thiserror::Error;

#[derive(Error, Debug)]
pub enum WranglerError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table in {path}: {source}")]
    MalformedTable {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed workbook {path}: {source}")]
    MalformedWorkbook {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Duplicate column '{column}' in {path}")]
    DuplicateColumn { path: String, column: String },

    #[error("Unsupported table format '{extension}' for {path}")]
    UnsupportedFormat { path: String, extension: String },

    #[error("Missing column '{column}' in {context}")]
    MissingColumn { column: String, context: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a failed run. Never zero.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl WranglerError {
    pub fn missing_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. } | Self::FileRead { .. } | Self::UnsupportedFormat { .. } => {
                ErrorCategory::Input
            }
            Self::MalformedTable { .. }
            | Self::MalformedWorkbook { .. }
            | Self::DuplicateColumn { .. }
            | Self::MissingColumn { .. }
            | Self::ProcessingError { .. }
            | Self::CsvError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Data | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("Check that the period folder and file name are correct: {}", path)
            }
            Self::FileRead { path, .. } => format!("Check read permissions on {}", path),
            Self::MalformedTable { path, .. } => format!(
                "Make sure {} has a header row and every row has the same number of fields",
                path
            ),
            Self::MalformedWorkbook { path, .. } => {
                format!("Open {} in a spreadsheet program and save it again as .xlsx", path)
            }
            Self::DuplicateColumn { column, .. } => {
                format!("Rename one of the '{}' columns so every header is unique", column)
            }
            Self::UnsupportedFormat { .. } => {
                "Save the export as .xlsx, .xls, .csv or tab-separated .tsv".to_string()
            }
            Self::MissingColumn { column, .. } => format!(
                "Add '{}' to the export or adjust the column mapping in the configuration",
                column
            ),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Review the TOML configuration file and command-line overrides".to_string()
            }
            Self::ProcessingError { .. } => {
                "Inspect the input rows reported in the log".to_string()
            }
            Self::CsvError(_) => "Check the delimiter and quoting of the input file".to_string(),
            Self::IoError(_) | Self::SerializationError(_) => {
                "Check disk space and permissions of the output location".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not load input: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, WranglerError>;
