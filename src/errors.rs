/*!
 * Error types for the markwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when building or sending an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors raised while reading a submission document or writing a feedback document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Plain-text file is not valid UTF-8
    #[error("Document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The DOCX container or its XML could not be read
    #[error("Malformed DOCX document: {0}")]
    MalformedDocx(String),

    /// A required part is missing from the DOCX container
    #[error("DOCX document is missing part: {0}")]
    MissingPart(String),

    /// Text holds a character XML 1.0 cannot carry
    #[error("Character U+{0:04X} cannot be written to a DOCX document")]
    InvalidXmlChar(u32),

    /// The DOCX package could not be assembled
    #[error("Failed to write DOCX document: {0}")]
    Write(String),

    /// File extension is neither .docx nor .txt
    #[error("Unsupported document format: {0} (expected .docx or .txt)")]
    UnsupportedFormat(String),

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(error: zip::result::ZipError) -> Self {
        match error {
            zip::result::ZipError::FileNotFound => Self::MissingPart("word/document.xml".to_string()),
            other => Self::MalformedDocx(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for DocumentError {
    fn from(error: quick_xml::Error) -> Self {
        Self::MalformedDocx(error.to_string())
    }
}

/// Errors raised while loading a rubric table
#[derive(Error, Debug)]
pub enum RubricError {
    /// The file could not be parsed as a table
    #[error("Failed to parse rubric: {0}")]
    Parse(String),

    /// The file has no header row
    #[error("Rubric is empty: no header row found")]
    Empty,

    /// No header matches the configured criterion column
    #[error("Rubric has no '{expected}' column (found: {found})")]
    MissingCriterionColumn {
        /// The configured column name
        expected: String,
        /// The header cells that were found, comma separated
        found: String,
    },

    /// File extension is not a known tabular format
    #[error("Unsupported rubric format: {0} (expected .csv, .xlsx, .xls, .xlsm or .ods)")]
    UnsupportedFormat(String),

    #[error("Failed to read rubric: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for RubricError {
    fn from(error: csv::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<calamine::Error> for RubricError {
    fn from(error: calamine::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

/// Errors from the feedback generator
///
/// The display text keeps the familiar `Error generating feedback: <cause>` form,
/// but a failure is always an `Err`, never a feedback string.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// The provider call failed
    #[error("Error generating feedback: {0}")]
    Provider(#[from] ProviderError),

    /// The provider answered but the completion was blank
    #[error("Error generating feedback: the model returned an empty response")]
    EmptyResponse,

    /// No credential was configured for the provider
    #[error("Error generating feedback: no API key configured for {0}")]
    MissingApiKey(String),
}

/// Errors raised by manual score adjustments
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScoreError {
    #[error("Score {0} is out of range (0-10)")]
    OutOfRange(i64),

    #[error("Unknown criterion: {0}")]
    UnknownCriterion(String),

    /// Override text is not of the form `Criterion=N`
    #[error("Invalid score override '{0}', expected Criterion=N")]
    InvalidOverride(String),
}

/// Errors raised while exporting scores or feedback
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write scores CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to build feedback document: {0}")]
    Docx(#[from] DocumentError),

    /// Nothing meaningful to export
    #[error("Feedback text is empty")]
    EmptyFeedback,

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Submission, rubric or student name not supplied
    #[error("Missing required input: {}", .0.join(", "))]
    MissingInput(Vec<&'static str>),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Rubric error: {0}")]
    Rubric(#[from] RubricError),

    /// Error from the feedback generator
    #[error("{0}")]
    Feedback(#[from] FeedbackError),

    #[error("Score error: {0}")]
    Score(#[from] ScoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Error from a provider outside of feedback generation
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
