//! Error types for market-steward.

use thiserror::Error;

/// Main error type for market-steward operations.
#[derive(Error, Debug)]
pub enum StewardError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Template resource not found: {0}")]
    MissingTemplate(String),

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] tera::Error),

    // Descriptor errors
    #[error("Invalid descriptor {path}: {reason}")]
    InvalidDescriptor { path: String, reason: String },

    // Forge/Git errors
    #[error("Forge operation failed: {0}")]
    ForgeError(String),

    #[error("Invalid repository reference: {0}")]
    InvalidRepo(String),

    #[error("Git URL parse error: {0}")]
    GitUrlError(#[from] git_url_parse::GitUrlParseError),

    #[error("Git operation failed: {0}")]
    GitError(#[from] git2::Error),

    // Network/API errors
    #[error("Network request failed: {0}")]
    NetworkError(String),

    #[error("API authentication failed: {0}")]
    AuthenticationError(String),

    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    // Parsing errors
    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using StewardError
pub type Result<T> = std::result::Result<T, StewardError>;

impl StewardError {
    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::ForgeError(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid descriptor error for the file at `path`
    pub fn invalid_descriptor(
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDescriptor {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Errors that indicate a broken installation rather than bad data. These
    /// abort the run instead of being logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingTemplate(_)
                | Self::TemplateError(_)
                | Self::InvalidConfig(_)
        )
    }
}

// Implement From for std::io::Error - wraps in Other variant for generic I/O errors
impl From<std::io::Error> for StewardError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

// Implement From for reqwest errors (network/API)
impl From<reqwest::Error> for StewardError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => Self::AuthenticationError(err.to_string()),
                429 => Self::RateLimitExceeded,
                _ => Self::NetworkError(err.to_string()),
            }
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

// Implement From for octocrab errors (GitHub API)
impl From<octocrab::Error> for StewardError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. }
                if source.message.contains("rate limit") =>
            {
                Self::RateLimitExceeded
            }
            _ => Self::ForgeError(format!("GitHub API error: {}", err)),
        }
    }
}
