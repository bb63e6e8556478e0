/*!
 * Error types for the subweave application.
 *
 * Provider failures collapse onto a shared [`ErrorKind`] taxonomy so the
 * scheduler and the diff engine can react to them uniformly, whatever
 * back-end produced them.
 */

use std::fmt;

use thiserror::Error;

/// Provider-independent classification of a translation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credentials stored for the provider
    NoCredentials,
    /// The back-end throttled the request
    RateLimited,
    /// The account ran out of quota or balance
    QuotaExceeded,
    /// The credentials were rejected or the caller is blocked
    Forbidden,
    /// Transport-level failure or unreadable response
    RequestFailed,
    /// The back-end answered with an error code we do not map
    UnrecognizedErrorCode,
    /// The language has no entry in the provider's code table
    UnsupportedLanguage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoCredentials => "no_credentials",
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Forbidden => "forbidden",
            Self::RequestFailed => "request_failed",
            Self::UnrecognizedErrorCode => "unrecognized_error_code",
            Self::UnsupportedLanguage => "unsupported_language",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Credentials are missing from the store
    #[error("No credentials configured for {0}")]
    NoCredentials(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Account quota exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Access denied by the provider
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error code returned by the API that has no specific mapping
    #[error("API responded with error code {code}: {message}")]
    UnrecognizedErrorCode {
        /// Provider specific error code
        code: String,
        /// Error message from the API
        message: String,
    },

    /// Language not covered by the provider
    #[error("Language '{language}' is not supported by {provider}")]
    UnsupportedLanguage {
        /// Provider name
        provider: String,
        /// Internal language code
        language: String,
    },
}

impl ProviderError {
    /// Shared classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCredentials(_) => ErrorKind::NoCredentials,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::RequestFailed(_) => ErrorKind::RequestFailed,
            Self::UnrecognizedErrorCode { .. } => ErrorKind::UnrecognizedErrorCode,
            Self::UnsupportedLanguage { .. } => ErrorKind::UnsupportedLanguage,
        }
    }

    /// Whether a retry could possibly produce a different outcome
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnsupportedLanguage { .. })
    }

    /// Build an unrecognized-code error
    pub fn unrecognized(code: impl ToString, message: impl Into<String>) -> Self {
        Self::UnrecognizedErrorCode {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        Self::RequestFailed(error.to_string())
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// No registered format recognised the content
    #[error("Unable to detect subtitle format")]
    FormatDetectionFailure,

    /// A timestamp string could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Format name not known to the registry
    #[error("Unknown subtitle format: {0}")]
    UnknownFormat(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// A realigned timeline came out shorter than its reference
    #[error("Aligned timeline has {actual} segments, reference has {expected}")]
    AlignmentLengthMismatch {
        /// Length of the reference timeline
        expected: usize,
        /// Length of the aligned timeline
        actual: usize,
    },

    /// No subtitle record with that id
    #[error("Subtitles not found: {0}")]
    SubtitlesNotFound(String),

    /// Persistence collaborator failure
    #[error("Store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for TranslationError {
    fn from(error: anyhow::Error) -> Self {
        Self::Store(format!("{:#}", error))
    }
}
