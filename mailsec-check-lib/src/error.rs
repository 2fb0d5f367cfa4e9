//! Error handling for lookup and report operations.
//!
//! This module defines one error type covering every way a check cycle can
//! fail, from blank input through transport problems to malformed payloads.

use std::fmt;

/// Main error type for mailsec-check operations.
#[derive(Debug, Clone)]
pub enum MailsecError {
    /// User input rejected before any network activity
    InvalidInput { input: String, reason: String },

    /// Network-related errors (connection refused, DNS failure, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The lookup service answered with a non-success status
    HttpStatus { url: String, status_code: u16 },

    /// Timeout errors when the lookup takes too long
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Response body was not valid JSON
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Payload was JSON but did not have the expected shape
    BuildError { key: Option<String>, message: String },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading config or writing exports
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

/// Coarse classification of a [`MailsecError`].
///
/// The controller only distinguishes validation failures from everything
/// else, but logs and exit codes use the finer categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Transport,
    Build,
    Configuration,
    Internal,
}

impl MailsecError {
    /// Create a new invalid input error.
    pub fn invalid_input<I: Into<String>, R: Into<String>>(input: I, reason: R) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new HTTP status error.
    pub fn http_status<U: Into<String>>(url: U, status_code: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status_code,
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new build error that is not tied to a payload key.
    pub fn build<M: Into<String>>(message: M) -> Self {
        Self::BuildError {
            key: None,
            message: message.into(),
        }
    }

    /// Create a new build error for a specific payload key.
    pub fn build_at<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::BuildError {
            key: Some(key.into()),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::NetworkError { .. }
            | Self::HttpStatus { .. }
            | Self::Timeout { .. }
            | Self::ParseError { .. } => ErrorCategory::Transport,
            Self::BuildError { .. } => ErrorCategory::Build,
            Self::ConfigError { .. } | Self::FileError { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for MailsecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { input, reason } => {
                write!(f, "Invalid input '{}': {}", input, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::HttpStatus { url, status_code } => {
                write!(f, "Lookup service returned HTTP {} for {}", status_code, url)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ParseError { message, .. } => {
                write!(f, "Parse error: {}", message)
            }
            Self::BuildError { key, message } => match key {
                Some(key) => write!(f, "Malformed payload at '{}': {}", key, message),
                None => write!(f, "Malformed payload: {}", message),
            },
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for MailsecError {}

impl From<reqwest::Error> for MailsecError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Lookup request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::ParseError {
                message: format!("Response body is not valid JSON: {}", err),
                content: None,
            }
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for MailsecError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for MailsecError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<csv::Error> for MailsecError {
    fn from(err: csv::Error) -> Self {
        Self::Internal {
            message: format!("CSV error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            MailsecError::invalid_input("", "empty").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            MailsecError::http_status("http://x/api/lookup", 502).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            MailsecError::build_at("WHOIS", "expected an object").category(),
            ErrorCategory::Build
        );
        assert_eq!(
            MailsecError::config("bad").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_build_error_display_names_key() {
        let err = MailsecError::build_at("SPF", "missing 'status'");
        assert_eq!(err.to_string(), "Malformed payload at 'SPF': missing 'status'");

        let err = MailsecError::build("top-level payload must be an object");
        assert_eq!(
            err.to_string(),
            "Malformed payload: top-level payload must be an object"
        );
    }

    #[test]
    fn test_json_error_converts_to_parse_error() {
        let err: MailsecError = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert!(matches!(err, MailsecError::ParseError { .. }));
        assert_eq!(err.category(), ErrorCategory::Transport);
    }
}
