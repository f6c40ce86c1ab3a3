//! Typed errors for the translation subsystem.
//!
//! None of these are fatal: the coordinator absorbs `ProviderError`, the
//! detector absorbs `DetectionInconclusive`, and the selector treats
//! `UnsupportedLanguage` as a no-op.

use std::time::Duration;
use thiserror::Error;

/// Failure talking to the external translation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, reset, etc.
    #[error("failed to reach translation provider: {0}")]
    Network(String),

    #[error("translation provider timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status without a structured error payload
    #[error("translation provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered with an `error` object
    #[error("translation provider rejected the request ({code}): {message}")]
    Rejected { code: u16, message: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("provider returned {got} translations for {expected} inputs")]
    ShortResponse { expected: usize, got: usize },
}

impl ProviderError {
    /// Whether another attempt has a chance of succeeding.
    ///
    /// Rate limits (429), server errors (5xx), network failures and timeouts
    /// are transient. Other client errors and malformed payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status { status, .. } | ProviderError::Rejected { code: status, .. } => {
                *status == 429 || *status >= 500
            }
            ProviderError::Malformed(_) | ProviderError::ShortResponse { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("unsupported language code: '{0}'")]
    UnsupportedLanguage(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("language detection was inconclusive")]
    DetectionInconclusive,
}
