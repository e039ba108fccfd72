use thiserror::Error;

/// Failure of a logical request after the retry policy is exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("request to {url} failed after {attempts} attempt(s): {message}")]
    Transport {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("{url} returned HTTP {status} after {attempts} attempt(s)")]
    Status {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid request for {url}: {message}")]
    Request { url: String, message: String },
}

/// Coarse classification of a `FetchError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Transport,
    Status,
    Decode,
    Request,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::Transport { .. } => FetchErrorKind::Transport,
            Self::Status { .. } => FetchErrorKind::Status,
            Self::Decode { .. } => FetchErrorKind::Decode,
            Self::Request { .. } => FetchErrorKind::Request,
        }
    }

    /// Number of attempts made before giving up
    ///
    /// Decode and request errors are never retried.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. }
            | Self::Transport { attempts, .. }
            | Self::Status { attempts, .. } => *attempts,
            Self::Decode { .. } | Self::Request { .. } => 1,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Decode { url, .. }
            | Self::Request { url, .. } => url,
        }
    }
}
