// Error types for site scrapers and video extractors

use std::fmt;

/// Faults that abort a call outright.
///
/// Expected absences (no match, no server, ...) are not errors; those come
/// back as `Ok(None)` and are described by [`Miss`].
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Network-level failure reported by the HTTP client
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote answered with a non-2xx status
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    /// Caller supplied a URL or reference that cannot be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CSS selector failed to compile
    #[error("Failed to parse HTML: {0}")]
    Parse(String),

    /// Encrypted payload could not be reversed with the configured key
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// Missing or invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Why a lookup produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// Title matching cascade exhausted
    NoMatch,
    /// Expected server variant missing from the server list
    NoServerFound,
    /// No usable source link or stream
    NoSourceFound,
    /// Page or payload lacks the expected structure
    MalformedResponse,
}

impl Miss {
    /// Log the reason and yield the absent value.
    pub fn log<T>(self, site: &str, subject: &str) -> Option<T> {
        tracing::debug!(site, subject, reason = %self, "lookup produced no result");
        None
    }
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "no matching catalog entry"),
            Self::NoServerFound => write!(f, "expected server not listed"),
            Self::NoSourceFound => write!(f, "no source available"),
            Self::MalformedResponse => write!(f, "malformed response"),
        }
    }
}
