use thiserror::Error;

/// Crate-wide error type for the Printful access layer.
///
/// Cache misses and staleness are deliberately NOT errors; they are normal
/// signals on the read path and are modeled by `cache::Lookup`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Printful returned HTTP status code: {status}")]
    UpstreamStatus { status: u16 },

    #[error("Printful kept throttling: gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Unable to parse rate limit header: {0}")]
    RateLimitHeader(String),

    #[error("Printful returned an error: code {code}")]
    UpstreamCode { code: i64 },

    #[error("Unable to decode Printful response: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ProxyResult<T> = Result<T, ProxyError>;
