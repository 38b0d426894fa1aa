use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("geocoding request timed out after {0:?}")]
    Timeout(Duration),

    #[error("geocoding provider is rate limiting requests")]
    RateLimited { retry_after: Option<Duration> },

    #[error("geocoding provider error: {0}")]
    Provider(String),

    #[error("geocoding provider returned no usable place fields")]
    EmptyPlacemark,

    #[cfg(feature = "nominatim")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("organize run was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
