//! Error types shared by the catalog client and the release aggregator.
//!
//! Library code returns [`CatalogError`] through the crate-wide [`Result`]
//! alias. A `429` never reaches a caller as an error. It parks the request
//! in the rate-limit queue until the window closes.

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors a catalog operation can end in.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Credential endpoint rejected us, or a refreshed token was rejected again.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-2xx response that is neither a rate limit nor an auth failure.
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport failure that outlived every retry.
    #[error("Network error: {0}")]
    Network(String),

    /// Every album detail fetch of a release listing failed.
    #[error("None of the {attempted} album detail requests succeeded (last error: {last})")]
    AllDetailsFailed {
        attempted: usize,
        last: Box<CatalogError>,
    },

    /// Missing or malformed configuration input.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for errors that make every further request of a run pointless.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
