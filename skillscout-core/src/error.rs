//! Error taxonomy for marketplace operations.
//!
//! Network and parse failures are converted into these structured variants
//! at the lowest applicable layer; nothing above the HTTP wrapper observes
//! a raw transport error.

use thiserror::Error;

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// Transport-level failure before a usable response arrived.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Every candidate manifest location for an input URL was exhausted.
    #[error("no marketplace document could be resolved for {input}")]
    Unresolved { input: String },

    /// The resolved document was not valid JSON.
    #[error("invalid JSON in marketplace document {url}: {source}")]
    InvalidDocument {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
