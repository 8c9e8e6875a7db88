//! Authenticated HTTP fetch wrapper.
//!
//! The single chokepoint through which every remote GET in the system
//! passes. Bearer credentials are attached only for recognized repository
//! hosts, and only when the session provider yields a session without
//! prompting; everything else goes out unauthenticated.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, header};
use tracing::{debug, trace};

use crate::auth::SessionProvider;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::repo::is_repo_host_url;

/// Default per-request timeout applied to every outbound call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A 2xx text response body plus its validator, if the server sent one.
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub body: String,
    pub etag: Option<String>,
}

pub struct AuthenticatedClient {
    client: Client,
    sessions: Arc<dyn SessionProvider>,
}

impl AuthenticatedClient {
    pub fn new(sessions: Arc<dyn SessionProvider>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skillscout/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, sessions })
    }

    /// Issue a GET. Session retrieval is always non-interactive and a
    /// missing session degrades to an unauthenticated request.
    pub async fn get(&self, url: &str) -> MarketplaceResult<Response> {
        let mut request = self.client.get(url);
        if is_repo_host_url(url) {
            if let Some(session) = self.sessions.get_session(false).await {
                trace!(account = %session.account_label, %url, "attaching bearer credential");
                request = request.bearer_auth(&session.access_token);
            }
        }
        request
            .send()
            .await
            .map_err(|source| MarketplaceError::Request {
                url: url.to_string(),
                source,
            })
    }

    /// GET expecting a 2xx text body.
    pub async fn get_text(&self, url: &str) -> MarketplaceResult<FetchedText> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%url, %status, "non-success response");
            return Err(MarketplaceError::Status {
                url: url.to_string(),
                status,
            });
        }
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|source| MarketplaceError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(FetchedText { body, etag })
    }
}
