//! Session acquisition for authenticated repository access.
//!
//! Token acquisition itself is delegated to the host environment; this
//! module only defines the collaborator boundary and the non-interactive
//! providers the CLI ships with.

use async_trait::async_trait;

/// A bearer credential obtained from the host environment.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub account_label: String,
}

/// External collaborator that produces sessions.
///
/// Implementations must be safe to call speculatively on every request:
/// with `interactive` set to false they never prompt, and any retrieval
/// failure collapses to `None` so requests degrade to unauthenticated.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, interactive: bool) -> Option<Session>;
}

/// Reads a token from `GITHUB_TOKEN` or `GH_TOKEN`.
#[derive(Debug, Default)]
pub struct EnvSessionProvider;

#[async_trait]
impl SessionProvider for EnvSessionProvider {
    async fn get_session(&self, _interactive: bool) -> Option<Session> {
        let token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok()?;
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Session {
            access_token: token.to_string(),
            account_label: "environment".to_string(),
        })
    }
}

/// Provider that never yields a session. Used for anonymous access and in
/// tests.
#[derive(Debug, Default)]
pub struct NoSessionProvider;

#[async_trait]
impl SessionProvider for NoSessionProvider {
    async fn get_session(&self, _interactive: bool) -> Option<Session> {
        None
    }
}
