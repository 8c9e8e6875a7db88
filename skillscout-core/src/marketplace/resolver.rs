//! Marketplace document URL resolution.
//!
//! Turns a loosely-specified input URL into an ordered list of concrete
//! manifest candidates, then probes them strictly in order until one
//! answers 2xx. Failed candidates become warnings, never errors; only
//! exhausting every candidate is terminal.

use tracing::debug;
use url::Url;

use crate::error::MarketplaceError;
use crate::http::AuthenticatedClient;
use crate::repo::{RAW_CONTENT_HOST, RepoUrlKind, classify_repo_url};

/// Filename every manifest location convention ends in.
pub const MANIFEST_FILENAME: &str = "marketplace.json";

/// Manifest location conventions, in probe order.
pub const MANIFEST_PATHS: &[&str] = &[
    ".claude-plugin/marketplace.json",
    ".github/plugin/marketplace.json",
];

/// Default branches probed for repository slugs.
pub const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

/// Successful resolution of one marketplace input URL.
#[derive(Debug)]
pub struct ResolvedDocument {
    pub document_url: String,
    pub body: String,
    pub etag: Option<String>,
    /// One warning per candidate that failed before this one succeeded.
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub enum ResolveOutcome {
    Resolved(ResolvedDocument),
    Failed {
        warnings: Vec<String>,
        error: MarketplaceError,
    },
}

/// Candidate manifest URLs for a loosely-specified input, in probe order.
///
/// - non-http(s) schemes and unparseable inputs are probed literally;
/// - repository blob URLs rewrite to the equivalent raw-content URL;
/// - repository slugs cross the two location conventions with the two
///   default branches;
/// - any other http(s) URL is probed literally, with the two conventions
///   appended relative to it when the path names a directory.
pub fn candidate_urls(input: &str) -> Vec<String> {
    let Ok(url) = Url::parse(input) else {
        return vec![input.to_string()];
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return vec![input.to_string()];
    }
    match classify_repo_url(&url) {
        RepoUrlKind::Blob {
            owner,
            repo,
            branch,
            path,
        } => vec![format!(
            "https://{RAW_CONTENT_HOST}/{owner}/{repo}/{branch}/{path}"
        )],
        RepoUrlKind::Slug { owner, repo } => {
            let mut candidates = Vec::with_capacity(4);
            for manifest_path in MANIFEST_PATHS {
                for branch in DEFAULT_BRANCHES {
                    candidates.push(format!(
                        "https://{RAW_CONTENT_HOST}/{owner}/{repo}/{branch}/{manifest_path}"
                    ));
                }
            }
            candidates
        }
        RepoUrlKind::Other => {
            let mut candidates = vec![input.to_string()];
            if path_names_directory(&url) {
                let base = input.trim_end_matches('/');
                for manifest_path in MANIFEST_PATHS {
                    candidates.push(format!("{base}/{manifest_path}"));
                }
            }
            candidates
        }
    }
}

/// A path with no file extension that doesn't already end in the manifest
/// filename is treated as a directory worth deriving candidates under.
fn path_names_directory(url: &Url) -> bool {
    let last = url
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).next_back())
        .unwrap_or("");
    !last.contains('.') && !url.path().ends_with(MANIFEST_FILENAME)
}

/// Probe candidates strictly in order via authenticated GET; the first 2xx
/// response wins and resolution stops.
pub async fn resolve_marketplace_document(
    http: &AuthenticatedClient,
    input: &str,
) -> ResolveOutcome {
    let mut warnings = Vec::new();
    for candidate in candidate_urls(input) {
        match http.get_text(&candidate).await {
            Ok(fetched) => {
                debug!(%input, %candidate, "resolved marketplace document");
                return ResolveOutcome::Resolved(ResolvedDocument {
                    document_url: candidate,
                    body: fetched.body,
                    etag: fetched.etag,
                    warnings,
                });
            }
            Err(err) => warnings.push(err.to_string()),
        }
    }
    ResolveOutcome::Failed {
        warnings,
        error: MarketplaceError::Unresolved {
            input: input.to_string(),
        },
    }
}
