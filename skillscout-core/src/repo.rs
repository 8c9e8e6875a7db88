//! Repository host classification and context derivation.
//!
//! Every decision about whether a URL belongs to a recognized repository
//! host lives here, so the resolver, the content walker, and the HTTP
//! wrapper cannot drift apart on it.

use url::Url;

/// Hosts that receive bearer credentials.
pub const REPO_HOSTS: &[&str] = &[
    "github.com",
    "raw.githubusercontent.com",
    "api.github.com",
    "gist.githubusercontent.com",
];

/// Raw-content host used when rewriting repository URLs.
pub const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";

/// Returns true when the URL targets a recognized repository host.
pub fn is_repo_host_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| REPO_HOSTS.contains(&host)))
        .unwrap_or(false)
}

/// Classification of a user-supplied repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoUrlKind {
    /// `https://github.com/{owner}/{repo}`, extra non-blob segments
    /// tolerated.
    Slug { owner: String, repo: String },
    /// `https://github.com/{owner}/{repo}/blob/{branch}/{path}`.
    Blob {
        owner: String,
        repo: String,
        branch: String,
        path: String,
    },
    /// Not a recognized repository URL.
    Other,
}

/// Classify a parsed URL against the known repository-host patterns.
pub fn classify_repo_url(url: &Url) -> RepoUrlKind {
    if url.host_str() != Some("github.com") {
        return RepoUrlKind::Other;
    }
    let segments: Vec<&str> = match url.path_segments() {
        Some(segments) => segments.filter(|segment| !segment.is_empty()).collect(),
        None => return RepoUrlKind::Other,
    };
    if segments.len() < 2 {
        return RepoUrlKind::Other;
    }
    let owner = segments[0].to_string();
    let repo = segments[1].to_string();
    if segments.len() >= 5 && segments[2] == "blob" {
        return RepoUrlKind::Blob {
            owner,
            repo,
            branch: segments[3].to_string(),
            path: segments[4..].join("/"),
        };
    }
    RepoUrlKind::Slug { owner, repo }
}

/// Repository context derived from a resolved manifest URL.
///
/// Derived once per marketplace and never persisted. Absence of a context
/// (a manifest not hosted on the raw-content host) disables hydration and
/// auto-discovery for that marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Base for fetchable file content, `{base}/{path}`.
    pub raw_base_url: String,
    /// Base for human-browsable links, `{base}/{path}`.
    pub blob_base_url: String,
    /// Base for directory listings, `{base}/{path}?ref={branch}`.
    pub api_base_url: String,
}

impl RepoContext {
    /// Parse a raw-content manifest URL
    /// (`https://raw.githubusercontent.com/{owner}/{repo}/{branch}/...`)
    /// into a context. Any other shape yields `None`.
    pub fn from_document_url(document_url: &str) -> Option<Self> {
        let url = Url::parse(document_url).ok()?;
        if url.host_str() != Some(RAW_CONTENT_HOST) {
            return None;
        }
        let segments: Vec<&str> = url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.len() < 3 {
            return None;
        }
        let (owner, repo, branch) = (segments[0], segments[1], segments[2]);
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            raw_base_url: format!("https://{RAW_CONTENT_HOST}/{owner}/{repo}/{branch}"),
            blob_base_url: format!("https://github.com/{owner}/{repo}/blob/{branch}"),
            api_base_url: format!("https://api.github.com/repos/{owner}/{repo}/contents"),
        })
    }

    /// Fetchable raw-content URL for a repository-relative path.
    pub fn raw_url(&self, rel: &str) -> String {
        format!("{}/{}", self.raw_base_url, normalize_rel(rel))
    }

    /// Human-browsable URL for a repository-relative path.
    pub fn blob_url(&self, rel: &str) -> String {
        format!("{}/{}", self.blob_base_url, normalize_rel(rel))
    }

    /// Directory-listing URL for a repository-relative path.
    pub fn contents_url(&self, rel: &str) -> String {
        format!(
            "{}/{}?ref={}",
            self.api_base_url,
            normalize_rel(rel),
            self.branch
        )
    }
}

/// Join a relative path onto a base directory, normalizing `./` prefixes
/// and separators.
pub fn join_rel(base: &str, rel: &str) -> String {
    let base = normalize_rel(base);
    let rel = normalize_rel(rel);
    if base.is_empty() {
        rel
    } else if rel.is_empty() {
        base
    } else {
        format!("{base}/{rel}")
    }
}

fn normalize_rel(path: &str) -> String {
    let mut path = path.trim();
    loop {
        let stripped = path
            .trim_start_matches('/')
            .trim_end_matches('/');
        let stripped = stripped.strip_prefix("./").unwrap_or(stripped);
        if stripped == path {
            break;
        }
        path = stripped;
    }
    if path == "." { String::new() } else { path.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_repository_slug() {
        let url = Url::parse("https://github.com/acme/skills").unwrap();
        assert_eq!(
            classify_repo_url(&url),
            RepoUrlKind::Slug {
                owner: "acme".into(),
                repo: "skills".into()
            }
        );
    }

    #[test]
    fn classifies_blob_reference() {
        let url =
            Url::parse("https://github.com/acme/skills/blob/main/market/marketplace.json").unwrap();
        assert_eq!(
            classify_repo_url(&url),
            RepoUrlKind::Blob {
                owner: "acme".into(),
                repo: "skills".into(),
                branch: "main".into(),
                path: "market/marketplace.json".into(),
            }
        );
    }

    #[test]
    fn tree_urls_fall_back_to_slug() {
        let url = Url::parse("https://github.com/acme/skills/tree/main").unwrap();
        assert!(matches!(classify_repo_url(&url), RepoUrlKind::Slug { .. }));
    }

    #[test]
    fn non_github_hosts_are_other() {
        let url = Url::parse("https://example.com/acme/skills").unwrap();
        assert_eq!(classify_repo_url(&url), RepoUrlKind::Other);
    }

    #[test]
    fn context_from_raw_document_url() {
        let ctx = RepoContext::from_document_url(
            "https://raw.githubusercontent.com/acme/skills/main/.claude-plugin/marketplace.json",
        )
        .unwrap();
        assert_eq!(ctx.owner, "acme");
        assert_eq!(ctx.branch, "main");
        assert_eq!(
            ctx.raw_url("foo/SKILL.md"),
            "https://raw.githubusercontent.com/acme/skills/main/foo/SKILL.md"
        );
        assert_eq!(
            ctx.blob_url("./foo"),
            "https://github.com/acme/skills/blob/main/foo"
        );
        assert_eq!(
            ctx.contents_url("skills"),
            "https://api.github.com/repos/acme/skills/contents/skills?ref=main"
        );
    }

    #[test]
    fn non_raw_hosts_yield_no_context() {
        assert!(RepoContext::from_document_url("https://example.com/m.json").is_none());
        assert!(RepoContext::from_document_url("not a url").is_none());
    }

    #[test]
    fn join_rel_normalizes_dot_segments() {
        assert_eq!(join_rel("./", "skills"), "skills");
        assert_eq!(join_rel("plugins/a", "./skills"), "plugins/a/skills");
        assert_eq!(join_rel("", "./foo/"), "foo");
        assert_eq!(join_rel(".", ""), "");
    }
}
