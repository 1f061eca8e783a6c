//! GitHub repository access: recursive tree listing and raw file downloads.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::config::RepositoryConfig;
use crate::{Error, Result};

const SYNC_USER_AGENT: &str = "lambda-github-sync";

/// Kind of entry in a git tree listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// Git trees API response.
#[derive(Debug, Default, Deserialize)]
pub struct TreeListing {
    #[serde(rename = "tree", default)]
    pub entries: Vec<TreeEntry>,
    /// Set by GitHub when the tree exceeded its listing limit
    #[serde(default)]
    pub truncated: bool,
}

/// Source of repository files to mirror.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// List every entry of the branch, recursively.
    async fn list_tree(&self) -> Result<TreeListing>;

    /// Download the raw bytes of one file.
    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>>;
}

/// GitHub REST + raw content client for a single owner/repo/branch.
pub struct GitHubSource {
    http_client: reqwest::Client,
    api_base: String,
    raw_base: String,
    owner: String,
    repo: String,
    branch: String,
    headers: HeaderMap,
}

impl GitHubSource {
    pub fn new(
        http_client: reqwest::Client,
        api_base: &str,
        raw_base: &str,
        repository: &RepositoryConfig,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SYNC_USER_AGENT));

        if let Some(token) = &repository.token {
            let mut value = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|_| Error::Config("GITHUB_TOKEN is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            http_client,
            api_base: api_base.to_string(),
            raw_base: raw_base.to_string(),
            owner: repository.owner.clone(),
            repo: repository.repo.clone(),
            branch: repository.branch.clone(),
            headers,
        })
    }

    /// Recursive tree URL for the configured branch.
    pub fn tree_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base,
            self.owner,
            self.repo,
            urlencoding::encode(&self.branch)
        )
    }

    /// Raw content URL for a repository path.
    pub fn raw_url(&self, path: &str) -> String {
        let encoded_path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base, self.owner, self.repo, self.branch, encoded_path
        )
    }
}

#[async_trait]
impl RepositorySource for GitHubSource {
    async fn list_tree(&self) -> Result<TreeListing> {
        debug!("Listing tree for {}/{}@{}", self.owner, self.repo, self.branch);

        let response = self
            .http_client
            .get(self.tree_url())
            .headers(self.headers.clone())
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| Error::RepositoryList(format!("Tree request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::RepositoryList(format!(
                "GitHub API returned {}: {}",
                status, error_text
            )));
        }

        response
            .json::<TreeListing>()
            .await
            .map_err(|e| Error::RepositoryList(format!("Failed to parse tree response: {}", e)))
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(self.raw_url(path))
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| Error::RepositoryFileFetch(format!("{}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RepositoryFileFetch(format!("{}: HTTP {}", path, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::RepositoryFileFetch(format!("{}: {}", path, e)))?;

        Ok(bytes.to_vec())
    }
}
