//! Configuration management for the site sync Lambda.

use std::env;

use crate::mirror::ExclusionSet;
use crate::{Error, Result};

/// Exclusions applied when `EXCLUDE_PATTERNS` is not set.
pub const DEFAULT_EXCLUDE_PATTERNS: &str = "lambda/*,.github/*";

/// Branch mirrored when `GITHUB_BRANCH` is not set.
pub const DEFAULT_BRANCH: &str = "main";

pub const DEFAULT_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// S3 bucket that receives `events.json` and mirrored files
    pub bucket_name: String,
    /// CloudFront distribution in front of the bucket
    pub distribution_id: String,
    /// Google Calendar id
    pub calendar_id: String,
    /// Google API key
    pub api_key: String,
    /// Repository to mirror (only when owner and repo are both set)
    pub repository: Option<RepositoryConfig>,
    /// Upstream API base URLs
    pub endpoints: Endpoints,
}

/// GitHub repository mirrored into the bucket.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Token for private repositories
    pub token: Option<String>,
    pub exclusions: ExclusionSet,
}

/// Base URLs for the upstream HTTP APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub calendar_api: String,
    pub github_api: String,
    pub github_raw: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            calendar_api: DEFAULT_CALENDAR_API_URL.to_string(),
            github_api: DEFAULT_GITHUB_API_URL.to_string(),
            github_raw: DEFAULT_GITHUB_RAW_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary name-to-value lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| Error::Config(format!("{} not set", name)))
        };

        let bucket_name = required("BUCKET_NAME")?;
        let distribution_id = required("CLOUDFRONT_DISTRIBUTION_ID")?;
        let calendar_id = required("CALENDAR_ID")?;
        let api_key = required("GOOGLE_API_KEY")?;

        let repository = match (var("GITHUB_OWNER"), var("GITHUB_REPO")) {
            (Some(owner), Some(repo)) => {
                let patterns = var("EXCLUDE_PATTERNS")
                    .unwrap_or_else(|| DEFAULT_EXCLUDE_PATTERNS.to_string());

                Some(RepositoryConfig {
                    owner,
                    repo,
                    branch: var("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                    token: var("GITHUB_TOKEN"),
                    exclusions: ExclusionSet::parse(&patterns),
                })
            }
            _ => None,
        };

        let endpoint = |name: &str, default: &str| {
            var(name)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            bucket_name,
            distribution_id,
            calendar_id,
            api_key,
            repository,
            endpoints: Endpoints {
                calendar_api: endpoint("CALENDAR_API_URL", DEFAULT_CALENDAR_API_URL),
                github_api: endpoint("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
                github_raw: endpoint("GITHUB_RAW_URL", DEFAULT_GITHUB_RAW_URL),
            },
        })
    }
}
