//! Invocation pipeline: calendar -> S3, optional repository mirror, CDN
//! invalidation.
//!
//! Stages only move forward:
//! `Init -> ConfigLoaded -> CalendarSynced -> [RepoMirrored] -> Invalidated -> Done`.
//! Any error aborts the run; objects already written stay written.

use std::fmt;

use tracing::{debug, info};

use crate::calendar::CalendarSource;
use crate::cdn::{caller_reference, CdnInvalidator};
use crate::github::RepositorySource;
use crate::mirror::mirror_repository;
use crate::models::SyncSummary;
use crate::storage::ObjectStore;
use crate::{Config, Error, Result};

/// Object key of the published calendar feed.
pub const EVENTS_KEY: &str = "events.json";

/// Progress of one invocation. `Init` covers the handler until
/// `Config` is loaded; a pipeline only ever sees the later stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    ConfigLoaded,
    CalendarSynced,
    RepoMirrored,
    Invalidated,
    Done,
}

impl Stage {
    /// Stage a `SyncPipeline` starts in, since it is built from a loaded `Config`.
    pub const ENTRY: Stage = Stage::ConfigLoaded;
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ConfigLoaded => "config_loaded",
            Stage::CalendarSynced => "calendar_synced",
            Stage::RepoMirrored => "repo_mirrored",
            Stage::Invalidated => "invalidated",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(next > *stage, "stage {} cannot follow {}", next, stage);
    debug!("Stage {} -> {}", stage, next);
    *stage = next;
}

/// One invocation's wiring of config and external services.
pub struct SyncPipeline<'a> {
    config: &'a Config,
    calendar: &'a dyn CalendarSource,
    store: &'a dyn ObjectStore,
    cdn: &'a dyn CdnInvalidator,
    repository: Option<&'a dyn RepositorySource>,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(
        config: &'a Config,
        calendar: &'a dyn CalendarSource,
        store: &'a dyn ObjectStore,
        cdn: &'a dyn CdnInvalidator,
    ) -> Self {
        Self {
            config,
            calendar,
            store,
            cdn,
            repository: None,
        }
    }

    /// Attach the repository source used when `config.repository` is set.
    pub fn with_repository(mut self, repository: &'a dyn RepositorySource) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Run every stage for the invocation identified by `request_id`.
    pub async fn run(&self, request_id: &str) -> Result<SyncSummary> {
        let mirror = match (&self.config.repository, self.repository) {
            (Some(repository), Some(source)) => Some((repository, source)),
            (Some(_), None) => {
                return Err(Error::Config(
                    "Repository configured but no repository source attached".to_string(),
                ));
            }
            (None, _) => None,
        };

        let mut stage = Stage::ENTRY;
        debug!("Stage {}", stage);

        self.sync_calendar().await?;
        advance(&mut stage, Stage::CalendarSynced);

        let github_files = match mirror {
            Some((repository, source)) => {
                info!(
                    "Syncing GitHub repo {}/{}@{}",
                    repository.owner, repository.repo, repository.branch
                );
                let report = mirror_repository(source, self.store, &repository.exclusions).await?;
                info!(
                    "Uploaded {} files to s3://{}/",
                    report.uploaded(),
                    self.config.bucket_name
                );
                advance(&mut stage, Stage::RepoMirrored);
                Some(report.uploaded())
            }
            None => None,
        };

        self.cdn.invalidate_all(&caller_reference(request_id)).await?;
        advance(&mut stage, Stage::Invalidated);

        let message = if github_files.is_some() {
            "Calendar synced, GitHub files uploaded, cache invalidated!"
        } else {
            "Calendar synced, cache invalidated!"
        };

        advance(&mut stage, Stage::Done);
        Ok(SyncSummary {
            message: message.to_string(),
            github_files: github_files.unwrap_or(0),
        })
    }

    async fn sync_calendar(&self) -> Result<()> {
        let events = self
            .calendar
            .fetch_events(&self.config.calendar_id, &self.config.api_key)
            .await?;

        let body = serde_json::to_vec(&events)?;
        self.store
            .put_object(EVENTS_KEY, body, "application/json")
            .await?;

        info!("Saved {} to s3://{}/", EVENTS_KEY, self.config.bucket_name);
        Ok(())
    }
}
