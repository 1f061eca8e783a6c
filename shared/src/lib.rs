//! Shared library for the site sync Lambda.
//!
//! Publishes a Google Calendar feed and an optional GitHub branch to S3,
//! then invalidates the CloudFront distribution in front of the bucket.

pub mod calendar;
pub mod cdn;
pub mod config;
pub mod error;
pub mod github;
pub mod mirror;
pub mod models;
pub mod pipeline;
pub mod storage;

#[cfg(test)]
mod mock;

pub use calendar::{CalendarSource, GoogleCalendarClient};
pub use cdn::{CdnInvalidator, CloudFrontInvalidator};
pub use config::{Config, RepositoryConfig};
pub use error::{Error, Result};
pub use github::{GitHubSource, RepositorySource};
pub use mirror::{content_type_for, ExclusionSet, FileOutcome, MirrorReport};
pub use models::{InvocationResponse, SyncSummary};
pub use pipeline::SyncPipeline;
pub use storage::{ObjectStore, S3ObjectStore};
