//! Site Sync Lambda - Publishes the calendar feed and site files.
//!
//! This Lambda runs on a schedule (EventBridge) and:
//! 1. Fetches Google Calendar events and saves them to S3 as `events.json`
//! 2. Mirrors the configured GitHub branch into the same bucket (optional)
//! 3. Invalidates the CloudFront distribution so clients see the update

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{
    CloudFrontInvalidator, Config, GitHubSource, GoogleCalendarClient, InvocationResponse,
    S3ObjectStore, SyncPipeline,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Clients reused across warm invocations
struct AppState {
    s3_client: aws_sdk_s3::Client,
    cloudfront_client: aws_sdk_cloudfront::Client,
    http_client: reqwest::Client,
}

impl AppState {
    async fn new() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        Self {
            s3_client: aws_sdk_s3::Client::new(&config),
            cloudfront_client: aws_sdk_cloudfront::Client::new(&config),
            http_client: reqwest::Client::new(),
        }
    }
}

async fn handler(
    state: Arc<AppState>,
    event: LambdaEvent<serde_json::Value>,
) -> Result<InvocationResponse, Error> {
    let request_id = event.context.request_id;
    info!("Starting site sync for request {}", request_id);

    // Read per invocation so configuration changes apply without a cold start.
    let config = Config::from_env()?;

    let calendar =
        GoogleCalendarClient::new(state.http_client.clone(), &config.endpoints.calendar_api);
    let store = S3ObjectStore::new(state.s3_client.clone(), &config.bucket_name);
    let cdn = CloudFrontInvalidator::new(state.cloudfront_client.clone(), &config.distribution_id);
    let github = config
        .repository
        .as_ref()
        .map(|repository| {
            GitHubSource::new(
                state.http_client.clone(),
                &config.endpoints.github_api,
                &config.endpoints.github_raw,
                repository,
            )
        })
        .transpose()?;

    let mut pipeline = SyncPipeline::new(&config, &calendar, &store, &cdn);
    if let Some(github) = &github {
        pipeline = pipeline.with_repository(github);
    }

    let summary = match pipeline.run(&request_id).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Site sync failed for s3://{}: {}", store.bucket(), e);
            return Err(e.into());
        }
    };

    info!(
        "Site sync complete: {} GitHub files, {}",
        summary.github_files, summary.message
    );

    Ok(summary.into_response()?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}
