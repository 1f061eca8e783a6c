//! CloudFront cache invalidation.

use async_trait::async_trait;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client as CloudFrontClient;
use tracing::info;

use crate::{Error, Result};

/// Path pattern covering every object behind the distribution.
pub const ALL_PATHS: &str = "/*";

/// Caller reference for an invocation, unique per Lambda request id.
pub fn caller_reference(request_id: &str) -> String {
    format!("invalidate-{}", request_id)
}

/// CDN whose caches can be flushed.
#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    /// Invalidate all paths. Returns the provider's invalidation id when it
    /// reports one.
    async fn invalidate_all(&self, caller_reference: &str) -> Result<Option<String>>;
}

/// CloudFront distribution invalidator.
pub struct CloudFrontInvalidator {
    client: CloudFrontClient,
    distribution_id: String,
}

impl CloudFrontInvalidator {
    pub fn new(client: CloudFrontClient, distribution_id: impl Into<String>) -> Self {
        Self {
            client,
            distribution_id: distribution_id.into(),
        }
    }
}

#[async_trait]
impl CdnInvalidator for CloudFrontInvalidator {
    async fn invalidate_all(&self, caller_reference: &str) -> Result<Option<String>> {
        let paths = Paths::builder()
            .quantity(1)
            .items(ALL_PATHS)
            .build()
            .map_err(|e| Error::Invalidation(format!("Invalid paths: {}", e)))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|e| Error::Invalidation(format!("Invalid invalidation batch: {}", e)))?;

        let response = self
            .client
            .create_invalidation()
            .distribution_id(&self.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| {
                Error::Invalidation(format!(
                    "CreateInvalidation on {} failed: {}",
                    self.distribution_id,
                    e.into_service_error()
                ))
            })?;

        let invalidation_id = response.invalidation().map(|inv| inv.id().to_string());

        info!(
            "Invalidation {} created for distribution {}",
            invalidation_id.as_deref().unwrap_or("(unknown)"),
            self.distribution_id
        );

        Ok(invalidation_id)
    }
}
