//! Invocation result models.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Outcome of one successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub message: String,
    /// Files mirrored from GitHub; 0 when mirroring is not configured
    pub github_files: usize,
}

/// Lambda return value, shaped like an API Gateway proxy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded [`SyncSummary`]
    pub body: String,
}

impl SyncSummary {
    pub fn into_response(self) -> Result<InvocationResponse> {
        Ok(InvocationResponse {
            status_code: 200,
            body: serde_json::to_string(&self)?,
        })
    }
}
