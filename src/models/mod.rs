pub mod operations;

pub use operations::*;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: None,
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: None,
            details: Some(details.into()),
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub operations: OperationSet,
    pub canonical: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantResponse {
    pub file_name: String,
    pub canonical: String,
    pub etag: String,
}

/// Nested `model -> version -> operations` description of image versions.
pub type ImageVersions = IndexMap<String, IndexMap<String, OperationSet>>;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VersionHashesRequest {
    #[validate(range(min = 1, max = 32))]
    pub hash_length: Option<usize>,
    pub versions: ImageVersions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionHashesResponse {
    pub hashes: IndexMap<String, IndexMap<String, String>>,
}
