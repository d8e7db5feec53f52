//! Remote port definitions for the IRIDA uploader
//!
//! These traits are the only way the uploader talks to IRIDA:
//! - `RemoteState`: project/sample existence and sample creation (validation)
//! - `RemoteUpload`: sequencing run lifecycle and file transfer (upload)
//! - `RemoteProject`: standalone project creation
//!
//! All traits are async and backend-agnostic. `IridaClient` implements them
//! over HTTP; in-memory fakes for testing live in the `fakes` module.

use async_trait::async_trait;
use irida_model::{Project, RunMetadata, Sample, SequenceFile};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Result type for remote operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Identifier IRIDA assigns to a sequencing run upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub String);

impl UploadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UploadId {
    fn from(s: &str) -> Self {
        UploadId(s.to_string())
    }
}

impl From<u64> for UploadId {
    fn from(n: u64) -> Self {
        UploadId(n.to_string())
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RemoteState: existence checks used by validation
// ---------------------------------------------------------------------------

/// Remote project/sample state.
///
/// `send_sample` may be accepted without the sample becoming visible
/// immediately; callers treat `sample_exists` as ground truth.
#[async_trait]
pub trait RemoteState: Send + Sync {
    /// Whether a project with this identifier exists.
    async fn project_exists(&self, project_id: &str) -> ApiResult<bool>;

    /// Whether a sample with this identifier exists in the project.
    async fn sample_exists(&self, sample_id: &str, project_id: &str) -> ApiResult<bool>;

    /// Create the sample in the project.
    async fn send_sample(&self, sample: &Sample, project_id: &str) -> ApiResult<bool>;
}

// ---------------------------------------------------------------------------
// RemoteUpload: sequencing run lifecycle
// ---------------------------------------------------------------------------

/// Sequencing run upload.
///
/// A run moves NEW → UPLOADING → COMPLETE, or to ERROR from NEW/UPLOADING.
/// A `false` return from any status or transfer call means the server
/// refused it.
#[async_trait]
pub trait RemoteUpload: Send + Sync {
    /// Create a sequencing run from the run metadata.
    async fn create_seq_run(&self, metadata: &RunMetadata) -> ApiResult<UploadId>;

    async fn set_seq_run_uploading(&self, upload_id: &UploadId) -> ApiResult<bool>;

    /// Upload one sample's sequence files, linked to the run.
    async fn send_sequence_files(
        &self,
        project_id: &str,
        sample_name: &str,
        sequence_file: &SequenceFile,
        upload_id: &UploadId,
    ) -> ApiResult<bool>;

    async fn set_seq_run_complete(&self, upload_id: &UploadId) -> ApiResult<bool>;

    async fn set_seq_run_error(&self, upload_id: &UploadId) -> ApiResult<bool>;
}

// ---------------------------------------------------------------------------
// RemoteProject: project creation
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RemoteProject: Send + Sync {
    /// Create a new project. Expects an already validated project.
    async fn send_project(&self, project: &Project) -> ApiResult<bool>;
}

/// Everything the uploader needs from IRIDA.
pub trait IridaApi: RemoteState + RemoteUpload + RemoteProject {}

impl<T: RemoteState + RemoteUpload + RemoteProject> IridaApi for T {}
