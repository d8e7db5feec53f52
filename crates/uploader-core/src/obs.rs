//! Structured observability hooks for the upload lifecycle.
//!
//! This module provides:
//! - An upload-scoped tracing span, `upload_span`
//! - Emission functions for lifecycle events: upload start, status change,
//!   sample sent, upload finish, validation finish
//!
//! Events are emitted at `info!` level (failures at `warn!`) with an `event`
//! field naming them, so JSON logs can be filtered on it.

use tracing::{info, warn};

/// Upload-scoped span; attach it to the upload future with
/// [`tracing::Instrument`] so every event is tagged with the run's id.
///
/// # Example
///
/// ```ignore
/// use tracing::Instrument;
/// drive_upload(remote, run).instrument(upload_span("55")).await
/// ```
pub fn upload_span(upload_id: &str) -> tracing::Span {
    tracing::info_span!("irida.upload", upload_id = %upload_id)
}

/// Emit event: sequencing run created remotely, upload about to start.
pub fn emit_upload_started(upload_id: &str, projects: usize, samples: usize) {
    info!(
        event = "upload.started",
        upload_id = %upload_id,
        projects = projects,
        samples = samples,
    );
}

/// Emit event: the remote run moved to a new status.
pub fn emit_status_changed(upload_id: &str, status: &str) {
    info!(event = "upload.status", upload_id = %upload_id, status = %status);
}

/// Emit event: one sample's sequence files were accepted.
pub fn emit_sample_sent(upload_id: &str, project_id: &str, sample: &str, files: usize) {
    info!(
        event = "upload.sample_sent",
        upload_id = %upload_id,
        project_id = %project_id,
        sample = %sample,
        files = files,
    );
}

/// Emit event: upload finished, successfully or not.
pub fn emit_upload_finished(upload_id: &str, duration_ms: u64, samples_sent: usize, success: bool) {
    if success {
        info!(
            event = "upload.finished",
            upload_id = %upload_id,
            duration_ms = duration_ms,
            samples_sent = samples_sent,
            success = success,
        );
    } else {
        warn!(
            event = "upload.finished",
            upload_id = %upload_id,
            duration_ms = duration_ms,
            samples_sent = samples_sent,
            success = success,
        );
    }
}

/// Emit event: remote validation of a run completed.
pub fn emit_validation_finished(projects: usize, samples: usize, errors: usize) {
    info!(
        event = "validation.finished",
        projects = projects,
        samples = samples,
        errors = errors,
        valid = errors == 0,
    );
}
