//! Upload orchestration.
//!
//! A sequencing run upload is a small state machine on the IRIDA side:
//!
//! ```text
//! NEW -> UPLOADING -> COMPLETE
//!  \         \
//!   +---------+----> ERROR
//! ```
//!
//! The orchestrator mirrors that machine locally so an illegal transition is
//! caught before it reaches the server. The first failure after the run is
//! created moves it to ERROR and is returned as is.

use std::time::Instant;

use irida_api::{ApiError, ApiResult, RemoteProject, RemoteUpload, UploadId};
use irida_model::{
    validate_send_project, IridaResourceError, ModelValidationError, Project, RunStatus,
    SequencingRun,
};
use tracing::{debug, warn, Instrument};

use crate::obs::{
    emit_sample_sent, emit_status_changed, emit_upload_finished, emit_upload_started, upload_span,
};

// ---------------------------------------------------------------------------
// Run status tracking
// ---------------------------------------------------------------------------

/// Local view of the remote run's status.
#[derive(Debug)]
struct RunTracker {
    upload_id: UploadId,
    status: RunStatus,
    samples_sent: usize,
}

impl RunTracker {
    fn new(upload_id: UploadId) -> Self {
        Self {
            upload_id,
            status: RunStatus::New,
            samples_sent: 0,
        }
    }

    fn check(&self, next: RunStatus) -> ApiResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(ApiError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }
}

/// Ask IRIDA to move the run to `next`, then record it locally.
async fn set_status<R>(remote: &R, tracker: &mut RunTracker, next: RunStatus) -> ApiResult<()>
where
    R: RemoteUpload + ?Sized,
{
    tracker.check(next)?;

    let id = &tracker.upload_id;
    let accepted = match next {
        RunStatus::Uploading => remote.set_seq_run_uploading(id).await?,
        RunStatus::Complete => remote.set_seq_run_complete(id).await?,
        RunStatus::Error => remote.set_seq_run_error(id).await?,
        RunStatus::New => {
            return Err(ApiError::InvalidTransition {
                from: tracker.status,
                to: next,
            })
        }
    };
    if !accepted {
        return Err(IridaResourceError::for_resource(
            format!("IRIDA refused to set sequencing run status to {next}"),
            id.as_str(),
        )
        .into());
    }

    tracker.status = next;
    emit_status_changed(tracker.upload_id.as_str(), next.as_str());
    Ok(())
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Upload every sample's sequence files as one IRIDA sequencing run.
///
/// Creates the run from the run metadata, marks it UPLOADING, sends each
/// sample's files in sheet order and marks it COMPLETE. Returns the id IRIDA
/// assigned to the run.
///
/// # Errors
///
/// A failure to create the run is returned directly. Any later failure
/// (including a `false` answer from IRIDA or a sample without sequence
/// files) sets the run to ERROR once and returns the failure unchanged; if
/// that status call fails too, `ApiError::StatusUpdateFailed` carries both.
pub async fn upload_sequencing_run<R>(remote: &R, run: &SequencingRun) -> ApiResult<UploadId>
where
    R: RemoteUpload + ?Sized,
{
    let upload_id = remote.create_seq_run(&run.metadata).await?;
    let span = upload_span(upload_id.as_str());
    drive_upload(remote, run, upload_id).instrument(span).await
}

async fn drive_upload<R>(remote: &R, run: &SequencingRun, upload_id: UploadId) -> ApiResult<UploadId>
where
    R: RemoteUpload + ?Sized,
{
    emit_upload_started(
        upload_id.as_str(),
        run.project_list.len(),
        run.sample_count(),
    );

    let started = Instant::now();
    let mut tracker = RunTracker::new(upload_id);
    let outcome = transfer(remote, run, &mut tracker).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => {
            emit_upload_finished(
                tracker.upload_id.as_str(),
                duration_ms,
                tracker.samples_sent,
                true,
            );
            Ok(tracker.upload_id)
        }
        Err(original) => {
            warn!(error = %original, status = %tracker.status, "upload failed, setting run to ERROR");
            let status_result = set_status(remote, &mut tracker, RunStatus::Error).await;
            emit_upload_finished(
                tracker.upload_id.as_str(),
                duration_ms,
                tracker.samples_sent,
                false,
            );
            match status_result {
                Ok(()) => Err(original),
                Err(status_error) => Err(ApiError::StatusUpdateFailed {
                    original: Box::new(original),
                    status_error: Box::new(status_error),
                }),
            }
        }
    }
}

async fn transfer<R>(remote: &R, run: &SequencingRun, tracker: &mut RunTracker) -> ApiResult<()>
where
    R: RemoteUpload + ?Sized,
{
    set_status(remote, tracker, RunStatus::Uploading).await?;

    for (project, sample) in run.samples() {
        let files = sample.sequence_file.as_ref().ok_or_else(|| {
            ModelValidationError::new(
                "sample has no sequence files",
                Some(sample.identifier.clone()),
            )
        })?;

        debug!(sample = %sample.identifier, project = %project.identifier, "sending sequence files");
        let sent = remote
            .send_sequence_files(
                &project.identifier,
                &sample.identifier,
                files,
                &tracker.upload_id,
            )
            .await?;
        if !sent {
            return Err(IridaResourceError::for_resource(
                "IRIDA did not accept the sequence files",
                &sample.identifier,
            )
            .into());
        }

        tracker.samples_sent += 1;
        emit_sample_sent(
            tracker.upload_id.as_str(),
            &project.identifier,
            &sample.identifier,
            files.file_list.len(),
        );
    }

    set_status(remote, tracker, RunStatus::Complete).await
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Create a project on IRIDA after checking it locally.
///
/// # Errors
///
/// An invalid project is reported as `ApiError::Resource`, the same family
/// as a remote failure, and nothing is sent.
pub async fn send_project<R>(remote: &R, project: &Project) -> ApiResult<bool>
where
    R: RemoteProject + ?Sized,
{
    validate_send_project(project)?;
    remote.send_project(project).await
}
