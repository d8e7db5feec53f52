//! Remote validation of a sequencing run.
//!
//! Checks that every project exists in IRIDA and that every sample exists
//! in its project, creating missing samples on the way. Problems are
//! collected, never raised: the caller gets one [`ValidationResult`] listing
//! everything that would make the upload fail.

use irida_api::RemoteState;
use irida_model::{IridaResourceError, Project, Sample, SequencingRun, ValidationResult};
use tracing::debug;

use crate::obs::emit_validation_finished;

/// Validate `run` against IRIDA, creating samples that do not exist yet.
///
/// Projects and samples are visited in sheet order. A missing project is one
/// error and its samples are skipped. A sample counts as resolved only if a
/// second existence check after creating it succeeds.
pub async fn prepare_and_validate_for_upload<R>(remote: &R, run: &SequencingRun) -> ValidationResult
where
    R: RemoteState + ?Sized,
{
    let mut result = ValidationResult::new();

    for project in &run.project_list {
        if let Err(error) = check_project(remote, project).await {
            result.add_error(error);
            continue;
        }
        for sample in &project.sample_list {
            if let Err(error) = ensure_sample(remote, project, sample).await {
                result.add_error(error);
            }
        }
    }

    emit_validation_finished(
        run.project_list.len(),
        run.sample_count(),
        result.error_count(),
    );
    result
}

async fn check_project<R>(remote: &R, project: &Project) -> Result<(), IridaResourceError>
where
    R: RemoteState + ?Sized,
{
    let exists = remote
        .project_exists(&project.identifier)
        .await
        .map_err(|e| e.into_resource_error())?;
    if exists {
        Ok(())
    } else {
        Err(IridaResourceError::for_resource(
            "project does not exist on IRIDA",
            &project.identifier,
        ))
    }
}

async fn ensure_sample<R>(remote: &R, project: &Project, sample: &Sample) -> Result<(), IridaResourceError>
where
    R: RemoteState + ?Sized,
{
    let project_id = project.identifier.as_str();
    let sample_id = sample.identifier.as_str();

    let exists = remote
        .sample_exists(sample_id, project_id)
        .await
        .map_err(|e| e.into_resource_error())?;
    if exists {
        return Ok(());
    }

    debug!(sample = %sample_id, project = %project_id, "sample missing, creating it");
    remote
        .send_sample(sample, project_id)
        .await
        .map_err(|e| e.into_resource_error())?;

    let created = remote
        .sample_exists(sample_id, project_id)
        .await
        .map_err(|e| e.into_resource_error())?;
    if created {
        Ok(())
    } else {
        Err(IridaResourceError::for_resource(
            format!("sample could not be created in project {project_id}"),
            sample_id,
        ))
    }
}
