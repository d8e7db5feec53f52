//! End-to-end processing of one run directory.
//!
//! sheet -> run model (files attached) -> remote validation -> upload
//!
//! Anything that makes the run unfit for upload is returned as
//! [`RunOutcome::Invalid`]; only failures that stop processing outright
//! (unreadable directory, remote errors during upload) are errors.

use std::path::Path;

use chrono::{DateTime, Utc};
use irida_api::{RemoteState, RemoteUpload, UploadId};
use irida_model::ValidationResult;
use serde::Serialize;
use sheet_parsers::{ParserKind, SheetError};
use tracing::{info, warn};

use crate::error::Result;
use crate::upload::upload_sequencing_run;
use crate::validation::prepare_and_validate_for_upload;

/// How far to take a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Parse and validate against IRIDA (creating missing samples).
    ValidateOnly,
    /// Validate, then upload.
    Upload,
}

/// What happened to a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The sheet or the remote state rules out an upload.
    Invalid { validation: ValidationResult },
    /// Valid, and not uploaded because only validation was asked for.
    Validated { projects: usize, samples: usize },
    Uploaded {
        upload_id: UploadId,
        projects: usize,
        samples: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Invalid { .. })
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            RunOutcome::Invalid { validation } => Some(validation),
            _ => None,
        }
    }
}

/// Process the run in `run_dir` with the given parser.
///
/// # Errors
///
/// `CoreError::Sheet` when the run cannot be read or its sequence files
/// cannot be located; `CoreError::Api` when the upload fails.
pub async fn process_run<R>(
    remote: &R,
    kind: ParserKind,
    run_dir: &Path,
    mode: RunMode,
) -> Result<RunOutcome>
where
    R: RemoteState + RemoteUpload + ?Sized,
{
    let found = kind.find_single_run(run_dir)?;
    info!(parser = %kind, dir = %run_dir.display(), ?mode, "processing run");

    let run = match kind.get_sequencing_run(&found.sample_sheet) {
        Ok(run) => run,
        Err(SheetError::Invalid(validation)) => {
            warn!(errors = validation.error_count(), "sample sheet is invalid");
            return Ok(RunOutcome::Invalid { validation });
        }
        Err(SheetError::Model(error)) => {
            let mut validation = ValidationResult::new();
            validation.add_error(error);
            return Ok(RunOutcome::Invalid { validation });
        }
        Err(e) => return Err(e.into()),
    };

    let validation = prepare_and_validate_for_upload(remote, &run).await;
    if !validation.is_valid() {
        warn!(errors = validation.error_count(), "run failed remote validation");
        return Ok(RunOutcome::Invalid { validation });
    }

    let projects = run.project_list.len();
    let samples = run.sample_count();
    if mode == RunMode::ValidateOnly {
        return Ok(RunOutcome::Validated { projects, samples });
    }

    let started_at = Utc::now();
    let upload_id = upload_sequencing_run(remote, &run).await?;
    Ok(RunOutcome::Uploaded {
        upload_id,
        projects,
        samples,
        started_at,
        finished_at: Utc::now(),
    })
}
