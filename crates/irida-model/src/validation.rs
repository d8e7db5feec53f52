//! Aggregated validation results and local model validation.
//!
//! [`ValidationResult`] collects every problem found during a validation pass
//! instead of stopping at the first one. The `validate_*` functions check a
//! model object before it is sent to IRIDA.

use serde::{Deserialize, Serialize};

use crate::error::{ModelValidationError, UploaderError};
use crate::model::{Project, SequencingRun};

/// Minimum project name length accepted by IRIDA.
pub const MIN_PROJECT_NAME_LEN: usize = 5;

/// Characters IRIDA rejects in project and sample names.
pub const FORBIDDEN_NAME_CHARS: &[char] = &[
    '?', '(', ')', '[', ']', '/', '\\', '=', '+', '<', '>', ':', ';', '"', ',', '*', '^', '|', '&',
    '\'',
];

/// Errors discovered by one validation pass, in discovery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub error_list: Vec<UploaderError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: impl Into<UploaderError>) {
        self.error_list.push(error.into());
    }

    /// Append all errors of `other`, keeping their order.
    pub fn extend(&mut self, other: ValidationResult) {
        self.error_list.extend(other.error_list);
    }

    pub fn is_valid(&self) -> bool {
        self.error_list.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.error_list.len()
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }
        writeln!(f, "{} error(s):", self.error_count())?;
        for error in &self.error_list {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

/// Check that a project can be created remotely.
///
/// # Errors
///
/// `ModelValidationError` when the name is missing, shorter than
/// [`MIN_PROJECT_NAME_LEN`], or contains a forbidden character.
pub fn validate_send_project(project: &Project) -> Result<(), ModelValidationError> {
    let name = project
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ModelValidationError::new("project name is required", None))?;

    if name.chars().count() < MIN_PROJECT_NAME_LEN {
        return Err(ModelValidationError::new(
            format!(
                "project name must be at least {} characters",
                MIN_PROJECT_NAME_LEN
            ),
            Some(name.to_string()),
        ));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(ModelValidationError::new(
            format!("project name contains forbidden character '{c}'"),
            Some(name.to_string()),
        ));
    }

    Ok(())
}

/// Check that a run is ready for upload: it has projects, every project has
/// samples, and every sample has one or two sequence files on disk.
pub fn validate_sequencing_run(run: &SequencingRun) -> Result<(), ModelValidationError> {
    if run.project_list.is_empty() {
        return Err(ModelValidationError::new(
            "sequencing run has no projects",
            None,
        ));
    }

    for project in &run.project_list {
        if project.identifier.trim().is_empty() {
            return Err(ModelValidationError::new(
                "project identifier is empty",
                None,
            ));
        }
        if project.sample_list.is_empty() {
            return Err(ModelValidationError::new(
                "project has no samples",
                Some(project.identifier.clone()),
            ));
        }
        for sample in &project.sample_list {
            let files = sample.sequence_file.as_ref().ok_or_else(|| {
                ModelValidationError::new(
                    "sample has no sequence files",
                    Some(sample.identifier.clone()),
                )
            })?;
            if !(1..=2).contains(&files.file_list.len()) {
                return Err(ModelValidationError::new(
                    format!(
                        "sample must have 1 or 2 sequence files, found {}",
                        files.file_list.len()
                    ),
                    Some(sample.identifier.clone()),
                ));
            }
            if let Some(missing) = files.file_list.iter().find(|p| !p.is_file()) {
                return Err(ModelValidationError::new(
                    format!("sequence file does not exist: {}", missing.display()),
                    Some(sample.identifier.clone()),
                ));
            }
        }
    }

    Ok(())
}
