//! Error taxonomy shared by the parsers, the remote API and the upload core.
//!
//! Three kinds, distinguished by cause:
//! - [`SampleSheetError`]: the sheet's sections, header row or rows are malformed
//! - [`IridaResourceError`]: a remote entity is missing or a remote call failed
//! - [`ModelValidationError`]: a local value failed validation before a remote call
//!
//! During validation these are collected as values in a
//! [`ValidationResult`](crate::ValidationResult); during upload they are
//! returned as failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural problem in a sample sheet.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("sample sheet error: {message}")]
pub struct SampleSheetError {
    pub message: String,
    /// Offending items (missing columns, section names, ...).
    pub details: Vec<String>,
}

impl SampleSheetError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// A remote resource does not exist, could not be created, or a remote
/// state transition failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("IRIDA resource error: {message}{}", .resource.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
pub struct IridaResourceError {
    pub message: String,
    /// Identifier of the resource involved, if any.
    pub resource: Option<String>,
}

impl IridaResourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource: None,
        }
    }

    pub fn for_resource(message: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource: Some(resource.into()),
        }
    }
}

/// A model object failed local validation before being sent anywhere.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("model validation failed: {message}")]
pub struct ModelValidationError {
    pub message: String,
    /// Name of the object that failed validation.
    pub object: Option<String>,
}

impl ModelValidationError {
    pub fn new(message: impl Into<String>, object: Option<String>) -> Self {
        Self {
            message: message.into(),
            object,
        }
    }
}

/// Local model errors are reported to callers as resource errors, so that
/// "could not send X" is always one error family.
impl From<ModelValidationError> for IridaResourceError {
    fn from(err: ModelValidationError) -> Self {
        IridaResourceError {
            message: err.message,
            resource: err.object,
        }
    }
}

/// Any error that can appear in a [`ValidationResult`](crate::ValidationResult).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploaderError {
    #[error(transparent)]
    SampleSheet(#[from] SampleSheetError),

    #[error(transparent)]
    IridaResource(#[from] IridaResourceError),

    #[error(transparent)]
    ModelValidation(#[from] ModelValidationError),
}

impl UploaderError {
    pub fn is_sample_sheet(&self) -> bool {
        matches!(self, UploaderError::SampleSheet(_))
    }

    pub fn is_irida_resource(&self) -> bool {
        matches!(self, UploaderError::IridaResource(_))
    }

    pub fn is_model_validation(&self) -> bool {
        matches!(self, UploaderError::ModelValidation(_))
    }
}
