//! IRIDA Model: sequencing run model for the IRIDA uploader
//!
//! Defines the canonical in-memory description of a sequencing run:
//! - `SequencingRun`: run metadata plus projects, in sample-sheet order
//! - `Project`: remote project key and its samples
//! - `Sample`: one sample row, with its sequence files once located
//! - `ValidationResult`: every problem found by a validation pass
//!
//! ## Layer 0 - Model
//!
//! Focus: a single error taxonomy shared by parsing, validation and upload.

pub mod error;
pub mod model;
pub mod validation;

pub use error::{IridaResourceError, ModelValidationError, SampleSheetError, UploaderError};
pub use model::{Project, RunMetadata, RunStatus, Sample, SequenceFile, SequencingRun};
pub use validation::{validate_send_project, validate_sequencing_run, ValidationResult};

/// IRIDA model version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
