//! Uploader Core: validation and upload orchestration for IRIDA
//!
//! Drives a parsed sequencing run through the two remote phases:
//! - `prepare_and_validate_for_upload`: check projects and samples exist,
//!   creating missing samples, and collect every problem found
//! - `upload_sequencing_run`: create the run, send each sample's files and
//!   keep the run's status in step, failing fast
//!
//! ## Layer 2 - Orchestration
//!
//! Focus: validation reports data, upload propagates errors; remote calls
//! happen strictly one after another in sheet order.

pub mod error;
pub mod obs;
pub mod pipeline;
pub mod telemetry;
pub mod upload;
pub mod validation;

pub use error::{CoreError, Result};
pub use obs::{
    emit_sample_sent, emit_status_changed, emit_upload_finished, emit_upload_started,
    emit_validation_finished, upload_span,
};
pub use pipeline::{process_run, RunMode, RunOutcome};
pub use telemetry::init_tracing;
pub use upload::{send_project, upload_sequencing_run};
pub use validation::prepare_and_validate_for_upload;

/// Uploader version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
