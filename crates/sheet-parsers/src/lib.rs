//! Sheet Parsers: sample sheets to sequencing runs
//!
//! Turns a run directory on disk into a [`SequencingRun`](irida_model::SequencingRun):
//! finds the sample sheet, splits it into sections, checks its structure,
//! builds the run model and attaches each sample's sequence files.
//!
//! ## Layer 1 - Input
//!
//! Focus: never crash on a malformed sheet; report what is wrong with it.
//!
//! ## Key Components
//!
//! - `grammar`: sections and rows, purely syntactic
//! - `validate_sample_sheet`: structural checks, aggregated
//! - `build_sequencing_run`: run model from sections
//! - `ParserKind`: MiSeq, MiniSeq and directory layouts

pub mod builder;
pub mod error;
pub mod files;
pub mod grammar;
pub mod kind;
pub mod layout;
pub mod validation;

pub use builder::{build_sequencing_run, parse_metadata};
pub use error::SheetError;
pub use grammar::{parse_sample_sheet, read_sample_sheet, SampleSheet, Section};
pub use kind::{ParserKind, RunDirectory, SAMPLE_SHEET_FILE};
pub use layout::SheetLayout;
pub use validation::validate_sample_sheet;

/// Result type for sheet parsing
pub type Result<T> = std::result::Result<T, SheetError>;
