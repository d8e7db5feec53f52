//! Error types for sheet-parsers

use irida_model::{ModelValidationError, ValidationResult};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating, reading or building a run
#[derive(Error, Debug)]
pub enum SheetError {
    /// Sample sheet or run directory could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A sample sheet line is not valid CSV
    #[error("CSV error on line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    /// The sample sheet failed structural validation
    #[error("sample sheet is invalid ({} error(s))", .0.error_count())]
    Invalid(ValidationResult),

    /// No sample row could be turned into a sample
    #[error("no samples found in sample sheet")]
    NoSamples,

    /// Parser name not recognised
    #[error("unknown parser '{0}', expected one of: miseq, miniseq, directory")]
    UnknownParser(String),

    /// Nothing that looks like a run at this path
    #[error("no run found at {path}: {reason}")]
    RunNotFound { path: PathBuf, reason: String },

    /// Sequence files for a sample could not be located
    #[error("sequence files for sample '{sample}': {reason}")]
    SequenceFiles { sample: String, reason: String },

    /// The built run failed local model validation
    #[error(transparent)]
    Model(#[from] ModelValidationError),
}

impl SheetError {
    pub(crate) fn run_not_found(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SheetError::RunNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn sequence_files(sample: impl Into<String>, reason: impl Into<String>) -> Self {
        SheetError::SequenceFiles {
            sample: sample.into(),
            reason: reason.into(),
        }
    }

    /// The structural validation result, when that is why parsing stopped.
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            SheetError::Invalid(result) => Some(result),
            _ => None,
        }
    }
}
