//! Parser selection: one variant per supported run layout.
//!
//! Every kind answers the same four questions:
//! - `find_single_run`: is this directory a run, and where is its sheet?
//! - `find_runs`: which immediate subdirectories are runs?
//! - `get_sample_sheet`: the sheet of a run directory
//! - `get_sequencing_run`: the validated run model, files attached

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use irida_model::{validate_sequencing_run, SequencingRun, ValidationResult};

use crate::builder::build_sequencing_run;
use crate::error::SheetError;
use crate::files::{
    attach_instrument_files, attach_listed_files, find_miniseq_fastq_dir, MISEQ_FASTQ_DIR,
};
use crate::grammar::{read_sample_sheet, SampleSheet};
use crate::layout::{SheetLayout, DIRECTORY, MINISEQ, MISEQ};
use crate::validation::validate_sample_sheet;
use crate::Result;

/// File name every run directory keeps its sample sheet under.
pub const SAMPLE_SHEET_FILE: &str = "SampleSheet.csv";

/// Written by the instrument once a run has finished.
pub const COMPLETED_JOB_FILE: &str = "CompletedJobInfo.xml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    #[default]
    Miseq,
    Miniseq,
    Directory,
}

/// A directory holding a sample sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    pub path: PathBuf,
    pub sample_sheet: PathBuf,
    pub kind: ParserKind,
}

impl RunDirectory {
    /// Whether the instrument has finished writing the run. Directory runs
    /// are always complete.
    pub fn is_complete(&self) -> bool {
        match self.kind {
            ParserKind::Miseq | ParserKind::Miniseq => self.path.join(COMPLETED_JOB_FILE).is_file(),
            ParserKind::Directory => true,
        }
    }
}

impl ParserKind {
    pub const ALL: [ParserKind; 3] = [ParserKind::Miseq, ParserKind::Miniseq, ParserKind::Directory];

    pub fn name(self) -> &'static str {
        match self {
            ParserKind::Miseq => "miseq",
            ParserKind::Miniseq => "miniseq",
            ParserKind::Directory => "directory",
        }
    }

    pub fn layout(self) -> &'static SheetLayout {
        match self {
            ParserKind::Miseq => &MISEQ,
            ParserKind::Miniseq => &MINISEQ,
            ParserKind::Directory => &DIRECTORY,
        }
    }

    /// The run in `dir` itself.
    ///
    /// # Errors
    ///
    /// `SheetError::RunNotFound` when `dir` is not a directory or has no
    /// sample sheet.
    pub fn find_single_run(self, dir: &Path) -> Result<RunDirectory> {
        let sample_sheet = self.get_sample_sheet(dir)?;
        Ok(RunDirectory {
            path: dir.to_path_buf(),
            sample_sheet,
            kind: self,
        })
    }

    /// Every immediate subdirectory of `dir` that holds a sample sheet,
    /// sorted by path.
    pub fn find_runs(self, dir: &Path) -> Result<Vec<RunDirectory>> {
        if !dir.is_dir() {
            return Err(SheetError::run_not_found(dir, "not a directory"));
        }

        let mut subdirs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                subdirs.push(path);
            }
        }
        subdirs.sort();

        let mut runs = Vec::new();
        for subdir in subdirs {
            match self.find_single_run(&subdir) {
                Ok(run) => runs.push(run),
                Err(SheetError::RunNotFound { reason, .. }) => {
                    debug!(dir = %subdir.display(), %reason, "skipping directory");
                }
                Err(e) => return Err(e),
            }
        }

        info!(parser = self.name(), dir = %dir.display(), runs = runs.len(), "found runs");
        Ok(runs)
    }

    pub fn get_sample_sheet(self, dir: &Path) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(SheetError::run_not_found(dir, "not a directory"));
        }
        let sheet = dir.join(SAMPLE_SHEET_FILE);
        if !sheet.is_file() {
            return Err(SheetError::run_not_found(
                dir,
                format!("{SAMPLE_SHEET_FILE} not found"),
            ));
        }
        Ok(sheet)
    }

    /// Structural validation of a sheet file under this kind's layout.
    pub fn validate_sample_sheet(self, sample_sheet: &Path) -> Result<ValidationResult> {
        let sheet = read_sample_sheet(sample_sheet)?;
        Ok(validate_sample_sheet(&sheet, self.layout()))
    }

    /// Build the run model from an already parsed sheet, without touching
    /// the filesystem. Fails with `SheetError::Invalid` on a structurally
    /// invalid sheet.
    pub fn build_run_model(self, sheet: &SampleSheet) -> Result<SequencingRun> {
        let validation = validate_sample_sheet(sheet, self.layout());
        if !validation.is_valid() {
            warn!(
                parser = self.name(),
                errors = validation.error_count(),
                "sample sheet is invalid"
            );
            return Err(SheetError::Invalid(validation));
        }
        build_sequencing_run(sheet, self.layout())
    }

    /// Parse, validate and build the run described by `sample_sheet`, with
    /// sequence files attached to every sample.
    pub fn get_sequencing_run(self, sample_sheet: &Path) -> Result<SequencingRun> {
        let sheet = read_sample_sheet(sample_sheet)?;
        let mut run = self.build_run_model(&sheet)?;

        let run_dir = sample_sheet
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        match self {
            ParserKind::Miseq => attach_instrument_files(&mut run, &run_dir.join(MISEQ_FASTQ_DIR))?,
            ParserKind::Miniseq => {
                attach_instrument_files(&mut run, &find_miniseq_fastq_dir(run_dir)?)?
            }
            ParserKind::Directory => attach_listed_files(&mut run, run_dir, self.layout())?,
        }

        validate_sequencing_run(&run)?;
        info!(
            parser = self.name(),
            sheet = %sample_sheet.display(),
            projects = run.project_list.len(),
            samples = run.sample_count(),
            "parsed sequencing run"
        );
        Ok(run)
    }
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ParserKind {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        ParserKind::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| SheetError::UnknownParser(s.to_string()))
    }
}
