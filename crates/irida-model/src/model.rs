//! Canonical sequencing run model.
//!
//! A [`SequencingRun`] owns its [`Project`]s, which own their [`Sample`]s.
//! Order everywhere is sample-sheet order, and that order is what the upload
//! follows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Opaque key/value description of the run, sent verbatim to IRIDA.
pub type RunMetadata = BTreeMap<String, String>;

/// Upload status of a sequencing run on the remote side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    New,
    Uploading,
    Complete,
    Error,
}

impl RunStatus {
    /// Whether `self -> next` is a legal lifecycle transition.
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::New, RunStatus::Uploading)
                | (RunStatus::Uploading, RunStatus::Complete)
                | (RunStatus::New, RunStatus::Error)
                | (RunStatus::Uploading, RunStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Error)
    }

    /// Wire representation used by the IRIDA REST API.
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::New => "NEW",
            RunStatus::Uploading => "UPLOADING",
            RunStatus::Complete => "COMPLETE",
            RunStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sequence data belonging to one sample: one file for single-end reads,
/// forward and reverse files for paired-end reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequenceFile {
    pub file_list: Vec<PathBuf>,
    /// Extra properties sent alongside the files.
    pub properties: BTreeMap<String, String>,
}

impl SequenceFile {
    pub fn new(file_list: Vec<PathBuf>) -> Self {
        Self {
            file_list,
            properties: BTreeMap::new(),
        }
    }

    pub fn is_paired_end(&self) -> bool {
        self.file_list.len() == 2
    }
}

/// One sample row of a sample sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sample {
    /// Remote sample key, e.g. `01-1111`.
    pub identifier: String,
    pub name: String,
    pub description: String,
    /// Every column of the sample's row, keyed by column header.
    pub fields: BTreeMap<String, String>,
    pub sequence_file: Option<SequenceFile>,
}

impl Sample {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            description: String::new(),
            fields: BTreeMap::new(),
            sequence_file: None,
        }
    }

    /// Raw value of a sheet column for this sample.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// i7 index sequence.
    pub fn index(&self) -> Option<&str> {
        self.get("index")
    }

    /// i5 index sequence.
    pub fn index2(&self) -> Option<&str> {
        self.get("index2")
    }
}

/// A group of samples uploaded under one remote project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Remote project key, e.g. `6`.
    pub identifier: String,
    /// Only needed when creating the project remotely.
    pub name: Option<String>,
    pub description: Option<String>,
    pub sample_list: Vec<Sample>,
}

impl Project {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            description: None,
            sample_list: Vec::new(),
        }
    }

    /// Project to be created remotely, which has no identifier yet.
    pub fn named(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            identifier: String::new(),
            name: Some(name.into()),
            description,
            sample_list: Vec::new(),
        }
    }

    pub fn with_sample(mut self, sample: Sample) -> Self {
        self.sample_list.push(sample);
        self
    }
}

/// One sequencing-instrument batch parsed from a sample sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SequencingRun {
    pub metadata: RunMetadata,
    pub project_list: Vec<Project>,
}

impl SequencingRun {
    pub fn new(metadata: RunMetadata, project_list: Vec<Project>) -> Self {
        Self {
            metadata,
            project_list,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.project_list.iter().map(|p| p.sample_list.len()).sum()
    }

    /// All `(project, sample)` pairs in sheet order.
    pub fn samples(&self) -> impl Iterator<Item = (&Project, &Sample)> {
        self.project_list
            .iter()
            .flat_map(|p| p.sample_list.iter().map(move |s| (p, s)))
    }

    pub fn samples_mut(&mut self) -> impl Iterator<Item = &mut Sample> {
        self.project_list
            .iter_mut()
            .flat_map(|p| p.sample_list.iter_mut())
    }
}
