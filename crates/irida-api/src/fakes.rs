//! In-memory fakes for the remote ports (testing only)
//!
//! - `MemoryIrida`: a small stateful IRIDA that enforces the run lifecycle
//! - `ScriptedIrida`: replays queued responses per method
//!
//! Both record every call, in order, as an [`ApiCall`].

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use irida_model::{IridaResourceError, Project, RunMetadata, RunStatus, Sample, SequenceFile};

use crate::error::ApiError;
use crate::ports::*;

/// One recorded port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ProjectExists {
        project_id: String,
    },
    SampleExists {
        sample_id: String,
        project_id: String,
    },
    SendSample {
        sample_id: String,
        project_id: String,
    },
    CreateSeqRun {
        metadata: RunMetadata,
    },
    SetSeqRunUploading {
        upload_id: UploadId,
    },
    SendSequenceFiles {
        project_id: String,
        sample_name: String,
        sequence_file: SequenceFile,
        upload_id: UploadId,
    },
    SetSeqRunComplete {
        upload_id: UploadId,
    },
    SetSeqRunError {
        upload_id: UploadId,
    },
    SendProject {
        name: Option<String>,
    },
}

impl ApiCall {
    pub fn sample_exists(sample_id: &str, project_id: &str) -> Self {
        ApiCall::SampleExists {
            sample_id: sample_id.to_string(),
            project_id: project_id.to_string(),
        }
    }

    pub fn project_exists(project_id: &str) -> Self {
        ApiCall::ProjectExists {
            project_id: project_id.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct CallLog {
    calls: Mutex<Vec<ApiCall>>,
}

impl CallLog {
    fn push(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn snapshot(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// MemoryIrida
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MemoryRun {
    metadata: RunMetadata,
    status: RunStatus,
    uploads: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// project id -> (project name, sample names)
    projects: BTreeMap<String, (Option<String>, Vec<String>)>,
    runs: BTreeMap<String, MemoryRun>,
    next_id: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory IRIDA backed by `BTreeMap`s.
///
/// Sample creation can be configured to be silently dropped, and file
/// transfers can be configured to fail, per sample name.
#[derive(Debug, Default)]
pub struct MemoryIrida {
    state: Mutex<MemoryState>,
    dropped_samples: HashSet<String>,
    failing_transfers: HashSet<String>,
    log: CallLog,
}

impl MemoryIrida {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing project.
    pub fn with_project(self, project_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .projects
            .entry(project_id.to_string())
            .or_default();
        self
    }

    /// Add an existing sample (creating its project if needed).
    pub fn with_sample(self, project_id: &str, sample_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .projects
            .entry(project_id.to_string())
            .or_default()
            .1
            .push(sample_id.to_string());
        self
    }

    /// Accept `send_sample` for this sample but never store it.
    pub fn dropping_sample(mut self, sample_id: &str) -> Self {
        self.dropped_samples.insert(sample_id.to_string());
        self
    }

    /// Fail `send_sequence_files` for this sample.
    pub fn failing_transfer(mut self, sample_name: &str) -> Self {
        self.failing_transfers.insert(sample_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.log.snapshot()
    }

    pub fn run_status(&self, upload_id: &UploadId) -> Option<RunStatus> {
        let state = self.state.lock().unwrap();
        state.runs.get(upload_id.as_str()).map(|r| r.status)
    }

    pub fn run_metadata(&self, upload_id: &UploadId) -> Option<RunMetadata> {
        let state = self.state.lock().unwrap();
        state.runs.get(upload_id.as_str()).map(|r| r.metadata.clone())
    }

    /// `(project_id, sample_name)` pairs uploaded for a run, in order.
    pub fn uploads(&self, upload_id: &UploadId) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap();
        state
            .runs
            .get(upload_id.as_str())
            .map(|r| r.uploads.clone())
            .unwrap_or_default()
    }

    pub fn project_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().projects.keys().cloned().collect()
    }

    fn transition(&self, upload_id: &UploadId, to: RunStatus) -> ApiResult<bool> {
        let mut state = self.state.lock().unwrap();
        let run = state.runs.get_mut(upload_id.as_str()).ok_or_else(|| {
            IridaResourceError::for_resource("sequencing run not found", upload_id.as_str())
        })?;
        if !run.status.can_transition_to(to) {
            return Err(ApiError::InvalidTransition {
                from: run.status,
                to,
            });
        }
        run.status = to;
        Ok(true)
    }
}

#[async_trait]
impl RemoteState for MemoryIrida {
    async fn project_exists(&self, project_id: &str) -> ApiResult<bool> {
        self.log.push(ApiCall::project_exists(project_id));
        let state = self.state.lock().unwrap();
        Ok(state.projects.contains_key(project_id))
    }

    async fn sample_exists(&self, sample_id: &str, project_id: &str) -> ApiResult<bool> {
        self.log.push(ApiCall::sample_exists(sample_id, project_id));
        let state = self.state.lock().unwrap();
        Ok(state
            .projects
            .get(project_id)
            .map(|(_, samples)| samples.iter().any(|s| s == sample_id))
            .unwrap_or(false))
    }

    async fn send_sample(&self, sample: &Sample, project_id: &str) -> ApiResult<bool> {
        self.log.push(ApiCall::SendSample {
            sample_id: sample.identifier.clone(),
            project_id: project_id.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        let (_, samples) = state.projects.get_mut(project_id).ok_or_else(|| {
            IridaResourceError::for_resource("project not found", project_id)
        })?;
        if !self.dropped_samples.contains(&sample.identifier) {
            samples.push(sample.identifier.clone());
        }
        Ok(true)
    }
}

#[async_trait]
impl RemoteUpload for MemoryIrida {
    async fn create_seq_run(&self, metadata: &RunMetadata) -> ApiResult<UploadId> {
        self.log.push(ApiCall::CreateSeqRun {
            metadata: metadata.clone(),
        });
        let mut state = self.state.lock().unwrap();
        let upload_id = UploadId::from(state.next_id());
        state.runs.insert(
            upload_id.0.clone(),
            MemoryRun {
                metadata: metadata.clone(),
                status: RunStatus::New,
                uploads: Vec::new(),
            },
        );
        Ok(upload_id)
    }

    async fn set_seq_run_uploading(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.log.push(ApiCall::SetSeqRunUploading {
            upload_id: upload_id.clone(),
        });
        self.transition(upload_id, RunStatus::Uploading)
    }

    async fn send_sequence_files(
        &self,
        project_id: &str,
        sample_name: &str,
        sequence_file: &SequenceFile,
        upload_id: &UploadId,
    ) -> ApiResult<bool> {
        self.log.push(ApiCall::SendSequenceFiles {
            project_id: project_id.to_string(),
            sample_name: sample_name.to_string(),
            sequence_file: sequence_file.clone(),
            upload_id: upload_id.clone(),
        });
        if self.failing_transfers.contains(sample_name) {
            return Err(IridaResourceError::for_resource(
                "could not upload sequence files",
                sample_name,
            )
            .into());
        }

        let mut state = self.state.lock().unwrap();
        let sample_known = state
            .projects
            .get(project_id)
            .map(|(_, samples)| samples.iter().any(|s| s == sample_name))
            .unwrap_or(false);
        if !sample_known {
            return Err(
                IridaResourceError::for_resource("sample not found", sample_name).into(),
            );
        }
        let run = state.runs.get_mut(upload_id.as_str()).ok_or_else(|| {
            IridaResourceError::for_resource("sequencing run not found", upload_id.as_str())
        })?;
        if run.status != RunStatus::Uploading {
            return Err(IridaResourceError::for_resource(
                format!("sequencing run is {}, expected UPLOADING", run.status),
                upload_id.as_str(),
            )
            .into());
        }
        run.uploads
            .push((project_id.to_string(), sample_name.to_string()));
        Ok(true)
    }

    async fn set_seq_run_complete(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.log.push(ApiCall::SetSeqRunComplete {
            upload_id: upload_id.clone(),
        });
        self.transition(upload_id, RunStatus::Complete)
    }

    async fn set_seq_run_error(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.log.push(ApiCall::SetSeqRunError {
            upload_id: upload_id.clone(),
        });
        self.transition(upload_id, RunStatus::Error)
    }
}

#[async_trait]
impl RemoteProject for MemoryIrida {
    async fn send_project(&self, project: &Project) -> ApiResult<bool> {
        self.log.push(ApiCall::SendProject {
            name: project.name.clone(),
        });
        let mut state = self.state.lock().unwrap();
        let id = state.next_id().to_string();
        state
            .projects
            .insert(id, (project.name.clone(), Vec::new()));
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// ScriptedIrida
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Script {
    project_exists: VecDeque<ApiResult<bool>>,
    sample_exists: VecDeque<ApiResult<bool>>,
    send_sample: VecDeque<ApiResult<bool>>,
    create_seq_run: VecDeque<ApiResult<UploadId>>,
    set_seq_run_uploading: VecDeque<ApiResult<bool>>,
    send_sequence_files: VecDeque<ApiResult<bool>>,
    set_seq_run_complete: VecDeque<ApiResult<bool>>,
    set_seq_run_error: VecDeque<ApiResult<bool>>,
    send_project: VecDeque<ApiResult<bool>>,
}

/// Port fake that replays queued responses, one per call, per method.
///
/// A call with no queued response left fails with a resource error naming
/// the method, so unexpected calls surface in tests.
#[derive(Debug, Default)]
pub struct ScriptedIrida {
    script: Mutex<Script>,
    log: CallLog,
}

fn next<T>(queue: &mut VecDeque<ApiResult<T>>, method: &str) -> ApiResult<T> {
    queue.pop_front().unwrap_or_else(|| {
        Err(IridaResourceError::new(format!("no scripted response left for {method}")).into())
    })
}

macro_rules! script_setter {
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(self, responses: Vec<ApiResult<$ty>>) -> Self {
            self.script.lock().unwrap().$field.extend(responses);
            self
        }
    };
}

impl ScriptedIrida {
    pub fn new() -> Self {
        Self::default()
    }

    script_setter!(on_project_exists, project_exists, bool);
    script_setter!(on_sample_exists, sample_exists, bool);
    script_setter!(on_send_sample, send_sample, bool);
    script_setter!(on_create_seq_run, create_seq_run, UploadId);
    script_setter!(on_set_seq_run_uploading, set_seq_run_uploading, bool);
    script_setter!(on_send_sequence_files, send_sequence_files, bool);
    script_setter!(on_set_seq_run_complete, set_seq_run_complete, bool);
    script_setter!(on_set_seq_run_error, set_seq_run_error, bool);
    script_setter!(on_send_project, send_project, bool);

    pub fn calls(&self) -> Vec<ApiCall> {
        self.log.snapshot()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.log.snapshot().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl RemoteState for ScriptedIrida {
    async fn project_exists(&self, project_id: &str) -> ApiResult<bool> {
        self.log.push(ApiCall::project_exists(project_id));
        next(&mut self.script.lock().unwrap().project_exists, "project_exists")
    }

    async fn sample_exists(&self, sample_id: &str, project_id: &str) -> ApiResult<bool> {
        self.log.push(ApiCall::sample_exists(sample_id, project_id));
        next(&mut self.script.lock().unwrap().sample_exists, "sample_exists")
    }

    async fn send_sample(&self, sample: &Sample, project_id: &str) -> ApiResult<bool> {
        self.log.push(ApiCall::SendSample {
            sample_id: sample.identifier.clone(),
            project_id: project_id.to_string(),
        });
        next(&mut self.script.lock().unwrap().send_sample, "send_sample")
    }
}

#[async_trait]
impl RemoteUpload for ScriptedIrida {
    async fn create_seq_run(&self, metadata: &RunMetadata) -> ApiResult<UploadId> {
        self.log.push(ApiCall::CreateSeqRun {
            metadata: metadata.clone(),
        });
        next(&mut self.script.lock().unwrap().create_seq_run, "create_seq_run")
    }

    async fn set_seq_run_uploading(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.log.push(ApiCall::SetSeqRunUploading {
            upload_id: upload_id.clone(),
        });
        next(
            &mut self.script.lock().unwrap().set_seq_run_uploading,
            "set_seq_run_uploading",
        )
    }

    async fn send_sequence_files(
        &self,
        project_id: &str,
        sample_name: &str,
        sequence_file: &SequenceFile,
        upload_id: &UploadId,
    ) -> ApiResult<bool> {
        self.log.push(ApiCall::SendSequenceFiles {
            project_id: project_id.to_string(),
            sample_name: sample_name.to_string(),
            sequence_file: sequence_file.clone(),
            upload_id: upload_id.clone(),
        });
        next(
            &mut self.script.lock().unwrap().send_sequence_files,
            "send_sequence_files",
        )
    }

    async fn set_seq_run_complete(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.log.push(ApiCall::SetSeqRunComplete {
            upload_id: upload_id.clone(),
        });
        next(
            &mut self.script.lock().unwrap().set_seq_run_complete,
            "set_seq_run_complete",
        )
    }

    async fn set_seq_run_error(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.log.push(ApiCall::SetSeqRunError {
            upload_id: upload_id.clone(),
        });
        next(
            &mut self.script.lock().unwrap().set_seq_run_error,
            "set_seq_run_error",
        )
    }
}

#[async_trait]
impl RemoteProject for ScriptedIrida {
    async fn send_project(&self, project: &Project) -> ApiResult<bool> {
        self.log.push(ApiCall::SendProject {
            name: project.name.clone(),
        });
        next(&mut self.script.lock().unwrap().send_project, "send_project")
    }
}
