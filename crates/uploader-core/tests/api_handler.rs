//! Remote validation, upload and project creation against a scripted IRIDA.
//!
//! Each test queues the answers IRIDA gives, runs one core operation and then
//! checks the exact sequence of remote calls made.

use irida_api::fakes::{ApiCall, ScriptedIrida};
use irida_api::{ApiError, UploadId};
use irida_model::{IridaResourceError, Project, Sample, SequenceFile, SequencingRun};
use sheet_parsers::layout::MISEQ;
use sheet_parsers::{build_sequencing_run, parse_sample_sheet};
use uploader_core::{prepare_and_validate_for_upload, send_project, upload_sequencing_run};

const SHEET: &str = "\
[Header]
IEMFileVersion,4
Investigator Name,Some Guy
Experiment Name,1
Date,10/15/2013
Workflow,GenerateFASTQ
Application,FASTQ Only
Assay,Nextera XT
Description,Superbug
Chemistry,Amplicon

[Reads]
251
251

[Settings]
ReverseComplement,0
Adapter,AAAAGGGGAAAAGGGGAAA

[Data]
Sample_ID,Sample_Name,Sample_Plate,Sample_Well,I7_Index_ID,index,I5_Index_ID,index2,Sample_Project,Description
01-1111,01-1111,1,01,N01,AAAAAAAA,S01,TTTTTTTT,6,Super bug
02-2222,02-2222,2,02,N02,GGGGGGGG,S02,CCCCCCCC,6,Scary bug
03-3333,03-3333,3,03,N03,CCCCCCCC,S03,GGGGGGGG,6,Deadly bug
";

fn sequencing_run() -> SequencingRun {
    let sheet = parse_sample_sheet(SHEET).unwrap();
    build_sequencing_run(&sheet, &MISEQ).unwrap()
}

fn fastq_for(sample_id: &str) -> SequenceFile {
    SequenceFile::new(vec![format!("{sample_id}_S1_L001_R1_001.fastq.gz").into()])
}

fn run_with_files() -> SequencingRun {
    let mut run = sequencing_run();
    for sample in run.samples_mut() {
        sample.sequence_file = Some(fastq_for(&sample.identifier));
    }
    run
}

fn sample_exists_calls(remote: &ScriptedIrida) -> Vec<ApiCall> {
    remote
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ApiCall::SampleExists { .. }))
        .collect()
}

fn sent_samples(remote: &ScriptedIrida) -> Vec<(String, String, SequenceFile, UploadId)> {
    remote
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            ApiCall::SendSequenceFiles {
                project_id,
                sample_name,
                sequence_file,
                upload_id,
            } => Some((project_id, sample_name, sequence_file, upload_id)),
            _ => None,
        })
        .collect()
}

// ===========================================================================
// prepare_and_validate_for_upload
// ===========================================================================

#[tokio::test]
async fn validate_all_samples_exist() {
    let remote = ScriptedIrida::new()
        .on_project_exists(vec![Ok(true)])
        .on_sample_exists(vec![Ok(true), Ok(true), Ok(true)]);

    let res = prepare_and_validate_for_upload(&remote, &sequencing_run()).await;

    assert!(res.is_valid());
    assert_eq!(
        remote.calls(),
        vec![
            ApiCall::project_exists("6"),
            ApiCall::sample_exists("01-1111", "6"),
            ApiCall::sample_exists("02-2222", "6"),
            ApiCall::sample_exists("03-3333", "6"),
        ]
    );
}

#[tokio::test]
async fn validate_missing_project_is_one_error() {
    let remote = ScriptedIrida::new().on_project_exists(vec![Ok(false)]);

    let res = prepare_and_validate_for_upload(&remote, &sequencing_run()).await;

    assert!(!res.is_valid());
    assert_eq!(res.error_count(), 1);
    assert!(res.error_list[0].is_irida_resource());
    assert_eq!(remote.calls(), vec![ApiCall::project_exists("6")]);
}

#[tokio::test]
async fn validate_creates_missing_sample_and_rechecks() {
    let remote = ScriptedIrida::new()
        .on_project_exists(vec![Ok(true)])
        .on_sample_exists(vec![Ok(true), Ok(true), Ok(false), Ok(true)])
        .on_send_sample(vec![Ok(true)]);

    let res = prepare_and_validate_for_upload(&remote, &sequencing_run()).await;

    assert!(res.is_valid());
    assert_eq!(
        sample_exists_calls(&remote),
        vec![
            ApiCall::sample_exists("01-1111", "6"),
            ApiCall::sample_exists("02-2222", "6"),
            ApiCall::sample_exists("03-3333", "6"),
            ApiCall::sample_exists("03-3333", "6"),
        ]
    );
    assert_eq!(
        remote.count(|c| matches!(
            c,
            ApiCall::SendSample { sample_id, project_id } if sample_id == "03-3333" && project_id == "6"
        )),
        1
    );
}

#[tokio::test]
async fn validate_sample_still_missing_after_create_is_one_error() {
    let remote = ScriptedIrida::new()
        .on_project_exists(vec![Ok(true)])
        .on_sample_exists(vec![Ok(true), Ok(true), Ok(false), Ok(false)])
        .on_send_sample(vec![Ok(true)]);

    let res = prepare_and_validate_for_upload(&remote, &sequencing_run()).await;

    assert_eq!(sample_exists_calls(&remote).len(), 4);
    assert!(!res.is_valid());
    assert_eq!(res.error_count(), 1);
    assert!(res.error_list[0].is_irida_resource());
}

#[tokio::test]
async fn validate_failed_create_skips_recheck() {
    let remote = ScriptedIrida::new()
        .on_project_exists(vec![Ok(true)])
        .on_sample_exists(vec![Ok(false), Ok(true), Ok(true)])
        .on_send_sample(vec![Err(IridaResourceError::new("Boom").into())]);

    let res = prepare_and_validate_for_upload(&remote, &sequencing_run()).await;

    assert_eq!(res.error_count(), 1);
    assert!(res.error_list[0].to_string().contains("Boom"));
    assert_eq!(
        sample_exists_calls(&remote),
        vec![
            ApiCall::sample_exists("01-1111", "6"),
            ApiCall::sample_exists("02-2222", "6"),
            ApiCall::sample_exists("03-3333", "6"),
        ]
    );
}

#[tokio::test]
async fn validate_collects_errors_across_projects() {
    let mut run = sequencing_run();
    run.project_list
        .push(Project::new("7").with_sample(Sample::new("04-4444", "04-4444")));

    let remote = ScriptedIrida::new()
        .on_project_exists(vec![
            Err(ApiError::Connection("refused".to_string())),
            Ok(false),
        ]);

    let res = prepare_and_validate_for_upload(&remote, &run).await;

    assert_eq!(res.error_count(), 2);
    assert!(res.error_list.iter().all(|e| e.is_irida_resource()));
    assert_eq!(
        remote.calls(),
        vec![ApiCall::project_exists("6"), ApiCall::project_exists("7")]
    );
}

// ===========================================================================
// upload_sequencing_run
// ===========================================================================

#[tokio::test]
async fn upload_calls_every_step_in_order() {
    let run = run_with_files();
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Ok(true)])
        .on_send_sequence_files(vec![Ok(true), Ok(true), Ok(true)])
        .on_set_seq_run_complete(vec![Ok(true)]);

    let upload_id = upload_sequencing_run(&remote, &run).await.unwrap();

    let id = UploadId::from("55");
    assert_eq!(upload_id, id);
    let calls = remote.calls();
    assert_eq!(
        calls.first(),
        Some(&ApiCall::CreateSeqRun {
            metadata: run.metadata.clone()
        })
    );
    assert_eq!(
        calls[1],
        ApiCall::SetSeqRunUploading {
            upload_id: id.clone()
        }
    );
    assert_eq!(
        sent_samples(&remote),
        ["01-1111", "02-2222", "03-3333"]
            .into_iter()
            .map(|name| ("6".to_string(), name.to_string(), fastq_for(name), id.clone()))
            .collect::<Vec<_>>()
    );
    assert_eq!(
        calls.last(),
        Some(&ApiCall::SetSeqRunComplete { upload_id: id })
    );
    assert_eq!(remote.count(|c| matches!(c, ApiCall::SetSeqRunError { .. })), 0);
}

#[tokio::test]
async fn upload_failure_sets_error_once_and_returns_original() {
    let run = run_with_files();
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Err(IridaResourceError::new("Boom").into())])
        .on_set_seq_run_error(vec![Ok(true)]);

    let err = upload_sequencing_run(&remote, &run).await.unwrap_err();

    match err {
        ApiError::Resource(e) => assert_eq!(e.message, "Boom"),
        other => panic!("expected the original resource error, got {other:?}"),
    }
    let id = UploadId::from("55");
    assert_eq!(
        remote.calls(),
        vec![
            ApiCall::CreateSeqRun {
                metadata: run.metadata.clone()
            },
            ApiCall::SetSeqRunUploading {
                upload_id: id.clone()
            },
            ApiCall::SetSeqRunError { upload_id: id },
        ]
    );
}

#[tokio::test]
async fn upload_create_failure_makes_no_status_calls() {
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Err(ApiError::Connection("refused".to_string()))]);

    let err = upload_sequencing_run(&remote, &run_with_files())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Connection(_)));
    assert_eq!(remote.calls().len(), 1);
}

#[tokio::test]
async fn upload_transfer_failure_stops_remaining_samples() {
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Ok(true)])
        .on_send_sequence_files(vec![Ok(true), Err(IridaResourceError::new("disk full").into())])
        .on_set_seq_run_error(vec![Ok(true)]);

    let err = upload_sequencing_run(&remote, &run_with_files())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("disk full"));
    assert_eq!(sent_samples(&remote).len(), 2);
    assert_eq!(remote.count(|c| matches!(c, ApiCall::SetSeqRunComplete { .. })), 0);
    assert_eq!(remote.count(|c| matches!(c, ApiCall::SetSeqRunError { .. })), 1);
}

#[tokio::test]
async fn upload_refused_transfer_counts_as_failure() {
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Ok(true)])
        .on_send_sequence_files(vec![Ok(false)])
        .on_set_seq_run_error(vec![Ok(true)]);

    let err = upload_sequencing_run(&remote, &run_with_files())
        .await
        .unwrap_err();

    assert!(err.is_resource());
    assert_eq!(sent_samples(&remote).len(), 1);
    assert_eq!(remote.count(|c| matches!(c, ApiCall::SetSeqRunError { .. })), 1);
}

#[tokio::test]
async fn upload_refused_completion_sets_error() {
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Ok(true)])
        .on_send_sequence_files(vec![Ok(true), Ok(true), Ok(true)])
        .on_set_seq_run_complete(vec![Ok(false)])
        .on_set_seq_run_error(vec![Ok(true)]);

    let err = upload_sequencing_run(&remote, &run_with_files())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("COMPLETE"));
    assert_eq!(remote.count(|c| matches!(c, ApiCall::SetSeqRunError { .. })), 1);
}

#[tokio::test]
async fn upload_sample_without_files_fails_before_transfer() {
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Ok(true)])
        .on_set_seq_run_error(vec![Ok(true)]);

    let err = upload_sequencing_run(&remote, &sequencing_run())
        .await
        .unwrap_err();

    match err {
        ApiError::Resource(e) => assert_eq!(e.resource.as_deref(), Some("01-1111")),
        other => panic!("expected a resource error, got {other:?}"),
    }
    assert!(sent_samples(&remote).is_empty());
    assert_eq!(remote.count(|c| matches!(c, ApiCall::SetSeqRunError { .. })), 1);
}

#[tokio::test]
async fn upload_error_status_failure_reports_both() {
    let remote = ScriptedIrida::new()
        .on_create_seq_run(vec![Ok(UploadId::from(55u64))])
        .on_set_seq_run_uploading(vec![Err(IridaResourceError::new("Boom").into())])
        .on_set_seq_run_error(vec![Err(ApiError::Connection("gone".to_string()))]);

    let err = upload_sequencing_run(&remote, &run_with_files())
        .await
        .unwrap_err();

    match err {
        ApiError::StatusUpdateFailed {
            original,
            status_error,
        } => {
            assert!(original.is_resource());
            assert!(matches!(*status_error, ApiError::Connection(_)));
        }
        other => panic!("expected StatusUpdateFailed, got {other:?}"),
    }
}

// ===========================================================================
// send_project
// ===========================================================================

#[tokio::test]
async fn send_project_validates_then_sends() {
    let remote = ScriptedIrida::new().on_send_project(vec![Ok(true)]);
    let project = Project::named("Outbreak 2024", Some("summer".to_string()));

    assert!(send_project(&remote, &project).await.unwrap());
    assert_eq!(
        remote.calls(),
        vec![ApiCall::SendProject {
            name: Some("Outbreak 2024".to_string())
        }]
    );
}

#[tokio::test]
async fn send_project_remote_failure_is_resource_error() {
    let remote =
        ScriptedIrida::new().on_send_project(vec![Err(IridaResourceError::new("BOOM").into())]);
    let project = Project::named("Outbreak 2024", None);

    let err = send_project(&remote, &project).await.unwrap_err();
    assert!(err.is_resource());
}

#[tokio::test]
async fn send_project_invalid_project_is_resource_error() {
    let remote = ScriptedIrida::new();
    let project = Project::named("abc", None);

    let err = send_project(&remote, &project).await.unwrap_err();

    assert!(err.is_resource());
    assert!(remote.calls().is_empty());
}
