//! Locating each sample's sequence files on disk.

use irida_model::{Sample, SequenceFile, SequencingRun};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SheetError;
use crate::layout::SheetLayout;
use crate::Result;

const FASTQ_EXTENSIONS: &[&str] = &[".fastq.gz", ".fastq", ".fq.gz", ".fq"];

/// MiSeq output folder for FASTQ files, relative to the run directory.
pub const MISEQ_FASTQ_DIR: &str = "Data/Intensities/BaseCalls";

/// Attach FASTQ files from `fastq_dir` to every sample, matched by the
/// instrument's `<Sample_Name>_S<n>_...` naming.
pub fn attach_instrument_files(run: &mut SequencingRun, fastq_dir: &Path) -> Result<()> {
    let listing = list_fastq_files(fastq_dir)?;
    for sample in run.samples_mut() {
        let files = match_sample_files(&listing, sample_file_prefix(sample));
        sample.sequence_file = Some(sequence_file_for(sample, files)?);
    }
    Ok(())
}

/// Attach the files a directory-style sheet names explicitly, resolved
/// against the directory holding the sheet.
pub fn attach_listed_files(
    run: &mut SequencingRun,
    sheet_dir: &Path,
    layout: &SheetLayout,
) -> Result<()> {
    for sample in run.samples_mut() {
        let mut files = Vec::new();
        for column in [layout.forward_file_column, layout.reverse_file_column]
            .into_iter()
            .flatten()
        {
            let name = sample.get(column).map(str::trim).unwrap_or("");
            if name.is_empty() {
                continue;
            }
            let path = sheet_dir.join(name);
            if !path.is_file() {
                return Err(SheetError::sequence_files(
                    &sample.identifier,
                    format!("{} does not exist", path.display()),
                ));
            }
            files.push(path);
        }
        sample.sequence_file = Some(sequence_file_for(sample, files)?);
    }
    Ok(())
}

/// The `Fastq` folder of the newest MiniSeq analysis:
/// `Alignment_<n>/<timestamp>/Fastq`.
pub fn find_miniseq_fastq_dir(run_dir: &Path) -> Result<PathBuf> {
    let alignments = sorted_dirs(run_dir)?
        .into_iter()
        .filter(|p| file_name(p).starts_with("Alignment_"));

    let mut found = None;
    for alignment in alignments {
        for analysis in sorted_dirs(&alignment)? {
            let fastq = analysis.join("Fastq");
            if fastq.is_dir() {
                found = Some(fastq);
            }
        }
    }

    found.ok_or_else(|| {
        SheetError::run_not_found(run_dir, "no Alignment_*/<timestamp>/Fastq folder")
    })
}

fn sequence_file_for(sample: &Sample, files: Vec<PathBuf>) -> Result<SequenceFile> {
    match files.len() {
        1 | 2 => {
            debug!(sample = %sample.identifier, files = files.len(), "located sequence files");
            Ok(SequenceFile::new(files))
        }
        0 => Err(SheetError::sequence_files(
            &sample.identifier,
            "no sequence files found",
        )),
        n => Err(SheetError::sequence_files(
            &sample.identifier,
            format!("expected 1 or 2 sequence files, found {n}"),
        )),
    }
}

fn sample_file_prefix(sample: &Sample) -> &str {
    if sample.name.is_empty() {
        &sample.identifier
    } else {
        &sample.name
    }
}

fn list_fastq_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = file_name(&path);
        if path.is_file() && FASTQ_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Files named `<prefix>_S<digits>_...`, sorted so R1 precedes R2.
fn match_sample_files(listing: &[PathBuf], prefix: &str) -> Vec<PathBuf> {
    listing
        .iter()
        .filter(|path| {
            file_name(path)
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix("_S"))
                .map_or(false, |rest| {
                    let digits = rest.chars().take_while(char::is_ascii_digit).count();
                    digits > 0 && rest[digits..].starts_with('_')
                })
        })
        .cloned()
        .collect()
}

fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
