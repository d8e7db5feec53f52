//! Run-model builder: sample sheet sections to [`SequencingRun`].
//!
//! Samples come from the `[Data]` section. Its first non-blank row names the
//! columns; every later non-blank row is one sample. Samples are grouped into
//! projects in first-appearance order. Run metadata comes from `[Header]` and
//! `[Reads]`.

use irida_model::{Project, RunMetadata, Sample, SequencingRun};
use tracing::{debug, warn};

use crate::error::SheetError;
use crate::grammar::SampleSheet;
use crate::layout::SheetLayout;
use crate::Result;

pub const HEADER_SECTION: &str = "Header";
pub const READS_SECTION: &str = "Reads";
pub const DATA_SECTION: &str = "Data";

/// Column header row and sample rows of the `[Data]` section.
#[derive(Debug)]
pub(crate) struct DataTable<'a> {
    pub columns: Vec<String>,
    pub rows: Vec<&'a Vec<String>>,
}

impl<'a> DataTable<'a> {
    /// `None` when there is no `[Data]` section or it has no non-blank rows.
    pub fn from_sheet(sheet: &'a SampleSheet) -> Option<Self> {
        let mut rows = sheet.section(DATA_SECTION)?.content_rows();
        let columns = rows.next()?.iter().map(|c| c.trim().to_string()).collect();
        Some(Self {
            columns,
            rows: rows.collect(),
        })
    }

    /// Position of a column; the first of duplicate columns wins.
    pub fn index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|v| v.trim()).unwrap_or("")
}

/// Build the run model from a parsed sheet.
///
/// Rows without a sample id or project id are skipped with a warning.
///
/// # Errors
///
/// `SheetError::NoSamples` when no row yields a sample.
pub fn build_sequencing_run(sheet: &SampleSheet, layout: &SheetLayout) -> Result<SequencingRun> {
    let metadata = parse_metadata(sheet);
    let table = DataTable::from_sheet(sheet).ok_or(SheetError::NoSamples)?;

    let (Some(id_idx), Some(project_idx)) = (
        table.index(layout.sample_id_column),
        table.index(layout.project_column),
    ) else {
        warn!(
            sample_id = layout.sample_id_column,
            project = layout.project_column,
            "[Data] header row lacks the sample id or project column"
        );
        return Err(SheetError::NoSamples);
    };
    let name_idx = table.index(layout.sample_name_column);
    let description_idx = table.index(layout.description_column);

    let mut projects: Vec<Project> = Vec::new();
    for (n, row) in table.rows.iter().enumerate() {
        let identifier = cell(row, id_idx);
        let project_id = cell(row, project_idx);
        if identifier.is_empty() || project_id.is_empty() {
            warn!(row = n + 1, "skipping [Data] row without sample id or project id");
            continue;
        }

        let name = name_idx
            .map(|i| cell(row, i))
            .filter(|n| !n.is_empty())
            .unwrap_or(identifier);
        let mut sample = Sample::new(identifier, name);
        if let Some(i) = description_idx {
            sample.description = cell(row, i).to_string();
        }
        for (i, column) in table.columns.iter().enumerate() {
            if !column.is_empty() {
                sample
                    .fields
                    .entry(column.clone())
                    .or_insert_with(|| cell(row, i).to_string());
            }
        }

        match projects.iter_mut().find(|p| p.identifier == project_id) {
            Some(project) => project.sample_list.push(sample),
            None => projects.push(Project::new(project_id).with_sample(sample)),
        }
    }

    if projects.is_empty() {
        return Err(SheetError::NoSamples);
    }

    let run = SequencingRun::new(metadata, projects);
    debug!(
        projects = run.project_list.len(),
        samples = run.sample_count(),
        "built sequencing run"
    );
    Ok(run)
}

/// Run metadata from `[Header]` key/value rows and `[Reads]` read lengths.
///
/// Header keys are camelCased (`Experiment Name` becomes `experimentName`);
/// a repeated key keeps its first value.
pub fn parse_metadata(sheet: &SampleSheet) -> RunMetadata {
    let mut metadata = RunMetadata::new();

    if let Some(header) = sheet.section(HEADER_SECTION) {
        for row in header.content_rows() {
            let key = camel_case(cell(row, 0));
            if key.is_empty() {
                continue;
            }
            metadata
                .entry(key)
                .or_insert_with(|| cell(row, 1).to_string());
        }
    }

    let reads: Vec<u32> = sheet
        .section(READS_SECTION)
        .map(|s| {
            s.content_rows()
                .filter_map(|row| cell(row, 0).parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if let Some(first) = reads.first() {
        metadata.insert("readLengths".to_string(), first.to_string());
        let layout = if reads.len() == 2 {
            "PAIRED_END"
        } else {
            "SINGLE_END"
        };
        metadata.insert("layoutType".to_string(), layout.to_string());
    }

    metadata
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let words = key
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty());

    for (i, word) in words.enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_sample_sheet;
    use crate::layout::{DIRECTORY, MISEQ};

    const SHEET: &str = "\
[Header]
IEMFileVersion,4
Investigator Name,Some Guy
Experiment Name,1
Date,10/15/2013
Workflow,GenerateFASTQ

[Reads]
251
251

[Data]
Sample_ID,Sample_Name,Sample_Plate,Sample_Well,I7_Index_ID,index,I5_Index_ID,index2,Sample_Project,Description
01-1111,01-1111,1,01,N01,AAAAAAAA,S01,TTTTTTTT,6,Super bug
02-2222,02-2222,2,02,N02,GGGGGGGG,S02,CCCCCCCC,6,Scary bug
03-3333,03-3333,3,03,N03,CCCCCCCC,S03,GGGGGGGG,5,Deadly bug
";

    #[test]
    fn test_groups_samples_by_project_in_order() {
        let sheet = parse_sample_sheet(SHEET).unwrap();
        let run = build_sequencing_run(&sheet, &MISEQ).unwrap();

        let projects: Vec<&str> = run
            .project_list
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(projects, vec!["6", "5"]);
        assert_eq!(run.project_list[0].sample_list.len(), 2);
        assert_eq!(run.sample_count(), 3);

        let sample = &run.project_list[1].sample_list[0];
        assert_eq!(sample.identifier, "03-3333");
        assert_eq!(sample.description, "Deadly bug");
        assert_eq!(sample.index(), Some("CCCCCCCC"));
        assert_eq!(sample.get("Sample_Well"), Some("03"));
    }

    #[test]
    fn test_metadata_from_header_and_reads() {
        let sheet = parse_sample_sheet(SHEET).unwrap();
        let metadata = parse_metadata(&sheet);

        assert_eq!(metadata["experimentName"], "1");
        assert_eq!(metadata["investigatorName"], "Some Guy");
        assert_eq!(metadata["workflow"], "GenerateFASTQ");
        assert_eq!(metadata["iEMFileVersion"], "4");
        assert_eq!(metadata["readLengths"], "251");
        assert_eq!(metadata["layoutType"], "PAIRED_END");
    }

    #[test]
    fn test_single_read_is_single_end() {
        let sheet = parse_sample_sheet("[Reads]\n151\n").unwrap();
        assert_eq!(parse_metadata(&sheet)["layoutType"], "SINGLE_END");
    }

    #[test]
    fn test_missing_sections_are_tolerated() {
        let sheet = parse_sample_sheet(
            "[Data]\nSample_ID,Sample_Name,Sample_Project\n01-1111,,6\n",
        )
        .unwrap();
        let run = build_sequencing_run(&sheet, &MISEQ).unwrap();

        assert!(run.metadata.is_empty());
        let sample = &run.project_list[0].sample_list[0];
        assert_eq!(sample.name, "01-1111");
    }

    #[test]
    fn test_rows_without_keys_are_skipped() {
        let sheet = parse_sample_sheet(
            "[Data]\nSample_ID,Sample_Name,Sample_Project\n,orphan,6\n01-1111,a,\n02-2222,b,6\n",
        )
        .unwrap();
        let run = build_sequencing_run(&sheet, &MISEQ).unwrap();

        assert_eq!(run.sample_count(), 1);
        assert_eq!(run.project_list[0].sample_list[0].identifier, "02-2222");
    }

    #[test]
    fn test_duplicate_columns_first_wins() {
        let sheet = parse_sample_sheet(
            "[Data]\nSample_ID,Sample_Name,Sample_Project,Sample_Project\n01,a,6,7\n",
        )
        .unwrap();
        let run = build_sequencing_run(&sheet, &MISEQ).unwrap();

        assert_eq!(run.project_list[0].identifier, "6");
        assert_eq!(run.project_list[0].sample_list[0].get("Sample_Project"), Some("6"));
    }

    #[test]
    fn test_no_samples_is_an_error() {
        let sheet = parse_sample_sheet("[Data]\nSample_ID,Sample_Name,Sample_Project\n\n").unwrap();
        assert!(matches!(
            build_sequencing_run(&sheet, &MISEQ),
            Err(SheetError::NoSamples)
        ));

        let sheet = parse_sample_sheet("[Header]\nA,1\n").unwrap();
        assert!(matches!(
            build_sequencing_run(&sheet, &MISEQ),
            Err(SheetError::NoSamples)
        ));
    }

    #[test]
    fn test_directory_layout_keys_by_sample_name() {
        let sheet = parse_sample_sheet(
            "[Data]\nSample_Name,Project_ID,File_Forward,File_Reverse\nmy-sample,75,a_R1.fastq.gz,a_R2.fastq.gz\n",
        )
        .unwrap();
        let run = build_sequencing_run(&sheet, &DIRECTORY).unwrap();

        let sample = &run.project_list[0].sample_list[0];
        assert_eq!(run.project_list[0].identifier, "75");
        assert_eq!(sample.identifier, "my-sample");
        assert_eq!(sample.get("File_Reverse"), Some("a_R2.fastq.gz"));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("Experiment Name"), "experimentName");
        assert_eq!(
            camel_case("Local Run Manager Analysis Id"),
            "localRunManagerAnalysisId"
        );
        assert_eq!(camel_case("Workflow"), "workflow");
        assert_eq!(camel_case("  "), "");
    }
}
