//! Sample sheet grammar.
//!
//! A sample sheet is comma-separated text split into sections by lines of
//! the form `[Name]` (trailing empty fields allowed, as spreadsheet exports
//! write `[Data],,,,`). Rows before the first section header belong to a
//! section with an empty name. Blank lines are kept as empty rows so later
//! passes can tell "no rows" from "only blank rows".
//!
//! This pass is purely syntactic: it never decides whether a sheet is valid.

use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::debug;

use crate::error::SheetError;
use crate::Result;

/// One `[Name]` section and the rows that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Rows with at least one non-empty field.
    pub fn content_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows.iter().filter(|row| !is_blank(row))
    }
}

/// A sample sheet split into its sections, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSheet {
    pub sections: Vec<Section>,
}

impl SampleSheet {
    /// First section with this name (without brackets).
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }
}

/// Whether every field of a row is empty after trimming.
pub fn is_blank(row: &[String]) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

/// Split sample sheet text into sections.
///
/// # Errors
///
/// `SheetError::Csv` when a line cannot be tokenized.
pub fn parse_sample_sheet(text: &str) -> Result<SampleSheet> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section::new("");

    for (idx, line) in text.lines().enumerate() {
        let row = if line.trim().is_empty() {
            Vec::new()
        } else {
            tokenize_line(line).map_err(|source| SheetError::Csv {
                line: idx + 1,
                source,
            })?
        };

        if let Some(name) = section_name(&row) {
            let finished = std::mem::replace(&mut current, Section::new(name));
            if !finished.name.is_empty() || !finished.rows.is_empty() {
                sections.push(finished);
            }
            continue;
        }
        current.rows.push(row);
    }

    if !current.name.is_empty() || !current.rows.is_empty() {
        sections.push(current);
    }

    debug!(
        sections = ?sections.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "parsed sample sheet"
    );
    Ok(SampleSheet { sections })
}

/// Read and split a sample sheet file.
///
/// Invalid UTF-8 is replaced rather than rejected; instruments are not
/// consistent about encodings.
pub fn read_sample_sheet(path: &Path) -> Result<SampleSheet> {
    let bytes = std::fs::read(path)?;
    parse_sample_sheet(&String::from_utf8_lossy(&bytes))
}

fn tokenize_line(line: &str) -> std::result::Result<Vec<String>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record.iter().map(str::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}

fn section_name(row: &[String]) -> Option<String> {
    let (first, rest) = row.split_first()?;
    if rest.iter().any(|f| !f.trim().is_empty()) {
        return None;
    }
    let first = first.trim();
    first
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(|s| s.trim().to_string())
}
