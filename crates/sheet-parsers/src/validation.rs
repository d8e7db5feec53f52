//! Structural validation of a sample sheet.
//!
//! Checks the shape of the sheet before any model is built. Each defect class
//! below contributes at most one [`SampleSheetError`], and all of them are
//! checked, so a single pass reports everything wrong with the sheet:
//!
//! 1. `[Header]` missing, for layouts that require it
//! 2. no `[Data]` column header row
//! 3. `[Data]` header row missing required columns
//! 4. no sample rows

use irida_model::{SampleSheetError, ValidationResult};
use tracing::debug;

use crate::builder::{DataTable, DATA_SECTION, HEADER_SECTION};
use crate::grammar::SampleSheet;
use crate::layout::SheetLayout;

pub fn validate_sample_sheet(sheet: &SampleSheet, layout: &SheetLayout) -> ValidationResult {
    let mut result = ValidationResult::new();

    if layout.requires_header_section && !sheet.has_section(HEADER_SECTION) {
        result.add_error(SampleSheetError::new(
            "[Header] section not found in sample sheet",
        ));
    }

    let table = DataTable::from_sheet(sheet);
    let has_samples = match &table {
        None if !sheet.has_section(DATA_SECTION) => {
            result.add_error(SampleSheetError::new(
                "[Data] section not found in sample sheet",
            ));
            false
        }
        None => {
            result.add_error(SampleSheetError::new(
                "[Data] section has no column header row",
            ));
            false
        }
        // First row names none of the layout's columns: it is a sample row.
        Some(table) if !names_any_column(table, layout) => {
            result.add_error(SampleSheetError::new(
                "[Data] section has no column header row",
            ));
            true
        }
        Some(table) => {
            let missing: Vec<String> = layout
                .required_columns
                .iter()
                .filter(|column| table.index(column).is_none())
                .map(|column| column.to_string())
                .collect();
            if !missing.is_empty() {
                result.add_error(
                    SampleSheetError::new(format!(
                        "[Data] header row is missing required column(s): {}",
                        missing.join(", ")
                    ))
                    .with_details(missing),
                );
            }
            !table.rows.is_empty()
        }
    };

    if !has_samples {
        result.add_error(SampleSheetError::new(
            "no sample rows found in [Data] section",
        ));
    }

    debug!(errors = result.error_count(), "structural validation finished");
    result
}

fn names_any_column(table: &DataTable<'_>, layout: &SheetLayout) -> bool {
    layout
        .required_columns
        .iter()
        .any(|column| table.index(column).is_some())
}
