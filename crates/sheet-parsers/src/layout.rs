//! Column layouts of the supported sample sheet flavours.

/// Which `[Data]` columns carry what, for one sample sheet flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Column holding the remote sample key.
    pub sample_id_column: &'static str,
    /// Column holding the sample name, also the FASTQ file name prefix.
    pub sample_name_column: &'static str,
    pub project_column: &'static str,
    pub description_column: &'static str,
    /// Columns whose absence from the header row makes the sheet invalid.
    pub required_columns: &'static [&'static str],
    /// Whether a missing `[Header]` section makes the sheet invalid.
    pub requires_header_section: bool,
    /// Columns naming the sequence files directly, if the layout has them.
    pub forward_file_column: Option<&'static str>,
    pub reverse_file_column: Option<&'static str>,
}

pub const MISEQ: SheetLayout = SheetLayout {
    sample_id_column: "Sample_ID",
    sample_name_column: "Sample_Name",
    project_column: "Sample_Project",
    description_column: "Description",
    required_columns: &["Sample_ID", "Sample_Name", "Sample_Project"],
    requires_header_section: false,
    forward_file_column: None,
    reverse_file_column: None,
};

pub const MINISEQ: SheetLayout = SheetLayout {
    requires_header_section: true,
    ..MISEQ
};

/// Plain directory of FASTQ files with a hand-written sheet.
pub const DIRECTORY: SheetLayout = SheetLayout {
    sample_id_column: "Sample_Name",
    sample_name_column: "Sample_Name",
    project_column: "Project_ID",
    description_column: "Description",
    required_columns: &["Sample_Name", "Project_ID", "File_Forward"],
    requires_header_section: false,
    forward_file_column: Some("File_Forward"),
    reverse_file_column: Some("File_Reverse"),
};
