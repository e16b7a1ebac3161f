use thiserror::Error;

/// Conditions that abort a run (or, for `LegacyWorkbook`, skip one entry)
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Last-Modified header not found in response from {url}")]
    MissingLastModified { url: String },

    #[error("no link containing '{marker}' found on the page")]
    ArchiveLinkNotFound { marker: String },

    #[error("sheet '{sheet}' not found")]
    SheetNotFound { sheet: String },

    #[error("sheet '{sheet}' row {row}: data row before any managing office header")]
    ManagingOfficeNotFound { sheet: String, row: u32 },

    #[error("{entry} is a legacy Excel 5.0/95 workbook")]
    LegacyWorkbook { entry: String },

    #[error("{entry} is not a recognised workbook format")]
    UnknownWorkbook { entry: String },
}
