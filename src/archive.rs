//! Walk the code table archive and extract every routed workbook

use anyhow::{Context, Result};
use calamine::{Range, Reader, Sheets, Xls, Xlsx};
use encoding_rs::SHIFT_JIS;
use log::{info, warn};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::cell::Worksheet;
use crate::error::JobError;
use crate::extract::extract;
use crate::routes::{route_for, RoutingRule, WORKBOOK_EXTENSION};

pub type Workbook = Sheets<Cursor<Vec<u8>>>;

/// OLE2 compound file header (binary `.xls`)
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
/// ZIP local file header (OOXML workbooks)
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// Workbook stream of Excel 97 and later
const BIFF8_STREAM: &str = "/Workbook";
/// Workbook stream of Excel 5.0/95
const BIFF5_STREAM: &str = "/Book";
/// Upper bound on the buffer reserved from an entry's declared size
const MAX_PREALLOC: usize = 64 << 20;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub entries: usize,
    pub workbooks: usize,
    pub skipped_legacy: usize,
    pub files_written: usize,
}

/// Extract every routed sheet from the archive into `output_dir`.
///
/// Entries in a legacy binary format are logged and skipped; any other
/// failure aborts.
pub fn extract_archive(
    bytes: Vec<u8>,
    routes: &[RoutingRule],
    output_dir: &Path,
) -> Result<ArchiveSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Failed to open archive")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let mut summary = ArchiveSummary::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Failed to read archive entry #{}", index))?;
        let name = decode_entry_name(entry.name_raw(), entry.name());
        summary.entries += 1;
        info!("{}", name);

        if !name.ends_with(WORKBOOK_EXTENSION) {
            continue;
        }

        // Buffer the whole entry; the workbook readers need to seek
        let mut buf = Vec::with_capacity(initial_capacity(entry.size()));
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to decompress {}", name))?;

        let mut workbook = match open_workbook(&name, buf) {
            Ok(workbook) => workbook,
            Err(e) if is_legacy(&e) => {
                warn!("Skipped (legacy Excel format): {}", name);
                summary.skipped_legacy += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        summary.workbooks += 1;

        let Some(rule) = route_for(routes, &name) else {
            continue;
        };

        for directive in rule.directives {
            let sheet = load_sheet(&mut workbook, directive.sheet)
                .with_context(|| format!("Failed to extract from {}", name))?;
            extract(&sheet, directive, output_dir)?;
            summary.files_written += 1;
        }
    }

    Ok(summary)
}

/// The declared size comes from the archive header and is not trusted
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC))
}

fn is_legacy(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<JobError>(),
        Some(JobError::LegacyWorkbook { .. })
    )
}

/// Entry names carry no UTF-8 flag and are Shift_JIS on the wire.
///
/// The zip reader returns flagged names verbatim and maps everything else
/// through CP437, which never reproduces non-ASCII bytes unchanged.
pub fn decode_entry_name(raw: &[u8], decoded: &str) -> String {
    if decoded.as_bytes() == raw {
        return decoded.to_string();
    }
    let (name, _) = SHIFT_JIS.decode_without_bom_handling(raw);
    name.into_owned()
}

/// Open workbook bytes, choosing the reader from the file signature.
///
/// Compound files holding only an Excel 5.0/95 `Book` stream are reported as
/// `JobError::LegacyWorkbook`.
pub fn open_workbook(entry: &str, bytes: Vec<u8>) -> Result<Workbook> {
    if bytes.starts_with(&OLE_SIGNATURE) {
        if is_biff5_container(&bytes)
            .with_context(|| format!("Failed to read compound file: {}", entry))?
        {
            return Err(JobError::LegacyWorkbook {
                entry: entry.to_string(),
            }
            .into());
        }
        let xls = Xls::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to read workbook: {}", entry))?;
        return Ok(Sheets::Xls(xls));
    }

    if bytes.starts_with(&ZIP_SIGNATURE) {
        let xlsx = Xlsx::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to read workbook: {}", entry))?;
        return Ok(Sheets::Xlsx(xlsx));
    }

    Err(JobError::UnknownWorkbook {
        entry: entry.to_string(),
    }
    .into())
}

fn is_biff5_container(bytes: &[u8]) -> std::io::Result<bool> {
    let container = cfb::CompoundFile::open(Cursor::new(bytes))?;
    Ok(!container.is_stream(BIFF8_STREAM) && container.is_stream(BIFF5_STREAM))
}

/// Load cell values and formulas of the named sheet
pub fn load_sheet(workbook: &mut Workbook, name: &str) -> Result<Worksheet> {
    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(JobError::SheetNotFound {
            sheet: name.to_string(),
        }
        .into());
    }

    let values = workbook
        .worksheet_range(name)
        .with_context(|| format!("Failed to read sheet: {}", name))?;

    let formulas = match workbook.worksheet_formula(name) {
        Ok(formulas) => formulas,
        Err(e) => {
            warn!("Formulas unavailable in sheet {}: {}", name, e);
            Range::empty()
        }
    };

    Ok(Worksheet::new(name, values, formulas))
}
