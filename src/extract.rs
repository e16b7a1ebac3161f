//! Sheet range to CSV extraction
//!
//! The CSV dialect is fixed by downstream consumers: fields are only quoted
//! when they contain a comma, quotes inside a quoted field are written as
//! `\"`, and newlines inside a cell become the two characters `\n`.

use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cell::Worksheet;
use crate::error::JobError;
use crate::routes::{Directive, Extractor};

/// Start-column suffix marking an AMeDAS section header row
pub const MANAGING_OFFICE_SUFFIX: &str = "気象台管理";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Escape one field for the output dialect
pub fn escape_field(value: &str) -> String {
    let value = value.replace('\n', "\\n");
    if value.contains(',') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value
    }
}

/// Rows for the plain extractor: blank start cells are skipped and every
/// field is trimmed.
pub fn plain_rows(sheet: &Worksheet, directive: &Directive) -> Vec<Vec<String>> {
    let Some(last_row) = sheet.last_row() else {
        return Vec::new();
    };

    (directive.start_row..=last_row)
        .filter(|&row| !sheet.cell(row, directive.start_col).is_blank())
        .map(|row| read_fields(sheet, directive, row, true))
        .collect()
}

/// Rows for the AMeDAS extractor.
///
/// A start cell ending in [`MANAGING_OFFICE_SUFFIX`] opens a section; its text
/// is prepended to every following row. Fields are not trimmed.
pub fn amedas_rows(sheet: &Worksheet, directive: &Directive) -> Result<Vec<Vec<String>>> {
    let Some(last_row) = sheet.last_row() else {
        return Ok(Vec::new());
    };

    let mut office: Option<String> = None;
    let mut rows = Vec::new();

    for row in directive.start_row..=last_row {
        let start = sheet.cell(row, directive.start_col);
        if start.is_blank() {
            continue;
        }

        let text = start.as_text().unwrap_or_default();
        if text.ends_with(MANAGING_OFFICE_SUFFIX) {
            office = Some(text);
            continue;
        }

        let Some(office) = office.as_deref() else {
            return Err(JobError::ManagingOfficeNotFound {
                sheet: sheet.name.clone(),
                row: row + 1,
            }
            .into());
        };

        let mut fields = vec![escape_field(office)];
        fields.extend(read_fields(sheet, directive, row, false));
        rows.push(fields);
    }

    Ok(rows)
}

fn read_fields(sheet: &Worksheet, directive: &Directive, row: u32, trim: bool) -> Vec<String> {
    let end = directive.start_col + directive.columns;
    (directive.start_col..end)
        .map(|col| {
            let text = sheet.cell(row, col).as_text().unwrap_or_default();
            if trim {
                escape_field(text.trim())
            } else {
                escape_field(&text)
            }
        })
        .collect()
}

/// Write already-escaped rows, `\n` terminated, replacing any existing file
pub fn write_csv(path: &Path, rows: &[Vec<String>], bom: bool) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    if bom {
        file.write_all(UTF8_BOM)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Run one directive against its sheet and write `<output>.csv` into
/// `output_dir`. Returns the written path and row count.
pub fn extract(
    sheet: &Worksheet,
    directive: &Directive,
    output_dir: &Path,
) -> Result<(PathBuf, usize)> {
    let path = output_dir.join(format!("{}.csv", directive.output));

    let (rows, bom) = match directive.extractor {
        Extractor::Plain => (plain_rows(sheet, directive), false),
        Extractor::Amedas => (amedas_rows(sheet, directive)?, true),
    };
    write_csv(&path, &rows, bom)?;

    info!("  {} -> {} ({} rows)", sheet.name, path.display(), rows.len());
    Ok((path, rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Range};
    use std::fs;
    use tempfile::TempDir;

    fn directive(extractor: Extractor, start: (u32, u32), columns: u32) -> Directive {
        Directive {
            sheet: "s",
            output: "Out",
            start_row: start.0,
            start_col: start.1,
            columns,
            extractor,
        }
    }

    /// Build a worksheet from string rows; "" leaves the cell empty
    fn sheet(rows: &[&[&str]]) -> Worksheet {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1).max(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, cells) in rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    range.set_value((r as u32, c as u32), Data::String(value.to_string()));
                }
            }
        }
        Worksheet::new("s", range, Range::empty())
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\", ok"), "\"say \\\"hi\\\", ok\"");
        // Quotes without a comma are left alone
        assert_eq!(escape_field("5\" gun"), "5\" gun");
        assert_eq!(escape_field("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_field("a\nb,c"), "\"a\\nb,c\"");
    }

    #[test]
    fn test_escaped_fields_never_contain_newlines() {
        for value in ["\n", "a\n\nb", "x,\ny", "\"\n\","] {
            assert!(!escape_field(value).contains('\n'));
        }
    }

    #[test]
    fn test_plain_skips_blank_start_cells_and_trims() {
        let s = sheet(&[
            &["title"],
            &["code", "name", "kana"],
            &[" 011000 ", " 宗谷地方 ", "そうや"],
            &["", "orphan", "x"],
            &["  ", "spaces", "x"],
            &["012000", "上川,留萌", "a\nb"],
        ]);

        let rows = plain_rows(&s, &directive(Extractor::Plain, (2, 0), 3));
        assert_eq!(
            rows,
            vec![
                vec!["011000", "宗谷地方", "そうや"],
                vec!["012000", "\"上川,留萌\"", "a\\nb"],
            ]
        );
    }

    #[test]
    fn test_plain_reads_past_used_columns_as_empty() {
        let s = sheet(&[&["a", "b"]]);
        let rows = plain_rows(&s, &directive(Extractor::Plain, (0, 0), 4));
        assert_eq!(rows, vec![vec!["a", "b", "", ""]]);
    }

    #[test]
    fn test_plain_offset_start_column() {
        let s = sheet(&[&["skip", "", "x"], &["ignored", "100", "全国"]]);
        let rows = plain_rows(&s, &directive(Extractor::Plain, (0, 1), 2));
        assert_eq!(rows, vec![vec!["100", "全国"]]);
    }

    #[test]
    fn test_start_row_beyond_sheet_yields_nothing() {
        let s = sheet(&[&["a"]]);
        assert!(plain_rows(&s, &directive(Extractor::Plain, (3, 0), 1)).is_empty());
    }

    #[test]
    fn test_amedas_prepends_latest_office() {
        let s = sheet(&[
            &["header"],
            &["稚内地方気象台管理"],
            &["11001", "宗谷岬"],
            &["11016", "稚内"],
            &["旭川地方気象台管理"],
            &["12011", "朱鞠内"],
        ]);

        let rows = amedas_rows(&s, &directive(Extractor::Amedas, (1, 0), 2)).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["稚内地方気象台管理", "11001", "宗谷岬"],
                vec!["稚内地方気象台管理", "11016", "稚内"],
                vec!["旭川地方気象台管理", "12011", "朱鞠内"],
            ]
        );
    }

    #[test]
    fn test_amedas_does_not_trim() {
        // Plain trims every field, AMeDAS keeps cell text as-is
        let s = sheet(&[&["札幌管区気象台管理"], &["14163", " 札幌 "]]);
        let rows = amedas_rows(&s, &directive(Extractor::Amedas, (0, 0), 2)).unwrap();
        assert_eq!(rows, vec![vec!["札幌管区気象台管理", "14163", " 札幌 "]]);

        let rows = plain_rows(&s, &directive(Extractor::Plain, (1, 0), 2));
        assert_eq!(rows, vec![vec!["14163", "札幌"]]);
    }

    #[test]
    fn test_amedas_data_before_header_is_fatal() {
        let s = sheet(&[&["header"], &["11001", "宗谷岬"], &["稚内地方気象台管理"]]);
        let err = amedas_rows(&s, &directive(Extractor::Amedas, (1, 0), 2)).unwrap_err();
        match err.downcast_ref::<JobError>() {
            Some(JobError::ManagingOfficeNotFound { sheet, row }) => {
                assert_eq!(sheet, "s");
                assert_eq!(*row, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extract_writes_lf_terminated_file() {
        let dir = TempDir::new().unwrap();
        let s = sheet(&[&["a", "b,c"], &["", "skip"], &["d", "e"]]);

        let (path, count) = extract(&s, &directive(Extractor::Plain, (0, 0), 2), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("Out.csv"));
        assert_eq!(count, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,\"b,c\"\nd,e\n");
    }

    #[test]
    fn test_extract_overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Out.csv"), "stale\nstale\nstale\n").unwrap();

        let s = sheet(&[&["fresh"]]);
        extract(&s, &directive(Extractor::Plain, (0, 0), 1), dir.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("Out.csv")).unwrap(),
            "fresh\n"
        );
    }

    #[test]
    fn test_amedas_output_has_bom() {
        let dir = TempDir::new().unwrap();
        let s = sheet(&[&["東京管区気象台管理"], &["44132", "東京"]]);

        extract(&s, &directive(Extractor::Amedas, (0, 0), 2), dir.path()).unwrap();
        let bytes = fs::read(dir.path().join("Out.csv")).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(
            std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap(),
            "東京管区気象台管理,44132,東京\n"
        );
    }
}
