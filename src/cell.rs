//! Spreadsheet cell values and their text form

use calamine::{Data, Range};

/// A cell as seen by the extractors, independent of the workbook backend
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Numeric(f64),
    Boolean(bool),
    Formula(String),
    Empty,
}

impl CellValue {
    /// Text used in the CSV output. `None` for cells with no text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::String(s) => Some(s.clone()),
            CellValue::Numeric(n) => Some(n.to_string()),
            CellValue::Boolean(true) => Some("True".to_string()),
            CellValue::Boolean(false) => Some("False".to_string()),
            CellValue::Formula(f) => Some(f.clone()),
            CellValue::Empty => None,
        }
    }

    /// True when the cell has no text or only whitespace
    pub fn is_blank(&self) -> bool {
        self.as_text().map_or(true, |s| s.trim().is_empty())
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                CellValue::String(s.clone())
            }
            Data::Int(i) => CellValue::Numeric(*i as f64),
            Data::Float(f) => CellValue::Numeric(*f),
            Data::DateTime(dt) => CellValue::Numeric(dt.as_f64()),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

/// One worksheet: cached cell values plus formula text where present.
///
/// Positions are absolute (0-based) sheet coordinates.
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    values: Range<Data>,
    formulas: Range<String>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, values: Range<Data>, formulas: Range<String>) -> Self {
        Self {
            name: name.into(),
            values,
            formulas,
        }
    }

    /// Index of the last row holding a value or formula, if any
    pub fn last_row(&self) -> Option<u32> {
        let values = self.values.end().map(|(row, _)| row);
        let formulas = self.formulas.end().map(|(row, _)| row);
        values.max(formulas)
    }

    pub fn cell(&self, row: u32, col: u32) -> CellValue {
        if let Some(formula) = self.formulas.get_value((row, col)) {
            if !formula.is_empty() {
                return CellValue::Formula(formula.clone());
            }
        }
        self.values
            .get_value((row, col))
            .map_or(CellValue::Empty, CellValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_per_variant() {
        assert_eq!(CellValue::String("札幌".into()).as_text().as_deref(), Some("札幌"));
        assert_eq!(CellValue::Numeric(47401.0).as_text().as_deref(), Some("47401"));
        assert_eq!(CellValue::Numeric(141.5).as_text().as_deref(), Some("141.5"));
        assert_eq!(CellValue::Boolean(true).as_text().as_deref(), Some("True"));
        assert_eq!(CellValue::Boolean(false).as_text().as_deref(), Some("False"));
        assert_eq!(CellValue::Formula("A1&B1".into()).as_text().as_deref(), Some("A1&B1"));
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::String(" \t\u{3000}".into()).is_blank());
        assert!(!CellValue::String(" x ".into()).is_blank());
        assert!(!CellValue::Numeric(0.0).is_blank());
    }

    #[test]
    fn test_from_calamine_data() {
        assert_eq!(CellValue::from(&Data::Int(12)), CellValue::Numeric(12.0));
        assert_eq!(CellValue::from(&Data::Bool(true)), CellValue::Boolean(true));
        assert_eq!(
            CellValue::from(&Data::String("x".into())),
            CellValue::String("x".into())
        );
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_worksheet_prefers_formula_text() {
        let mut values = Range::new((0, 0), (1, 1));
        values.set_value((0, 0), Data::Float(3.0));
        values.set_value((1, 1), Data::String("b".into()));
        let mut formulas = Range::new((0, 0), (0, 0));
        formulas.set_value((0, 0), "1+2".to_string());

        let sheet = Worksheet::new("s", values, formulas);
        assert_eq!(sheet.cell(0, 0), CellValue::Formula("1+2".into()));
        assert_eq!(sheet.cell(1, 1), CellValue::String("b".into()));
        assert_eq!(sheet.cell(1, 0), CellValue::Empty);
        assert_eq!(sheet.cell(9, 9), CellValue::Empty);
        assert_eq!(sheet.last_row(), Some(1));
    }

    #[test]
    fn test_empty_worksheet_has_no_last_row() {
        let sheet = Worksheet::new("s", Range::empty(), Range::empty());
        assert_eq!(sheet.last_row(), None);
    }
}
