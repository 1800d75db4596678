//! Format-agnostic raw client tables.
//!
//! Reading spreadsheets happens outside this crate; callers hand over the
//! sheet as headers plus typed cells. Reshapers only ever address columns by
//! header, never by position.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Cell {
    Date(NaiveDate),
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Blank cells and whitespace-only text count as empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            Cell::Date(_) => false,
        }
    }

    /// Cell rendered as trimmed text. Whole numbers lose their fraction so
    /// barcodes read from numeric cells stay intact.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Unit quantity held by the cell. Numbers round to the nearest integer.
    pub fn as_units(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(n.round() as i64),
            Cell::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|n| n.round() as i64))
            }
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => {
                let trimmed = s.trim();
                ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"]
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            }
            _ => None,
        }
    }
}

/// Column header. Wide sheets carry a second header level (e.g. the month
/// name over `Cde.`); single-level sheets leave `sub` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnHeader {
    pub label: String,
    #[serde(default)]
    pub sub: Option<String>,
}

impl ColumnHeader {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sub: None,
        }
    }

    pub fn nested(label: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sub: Some(sub.into()),
        }
    }

    fn matches(&self, label: &str, sub: Option<&str>) -> bool {
        self.label.trim() == label && self.sub.as_deref().map(str::trim) == sub
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawTable {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<ColumnHeader>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Cell>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a single-level column by label.
    pub fn column(&self, label: &str) -> Option<Column> {
        self.find(label, None)
    }

    /// Looks up a two-level column.
    pub fn nested_column(&self, label: &str, sub: &str) -> Option<Column> {
        self.find(label, Some(sub))
    }

    pub fn has_sub_column(&self, sub: &str) -> bool {
        self.headers
            .iter()
            .any(|h| h.sub.as_deref().map(str::trim) == Some(sub))
    }

    fn find(&self, label: &str, sub: Option<&str>) -> Option<Column> {
        self.headers
            .iter()
            .position(|h| h.matches(label, sub))
            .map(Column)
    }
}

static EMPTY: Cell = Cell::Empty;

/// Handle to a resolved column of a [`RawTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column(usize);

impl Column {
    /// Cell of `row` under this column; short rows read as empty.
    pub fn get<'a>(&self, row: &'a [Cell]) -> &'a Cell {
        row.get(self.0).unwrap_or(&EMPTY)
    }
}
