//! Raw tabular input as handed to the normalizer.
//!
//! A [`RawTable`] keeps the source column order (the normalizer's duplicate
//! column policy depends on it) and stores every cell as a [`RawCell`]. Cells
//! carry no schema: coercion into text or numbers happens only when the
//! normalizer or validator asks for it.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawCell {
    #[default]
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        RawCell::Text(value.into())
    }

    /// Builds a cell from a decoded CSV field; empty fields become missing.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            RawCell::Missing
        } else {
            RawCell::Text(field.to_string())
        }
    }

    /// Trimmed, lowercased text form; `None` when missing or blank.
    pub fn as_key(&self) -> Option<String> {
        let rendered = match self {
            RawCell::Missing => return None,
            RawCell::Bool(b) => b.to_string(),
            RawCell::Number(n) => format_number(*n),
            RawCell::Text(s) => s.clone(),
        };
        let key = fold_text(&rendered);
        (!key.is_empty()).then_some(key)
    }

    /// Numeric coercion. Anything that does not parse is treated as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawCell::Number(n) if n.is_finite() => Some(*n),
            RawCell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Integer coercion for whole-number values such as `3`, `"3"` or `3.0`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawCell::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| whole_number(trimmed.parse::<f64>().ok()?))
            }
            RawCell::Number(n) => whole_number(*n),
            _ => None,
        }
    }

    /// True for any whole-number value, including ones too large for `i64`.
    pub fn is_integral(&self) -> bool {
        match self {
            RawCell::Text(s) => {
                let trimmed = s.trim();
                let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
                (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                    || trimmed
                        .parse::<f64>()
                        .is_ok_and(|n| n.is_finite() && n.fract() == 0.0)
            }
            RawCell::Number(n) => n.is_finite() && n.fract() == 0.0,
            _ => false,
        }
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCell::Missing => Ok(()),
            RawCell::Bool(b) => write!(f, "{b}"),
            RawCell::Number(n) => write!(f, "{}", format_number(*n)),
            RawCell::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        RawCell::Number(value as f64)
    }
}

impl<T: Into<RawCell>> From<Option<T>> for RawCell {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawCell::Missing, Into::into)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Pads or truncates the row to the header width before storing it.
    pub fn push_row(&mut self, mut row: Vec<RawCell>) {
        row.resize(self.headers.len(), RawCell::Missing);
        self.rows.push(row);
    }

    /// Assembles a table from mapping-shaped rows.
    ///
    /// Columns are ordered by first appearance across all rows; a row lacking
    /// a column gets a missing cell there.
    pub fn from_records<I, R, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawCell>,
    {
        let mut table = RawTable::default();
        for record in records {
            let mut row = vec![RawCell::Missing; table.headers.len()];
            for (key, value) in record {
                let key = key.into();
                let idx = match table.headers.iter().position(|h| *h == key) {
                    Some(idx) => idx,
                    None => {
                        table.headers.push(key);
                        row.push(RawCell::Missing);
                        table.headers.len() - 1
                    }
                };
                row[idx] = value.into();
            }
            table.rows.push(row);
        }
        let width = table.headers.len();
        for row in &mut table.rows {
            row.resize(width, RawCell::Missing);
        }
        table
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Matching key for text values: trimmed and lowercased.
pub fn fold_text(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn whole_number(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then_some(value as i64)
}
