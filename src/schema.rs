//! Canonical price schema and the normalizer that produces it.
//!
//! Source tables arrive with whatever headers the exporting spreadsheet used
//! (`Commodity`, `Market`, ` Modal Price `, ...). The normalizer folds each
//! header, looks it up in a [`ColumnSynonyms`] table and maps it onto one of the
//! [`CanonicalField`]s. Rows are then coerced field by field into
//! [`CanonicalRecord`]s; any row that cannot supply every required field is
//! dropped and counted in the [`NormalizeReport`].
//!
//! ## Duplicate columns
//!
//! Two raw headers may map to the same canonical field (say `crop` and
//! `commodity`). The column appearing later in source order wins; every such
//! override is logged at `warn` and listed in [`NormalizeReport::overrides`].

use std::{collections::BTreeMap, fmt, str::FromStr};

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{RawCell, RawTable},
    error::DatasetSchemaError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Crop,
    District,
    State,
    Season,
    Month,
    Year,
    ModalPrice,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 7] = [
        CanonicalField::Crop,
        CanonicalField::District,
        CanonicalField::State,
        CanonicalField::Season,
        CanonicalField::Month,
        CanonicalField::Year,
        CanonicalField::ModalPrice,
    ];

    pub const REQUIRED: [CanonicalField; 5] = [
        CanonicalField::Crop,
        CanonicalField::District,
        CanonicalField::Month,
        CanonicalField::Year,
        CanonicalField::ModalPrice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Crop => "crop",
            CanonicalField::District => "district",
            CanonicalField::State => "state",
            CanonicalField::Season => "season",
            CanonicalField::Month => "month",
            CanonicalField::Year => "year",
            CanonicalField::ModalPrice => "modal_price",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded = fold_header(value);
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str() == folded)
            .ok_or_else(|| {
                format!(
                    "Unknown canonical field '{value}'. Expected one of: {}",
                    CanonicalField::ALL.iter().join(", ")
                )
            })
    }
}

const BUILTIN_SYNONYMS: &[(&str, CanonicalField)] = &[
    ("crop", CanonicalField::Crop),
    ("crop_type", CanonicalField::Crop),
    ("commodity", CanonicalField::Crop),
    ("district", CanonicalField::District),
    ("city", CanonicalField::District),
    ("market", CanonicalField::District),
    ("state", CanonicalField::State),
    ("season", CanonicalField::Season),
    ("month", CanonicalField::Month),
    ("year", CanonicalField::Year),
    ("modal_price", CanonicalField::ModalPrice),
    ("modal price", CanonicalField::ModalPrice),
];

/// Header → canonical field lookup, keyed by folded header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSynonyms {
    entries: BTreeMap<String, CanonicalField>,
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ColumnSynonyms {
    pub fn builtin() -> Self {
        let entries = BUILTIN_SYNONYMS
            .iter()
            .map(|(header, field)| ((*header).to_string(), *field))
            .collect();
        Self { entries }
    }

    /// Adds or replaces an entry. The header is folded before storing.
    pub fn insert(&mut self, header: &str, field: CanonicalField) {
        self.entries.insert(fold_header(header), field);
    }

    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (S, CanonicalField)>,
        S: AsRef<str>,
    {
        for (header, field) in extra {
            self.insert(header.as_ref(), field);
        }
        self
    }

    pub fn lookup(&self, header: &str) -> Option<CanonicalField> {
        self.entries.get(&fold_header(header)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Folds a raw header for synonym lookup: strips a leading BOM, trims,
/// collapses inner whitespace runs to one space and lowercases.
pub fn fold_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOverride {
    pub field: CanonicalField,
    pub replaced: String,
    pub winner: String,
}

/// Resolved positions of canonical fields within a raw header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    indices: BTreeMap<CanonicalField, usize>,
    sources: BTreeMap<CanonicalField, String>,
    overrides: Vec<ColumnOverride>,
    ignored: Vec<String>,
}

impl ColumnMapping {
    pub fn resolve(
        headers: &[String],
        synonyms: &ColumnSynonyms,
    ) -> Result<Self, DatasetSchemaError> {
        let mut indices = BTreeMap::new();
        let mut sources: BTreeMap<CanonicalField, String> = BTreeMap::new();
        let mut overrides = Vec::new();
        let mut ignored = Vec::new();
        let mut found_columns = Vec::with_capacity(headers.len());

        for (idx, header) in headers.iter().enumerate() {
            let Some(field) = synonyms.lookup(header) else {
                let folded = fold_header(header);
                debug!("Ignoring unrecognised column '{folded}'");
                found_columns.push(folded);
                ignored.push(header.clone());
                continue;
            };
            found_columns.push(field.as_str().to_string());
            if let Some(previous) = sources.insert(field, header.clone()) {
                warn!(
                    "Columns '{}' and '{}' both map to '{}'; using the later column '{}'",
                    previous.trim(),
                    header.trim(),
                    field,
                    header.trim()
                );
                overrides.push(ColumnOverride {
                    field,
                    replaced: previous,
                    winner: header.clone(),
                });
            }
            indices.insert(field, idx);
        }

        let missing_fields = CanonicalField::ALL
            .iter()
            .filter(|field| field.is_required() && !indices.contains_key(*field))
            .map(|field| field.as_str().to_string())
            .collect::<Vec<_>>();
        if !missing_fields.is_empty() {
            return Err(DatasetSchemaError {
                missing_fields,
                found_columns: found_columns.into_iter().unique().collect(),
            });
        }

        Ok(Self {
            indices,
            sources,
            overrides,
            ignored,
        })
    }

    pub fn index(&self, field: CanonicalField) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn source_header(&self, field: CanonicalField) -> Option<&str> {
        self.sources.get(&field).map(String::as_str)
    }

    pub fn overrides(&self) -> &[ColumnOverride] {
        &self.overrides
    }

    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    fn cell<'a>(&self, row: &'a [RawCell], field: CanonicalField) -> Option<&'a RawCell> {
        self.index(field).and_then(|idx| row.get(idx))
    }
}

/// One cleaned observation. Text fields are trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub crop: String,
    pub district: String,
    pub state: Option<String>,
    pub season: Option<String>,
    pub month: u8,
    pub year: i32,
    pub modal_price: f64,
}

impl CanonicalRecord {
    /// Builds a record from loosely typed cells, returning `None` when any
    /// required field is missing or fails coercion.
    pub fn from_cells(
        crop: &RawCell,
        district: &RawCell,
        state: Option<&RawCell>,
        season: Option<&RawCell>,
        month: &RawCell,
        year: &RawCell,
        modal_price: &RawCell,
    ) -> Option<Self> {
        let month = month
            .as_integer()
            .filter(|m| (1..=12).contains(m))
            .and_then(|m| u8::try_from(m).ok())?;
        // the forecast year is max(year) + 1, so i32::MAX has no successor
        let year = year
            .as_integer()
            .and_then(|y| i32::try_from(y).ok())
            .filter(|y| *y < i32::MAX)?;
        let modal_price = modal_price.as_number().filter(|p| *p >= 0.0)?;
        Some(Self {
            crop: crop.as_key()?,
            district: district.as_key()?,
            state: state.and_then(RawCell::as_key),
            season: season.and_then(RawCell::as_key),
            month,
            year,
            modal_price,
        })
    }
}

/// Immutable, cleaned record set shared by every query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalDataset {
    records: Vec<CanonicalRecord>,
}

impl CanonicalDataset {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-emits the dataset with canonical headers, one column per field.
    pub fn to_raw_table(&self) -> RawTable {
        let headers = CanonicalField::ALL
            .iter()
            .map(|field| field.as_str().to_string())
            .collect();
        let mut table = RawTable::new(headers);
        for record in &self.records {
            table.push_row(vec![
                RawCell::text(record.crop.clone()),
                RawCell::text(record.district.clone()),
                RawCell::from(record.state.clone()),
                RawCell::from(record.season.clone()),
                RawCell::from(i64::from(record.month)),
                RawCell::from(i64::from(record.year)),
                RawCell::Number(record.modal_price),
            ]);
        }
        table
    }
}

/// Load diagnostics returned next to the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub mapped_columns: Vec<(String, CanonicalField)>,
    pub ignored_columns: Vec<String>,
    pub overrides: Vec<ColumnOverride>,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: CanonicalDataset,
    pub report: NormalizeReport,
}

pub fn normalize(
    table: &RawTable,
    synonyms: &ColumnSynonyms,
) -> Result<Normalized, DatasetSchemaError> {
    let mapping = ColumnMapping::resolve(&table.headers, synonyms)?;
    let missing = RawCell::Missing;
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let required = |field| mapping.cell(row, field).unwrap_or(&missing);
        let record = CanonicalRecord::from_cells(
            required(CanonicalField::Crop),
            required(CanonicalField::District),
            mapping.cell(row, CanonicalField::State),
            mapping.cell(row, CanonicalField::Season),
            required(CanonicalField::Month),
            required(CanonicalField::Year),
            required(CanonicalField::ModalPrice),
        );
        if let Some(record) = record {
            records.push(record);
        }
    }

    let rows_read = table.rows.len();
    let rows_kept = records.len();
    let rows_dropped = rows_read - rows_kept;
    if rows_dropped > 0 {
        warn!(
            "Dropped {rows_dropped} of {rows_read} row(s) with missing or invalid required values"
        );
    }

    let mapped_columns = CanonicalField::ALL
        .iter()
        .filter_map(|field| {
            mapping
                .source_header(*field)
                .map(|header| (header.to_string(), *field))
        })
        .collect();

    Ok(Normalized {
        dataset: CanonicalDataset::new(records),
        report: NormalizeReport {
            rows_read,
            rows_kept,
            rows_dropped,
            mapped_columns,
            ignored_columns: mapping.ignored().to_vec(),
            overrides: mapping.overrides().to_vec(),
        },
    })
}
