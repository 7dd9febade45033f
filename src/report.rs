//! Dataset coverage summary for the `inspect` command.

use std::collections::{BTreeMap, BTreeSet};

use itertools::{Itertools, MinMaxResult};

use crate::schema::{CanonicalDataset, NormalizeReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCoverage {
    pub crop: String,
    pub rows: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub months: BTreeSet<u8>,
    pub districts: usize,
    pub states: usize,
}

pub fn crop_coverage(dataset: &CanonicalDataset) -> Vec<CropCoverage> {
    let by_crop = dataset
        .records()
        .iter()
        .into_group_map_by(|record| record.crop.as_str());

    by_crop
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(crop, records)| {
            let (first_year, last_year) = match records.iter().map(|r| r.year).minmax() {
                MinMaxResult::NoElements => (0, 0),
                MinMaxResult::OneElement(year) => (year, year),
                MinMaxResult::MinMax(min, max) => (min, max),
            };
            CropCoverage {
                crop: crop.to_string(),
                rows: records.len(),
                first_year,
                last_year,
                months: records.iter().map(|r| r.month).collect(),
                districts: records.iter().map(|r| r.district.as_str()).unique().count(),
                states: records
                    .iter()
                    .filter_map(|r| r.state.as_deref())
                    .unique()
                    .count(),
            }
        })
        .collect()
}

pub fn coverage_rows(coverage: &[CropCoverage]) -> Vec<Vec<String>> {
    coverage
        .iter()
        .map(|c| {
            vec![
                c.crop.clone(),
                c.rows.to_string(),
                if c.first_year == c.last_year {
                    c.first_year.to_string()
                } else {
                    format!("{}-{}", c.first_year, c.last_year)
                },
                c.months.iter().join(","),
                c.districts.to_string(),
                c.states.to_string(),
            ]
        })
        .collect()
}

pub fn coverage_headers() -> Vec<String> {
    ["crop", "rows", "years", "months", "districts", "states"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn mapping_rows(report: &NormalizeReport) -> Vec<Vec<String>> {
    let mut rows = report
        .mapped_columns
        .iter()
        .map(|(header, field)| vec![header.clone(), field.to_string(), String::new()])
        .collect::<Vec<_>>();
    for overridden in &report.overrides {
        rows.push(vec![
            overridden.replaced.clone(),
            overridden.field.to_string(),
            format!("overridden by '{}'", overridden.winner),
        ]);
    }
    for ignored in &report.ignored_columns {
        rows.push(vec![ignored.clone(), String::new(), "ignored".to_string()]);
    }
    rows
}

pub fn mapping_headers() -> Vec<String> {
    ["column", "maps_to", "note"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Rows per district for one crop; used by `inspect --crop`.
pub fn district_counts(dataset: &CanonicalDataset, crop: &str) -> BTreeMap<String, usize> {
    dataset
        .records()
        .iter()
        .filter(|r| r.crop == crop)
        .map(|r| r.district.clone())
        .counts()
        .into_iter()
        .collect()
}
