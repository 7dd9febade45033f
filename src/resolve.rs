//! Three-tier data selection: district, then state, then global.
//!
//! Each tier widens the location filter while keeping crop and month fixed.
//! The first tier holding at least [`MIN_SAMPLES`] records wins. The state tier
//! looks up the states declared by any record of the queried district; a
//! district spelled inconsistently across rows simply finds fewer states.

use std::{collections::BTreeSet, fmt};

use log::debug;
use serde::Serialize;

use crate::{
    error::{PredictError, PredictResult},
    schema::{CanonicalDataset, CanonicalRecord},
    validate::NormalizedQuery,
};

/// Fewest points that define a non-degenerate trend line.
pub const MIN_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLevel {
    District,
    State,
    Global,
}

impl SourceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLevel::District => "district",
            SourceLevel::State => "state",
            SourceLevel::Global => "global",
        }
    }
}

impl fmt::Display for SourceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records chosen for one query, borrowed from the shared dataset.
#[derive(Debug, Clone)]
pub struct SelectedSubset<'a> {
    pub records: Vec<&'a CanonicalRecord>,
    pub level: SourceLevel,
}

impl SelectedSubset<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.records.iter().map(|r| (r.year, r.modal_price))
    }
}

pub fn resolve<'a>(
    dataset: &'a CanonicalDataset,
    query: &NormalizedQuery,
) -> PredictResult<SelectedSubset<'a>> {
    let same_crop_month = |record: &&CanonicalRecord| {
        record.crop == query.crop && record.month == query.month
    };

    let district = select(dataset, |r| {
        same_crop_month(r) && r.district == query.district
    });
    debug!(
        "district tier for {}/{}/{}: {} row(s)",
        query.crop,
        query.district,
        query.month,
        district.len()
    );
    if district.len() >= MIN_SAMPLES {
        return Ok(SelectedSubset {
            records: district,
            level: SourceLevel::District,
        });
    }

    let states = states_for_district(dataset, &query.district);
    if states.is_empty() {
        debug!("state tier skipped: no state recorded for '{}'", query.district);
    } else {
        let state = select(dataset, |r| {
            same_crop_month(r)
                && r.state
                    .as_deref()
                    .is_some_and(|state| states.contains(state))
        });
        debug!("state tier over {states:?}: {} row(s)", state.len());
        if state.len() >= MIN_SAMPLES {
            return Ok(SelectedSubset {
                records: state,
                level: SourceLevel::State,
            });
        }
    }

    let global = select(dataset, same_crop_month);
    debug!("global tier: {} row(s)", global.len());
    if global.len() >= MIN_SAMPLES {
        return Ok(SelectedSubset {
            records: global,
            level: SourceLevel::Global,
        });
    }

    Err(PredictError::InsufficientData {
        required_min_samples: MIN_SAMPLES,
        found_samples: global.len(),
    })
}

/// Distinct states declared by any record of `district`, across all crops
/// and months.
pub fn states_for_district<'a>(dataset: &'a CanonicalDataset, district: &str) -> BTreeSet<&'a str> {
    dataset
        .records()
        .iter()
        .filter(|r| r.district == district)
        .filter_map(|r| r.state.as_deref())
        .collect()
}

fn select<'a, F>(dataset: &'a CanonicalDataset, predicate: F) -> Vec<&'a CanonicalRecord>
where
    F: Fn(&&'a CanonicalRecord) -> bool,
{
    dataset.records().iter().filter(predicate).collect()
}
