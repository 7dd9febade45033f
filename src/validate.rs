//! Shape checks for inbound prediction queries.
//!
//! Validation is purely syntactic: it never consults the dataset.

use serde::{Deserialize, Serialize};

use crate::{
    data::RawCell,
    error::{PredictError, PredictResult},
};

/// A query exactly as received from an untrusted caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawQuery {
    #[serde(default)]
    pub crop: RawCell,
    #[serde(default)]
    pub district: RawCell,
    #[serde(default)]
    pub month: RawCell,
}

impl RawQuery {
    pub fn new(
        crop: impl Into<RawCell>,
        district: impl Into<RawCell>,
        month: impl Into<RawCell>,
    ) -> Self {
        Self {
            crop: crop.into(),
            district: district.into(),
            month: month.into(),
        }
    }
}

/// A validated query; also echoed back in every prediction result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedQuery {
    pub crop: String,
    pub district: String,
    pub month: u8,
}

pub fn validate(query: &RawQuery) -> PredictResult<NormalizedQuery> {
    let crop = query
        .crop
        .as_key()
        .ok_or_else(|| PredictError::validation("crop is required"))?;
    let district = query
        .district
        .as_key()
        .ok_or_else(|| PredictError::validation("district is required"))?;
    let out_of_range = || PredictError::validation("month must be between 1 and 12");
    let month = match query.month.as_integer() {
        Some(month) => month,
        None if query.month.is_integral() => return Err(out_of_range()),
        None => return Err(PredictError::validation("month must be an integer (1-12)")),
    };
    if !(1..=12).contains(&month) {
        return Err(out_of_range());
    }
    Ok(NormalizedQuery {
        crop,
        district,
        month: month as u8,
    })
}
