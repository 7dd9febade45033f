//! Query entry point over a loaded dataset.
//!
//! A [`PriceEngine`] owns its [`CanonicalDataset`] behind an `Arc` and never
//! mutates it, so one engine can be cloned into any number of request
//! handlers or threads. Every call to [`PriceEngine::predict`] is an
//! independent computation over that shared data.

use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::{
    data::RawTable,
    error::{DatasetSchemaError, PredictError, PredictResult},
    resolve::{self, SourceLevel},
    schema::{self, CanonicalDataset, ColumnSynonyms, NormalizeReport},
    trend,
    validate::{self, NormalizedQuery, RawQuery},
};

pub const DEFAULT_UNIT: &str = "INR/quintal";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub unit: String,
    pub target_year: i32,
    pub sample_size: usize,
    pub source_level: SourceLevel,
    pub input: NormalizedQuery,
}

#[derive(Debug, Clone)]
pub struct PriceEngine {
    dataset: Arc<CanonicalDataset>,
    unit: String,
}

impl PriceEngine {
    pub fn new(dataset: CanonicalDataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            unit: DEFAULT_UNIT.to_string(),
        }
    }

    /// An engine with no usable data. Every query fails with
    /// [`PredictError::DatasetUnavailable`].
    pub fn unavailable() -> Self {
        Self::new(CanonicalDataset::default())
    }

    /// Normalizes `table` and builds an engine over the result.
    pub fn from_raw(
        table: &RawTable,
        synonyms: &ColumnSynonyms,
    ) -> Result<(Self, NormalizeReport), DatasetSchemaError> {
        let normalized = schema::normalize(table, synonyms)?;
        info!(
            "Loaded {} usable row(s) of {} ({} dropped)",
            normalized.report.rows_kept, normalized.report.rows_read, normalized.report.rows_dropped
        );
        Ok((Self::new(normalized.dataset), normalized.report))
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn dataset(&self) -> &CanonicalDataset {
        &self.dataset
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn is_available(&self) -> bool {
        !self.dataset.is_empty()
    }

    pub fn predict(&self, query: &RawQuery) -> PredictResult<PredictionResult> {
        if !self.is_available() {
            return Err(PredictError::DatasetUnavailable);
        }
        let query = validate::validate(query)?;
        self.predict_normalized(query)
    }

    fn predict_normalized(&self, query: NormalizedQuery) -> PredictResult<PredictionResult> {
        let subset = resolve::resolve(&self.dataset, &query)?;
        let forecast = trend::predict(&subset);
        Ok(PredictionResult {
            predicted_price: forecast.predicted_price,
            unit: self.unit.clone(),
            target_year: forecast.target_year,
            sample_size: subset.len(),
            source_level: subset.level,
            input: query,
        })
    }
}
