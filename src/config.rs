//! Optional YAML settings file.
//!
//! ```yaml
//! unit: INR/quintal
//! column_synonyms:
//!   mandi: district
//!   price: modal_price
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    engine::DEFAULT_UNIT,
    schema::{CanonicalField, ColumnSynonyms},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_synonyms: BTreeMap<String, CanonicalField>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Opening YAML file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Parsing settings from {path:?}"))
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn unit(&self) -> &str {
        self.unit.as_deref().unwrap_or(DEFAULT_UNIT)
    }

    /// Built-in synonyms with this file's entries layered on top.
    pub fn synonyms(&self) -> ColumnSynonyms {
        ColumnSynonyms::builtin().with_extra(
            self.column_synonyms
                .iter()
                .map(|(header, field)| (header.as_str(), *field)),
        )
    }
}
