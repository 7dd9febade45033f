use serde::Serialize;
use thiserror::Error;

/// Raised at load time when required semantic columns cannot be identified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Dataset missing required columns: {missing_fields:?}. Found columns: {found_columns:?}")]
pub struct DatasetSchemaError {
    pub missing_fields: Vec<String>,
    pub found_columns: Vec<String>,
}

/// Per-query failures. All of them are terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("{message}")]
    Validation { message: String },
    #[error("Not enough data for this crop+district+month")]
    InsufficientData {
        required_min_samples: usize,
        found_samples: usize,
    },
    #[error("Dataset is not loaded correctly on server")]
    DatasetUnavailable,
}

impl PredictError {
    pub fn validation(message: impl Into<String>) -> Self {
        PredictError::Validation {
            message: message.into(),
        }
    }

    /// HTTP-style status a transport layer should report for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PredictError::Validation { .. } | PredictError::InsufficientData { .. } => 400,
            PredictError::DatasetUnavailable => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (required_min_samples, found_samples) = match self {
            PredictError::InsufficientData {
                required_min_samples,
                found_samples,
            } => (Some(*required_min_samples), Some(*found_samples)),
            _ => (None, None),
        };
        ErrorBody {
            error: self.to_string(),
            required_min_samples,
            found_samples,
        }
    }
}

/// Wire shape for a failed prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_min_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_samples: Option<usize>,
}

pub type PredictResult<T> = std::result::Result<T, PredictError>;
