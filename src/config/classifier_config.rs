use crate::buffering::frame_window::DEFAULT_SEQUENCE_LENGTH;
use crate::features::keypoint_layout::FallbackFeatures;
use crate::model::model_contract::DEFAULT_FEATURE_WIDTH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {field}: {value}, must be at least 1")]
    Invalid { field: &'static str, value: usize },
}

/// Settings for building a classification session.
///
/// Every field has a default, so `{}` is a valid config: no model (calls report the model as
/// unavailable), the built-in sign labels, and a `[30, 1662]` fallback contract.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    /// Used when the model does not declare its sequence length.
    pub default_sequence_length: usize,
    /// Used when the model does not declare its feature width.
    pub default_feature_width: usize,
    pub fallback: FallbackFeatures,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            model_path: None,
            labels_path: None,
            default_sequence_length: DEFAULT_SEQUENCE_LENGTH,
            default_feature_width: DEFAULT_FEATURE_WIDTH,
            fallback: FallbackFeatures::Zeros,
            log_filter: "info".to_string(),
        }
    }
}

impl ClassifierConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ClassifierConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a zero window length or feature width. A zero-length window would be "full"
    /// before any frame arrives.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("default_sequence_length", self.default_sequence_length),
            ("default_feature_width", self.default_feature_width),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        Ok(())
    }
}
