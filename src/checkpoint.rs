//! Checkpointing: persist weight values as a named-matrix-of-floats structure.
//!
//! Only parameter `data` values are saved (JSON via serde); the computation
//! graph itself is never serialized. Loading writes the floats back into the
//! live weight store, so node identity and optimizer state stay intact.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A snapshot of every weight matrix, keyed by parameter name.
///
/// Produced by [`WeightStore::export_values`](crate::model::WeightStore::export_values)
/// and consumed by [`WeightStore::import_values`](crate::model::WeightStore::import_values).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Matrix rows of plain floats per parameter name.
    pub weights: BTreeMap<String, Vec<Vec<f64>>>,
}

impl Checkpoint {
    /// Writes the checkpoint to `path` as JSON.
    ///
    /// # Errors
    ///
    /// - [`CheckpointError::Io`] when the file cannot be written.
    /// - [`CheckpointError::Format`] when serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(self)
            .map_err(|e| CheckpointError::Format(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a checkpoint from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CheckpointError::Io`] when the file cannot be read.
    /// - [`CheckpointError::Format`] when the content is not a valid checkpoint.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| CheckpointError::Format(e.to_string()))
    }
}

/// Errors produced when saving, loading, or applying a checkpoint.
///
/// # Variants
///
/// - **Io**: Reading or writing the checkpoint file failed.
///   *Recovery*: Check the path and permissions; see the source for details.
///
/// - **Format**: The file exists but is not a valid checkpoint (or the
///   snapshot could not be serialized).
///   *Recovery*: Point at a checkpoint produced by this crate, or retrain.
///
/// - **ShapeMismatch**: The checkpoint's matrices do not match the live
///   model's names or dimensions (e.g. different vocab size or layer count).
///   *Recovery*: Load into a model built with the same configuration the
///   checkpoint was trained with.
#[derive(Debug)]
pub enum CheckpointError {
    /// I/O error while reading or writing the checkpoint file.
    Io(std::io::Error),

    /// The file content is not a valid checkpoint.
    Format(String),

    /// Checkpoint shapes do not match the live weight store.
    ShapeMismatch {
        /// Parameter name that failed to match (or a summary when names differ).
        name: String,
        /// Human-readable description of the mismatch.
        message: String,
    },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "checkpoint io: {e}"),
            CheckpointError::Format(m) => write!(f, "checkpoint format: {m}"),
            CheckpointError::ShapeMismatch { name, message } => {
                write!(f, "checkpoint shape mismatch at {name:?}: {message}")
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(e) => Some(e),
            CheckpointError::Format(_) | CheckpointError::ShapeMismatch { .. } => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        CheckpointError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_checkpoint() -> Checkpoint {
        let mut weights = BTreeMap::new();
        weights.insert("w".to_string(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        Checkpoint { weights }
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = std::env::temp_dir().join("picogpt_checkpoint_roundtrip.json");
        let ckpt = sample_checkpoint();
        ckpt.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.weights, ckpt.weights);
    }

    #[test]
    fn load_missing_file_returns_io_error() {
        let result = Checkpoint::load("/nonexistent/picogpt_never_exists.json");
        assert!(matches!(result, Err(CheckpointError::Io(_))));
    }

    #[test]
    fn load_invalid_json_returns_format_error() {
        let path = std::env::temp_dir().join("picogpt_checkpoint_invalid.json");
        std::fs::write(&path, "not json at all").unwrap();
        let result = Checkpoint::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(CheckpointError::Format(_))));
    }

    #[test]
    fn error_display_mentions_cause() {
        let e = CheckpointError::ShapeMismatch {
            name: "wte".to_string(),
            message: "expected 10 rows, found 12".to_string(),
        };
        let s = e.to_string();
        assert!(s.contains("wte"));
        assert!(s.contains("10 rows"));
    }
}
