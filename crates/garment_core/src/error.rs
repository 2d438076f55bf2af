//! Error types for the garment deformation core.

use thiserror::Error;

/// Errors raised by the body model, the skinner and the garment pipeline.
#[derive(Debug, Error)]
pub enum GarmentError {
    /// A tensor does not have the size its consumer expects.
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// What was being checked.
        what: String,
        /// The expected shape.
        expected: String,
        /// The shape that was received.
        found: String,
    },

    /// The parent table is not in topological order.
    #[error("joint {joint} references parent {parent}, which is not an earlier joint")]
    MissingJointParent {
        /// The offending joint.
        joint: usize,
        /// Its declared parent.
        parent: i64,
    },

    /// A learned model failed or returned an unexpected shape.
    #[error("external model '{model}' failed: {reason}")]
    ExternalModel {
        /// Role of the model in the pipeline.
        model: String,
        /// Why its output was rejected.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A mesh file could not be parsed.
    #[error("malformed obj at line {line}: {reason}")]
    ObjParse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to read npz: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

impl GarmentError {
    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(what: impl Into<String>, expected: impl std::fmt::Debug, found: impl std::fmt::Debug) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
        }
    }

    /// Creates an external model error.
    #[must_use]
    pub fn external_model(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalModel {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for garment operations.
pub type Result<T> = std::result::Result<T, GarmentError>;

/// Fails with [`GarmentError::ShapeMismatch`] unless `found == expected`.
pub(crate) fn ensure_shape(what: &str, expected: &[usize], found: &[usize]) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(GarmentError::shape_mismatch(what, expected, found))
    }
}
