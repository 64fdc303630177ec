//! Error types for site residency and hopping analysis.
//!
//! Every failure is local to one reference atom: an analysis either completes
//! fully or returns one of these variants. Nothing here is retryable.

use thiserror::Error;

use crate::frames::AtomId;

/// Unified error type for trajectory building, smoothing and site assignment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HoppingError {
    /// Requested species is not a key of the selection mapping.
    #[error("Invalid species selection '{species}' (known species: {known:?})")]
    InvalidSpecies { species: String, known: Vec<String> },

    /// Smoothing window is even, too short, too long for the series, or
    /// not larger than the polynomial order.
    #[error("Malformed smoothing window: {0}")]
    MalformedWindow(String),

    /// Input has no candidates or no frames, so no site can be determined.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Non-finite or mutually inconsistent scalar parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Requested frame window does not fit inside the trajectory.
    #[error("Frame range [{start}, {end}) is invalid for a trajectory of {n_frames} frames")]
    FrameRange {
        start: usize,
        end: usize,
        n_frames: usize,
    },

    /// Atom id outside the frame source.
    #[error("Unknown atom id {0}")]
    UnknownAtom(AtomId),

    /// Candidate id that cannot be tracked (0 is reserved for "unbound", or a duplicate).
    #[error("Invalid candidate id {0}")]
    InvalidCandidate(AtomId),

    /// Array shapes disagree with each other.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Linear algebra failure while building filter coefficients.
    #[error("Numerical error: {0}")]
    Numerical(String),
}

impl HoppingError {
    /// Creates a degenerate-input error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        HoppingError::DegenerateInput(message.into())
    }

    /// Creates an invalid-parameter error.
    pub fn parameter(message: impl Into<String>) -> Self {
        HoppingError::InvalidParameter(message.into())
    }

    /// Creates a malformed-window error.
    pub fn window(message: impl Into<String>) -> Self {
        HoppingError::MalformedWindow(message.into())
    }

    /// Creates a shape-mismatch error.
    pub fn shape(message: impl Into<String>) -> Self {
        HoppingError::ShapeMismatch(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HoppingError>;

/// Fails with `InvalidParameter` unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HoppingError::parameter(format!(
            "{} must be finite and positive, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_species_message() {
        let err = HoppingError::InvalidSpecies {
            species: "anion".to_string(),
            known: vec!["solvent".to_string()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("anion"));
        assert!(msg.contains("solvent"));
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("time_step", 0.5).is_ok());
        assert!(ensure_positive("time_step", 0.0).is_err());
        assert!(ensure_positive("time_step", -1.0).is_err());
        assert!(ensure_positive("time_step", f64::NAN).is_err());
        assert!(ensure_positive("time_step", f64::INFINITY).is_err());
    }
}
