//! Error types for mockifu-core.

use thiserror::Error;

/// Result type alias for mockifu operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: any of these aborts a run before a particle is binned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The footprint boundary cannot support the membership test.
    #[error("malformed footprint boundary: {0}")]
    MalformedBoundary(String),

    /// Input arrays or geometry have an unusable shape.
    #[error("input shape error: {0}")]
    InputShape(String),

    /// A particle carries an unusable weight.
    #[error("invalid particle {index}: {reason}")]
    InvalidParticle { index: usize, reason: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Why a bin could not produce weighted statistics.
///
/// Degenerate bins are recoverable: the bin still gets a record, filled with
/// NaN statistics, and the rest of the run continues.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DegenerateBin {
    /// No particle was assigned to the bin.
    #[error("no particles assigned")]
    NoParticles,

    /// Particles were assigned but their masses sum to zero.
    #[error("total flux is zero")]
    ZeroFlux,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidParticle {
            index: 7,
            reason: "negative mass".to_string(),
        };
        assert_eq!(err.to_string(), "invalid particle 7: negative mass");
        assert_eq!(
            DegenerateBin::NoParticles.to_string(),
            "no particles assigned"
        );
    }
}
