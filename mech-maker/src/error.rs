//! Error types of the mechanism assembly and the curve analysis.
//!
//! An unsolvable configuration is not an error. It is reported as `false` by
//! the solver and the mechanism.
use thiserror::Error;

/// Errors of the mechanism assembly and the curve analysis.
#[derive(Debug, Error)]
pub enum Error {
    /// The time window of an input has no width.
    #[error("input time window [{start}, {end}] has no width")]
    EmptyWindow {
        /// Start of the window.
        start: f64,
        /// End of the window.
        end: f64,
    },

    /// An input overlaps another input driving the same members.
    #[error("input overlaps an existing input of the same members in [{start}, {end}]")]
    OverlappingInput {
        /// Start of the existing window.
        start: f64,
        /// End of the existing window.
        end: f64,
    },

    /// A member handle is not registered on this mechanism.
    #[error("member {0} is not registered")]
    UnknownMember(usize),

    /// Not enough samples for the operation.
    #[error("at least {required} samples required, got {provided}")]
    TooFewSamples {
        /// Number of samples required.
        required: usize,
        /// Number of samples provided.
        provided: usize,
    },

    /// The curve has no length or no extent along its principal axis.
    #[error("curve is degenerated to a point")]
    DegenerateCurve,

    /// CSV reading or writing failed.
    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;
