//! Error types for partitioning and region queries.

use thiserror::Error;

use crate::direction::Direction;

/// Errors arising from index construction, coordinate encoding, or
/// region translation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SpaceError {
    /// A coordinate lies outside the working rectangle at some bisection level.
    #[error("coordinate ({lat}, {long}) out of range at level {level}")]
    OutOfRange {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        long: f64,
        /// Bisection level (0 = root) at which the check failed.
        level: u8,
    },
    /// A region path contains a character outside `'0'..='3'`.
    #[error("invalid region path character {found:?} at position {position}")]
    InvalidEncoding {
        /// Zero-based character position.
        position: usize,
        /// The character that was found.
        found: char,
    },
    /// A region path has the wrong number of digits for this index.
    #[error("region path has {found} digits, index depth is {expected}")]
    DepthMismatch {
        /// The index depth.
        expected: u8,
        /// Digits in the supplied path.
        found: usize,
    },
    /// A translation stepped off an axis configured with `EdgeBehavior::Absorb`.
    #[error("translation {direction} crosses the root boundary")]
    BoundaryCrossed {
        /// The direction of the failed step.
        direction: Direction,
    },
    /// The configured depth is zero or too deep to represent.
    #[error("depth {depth} outside supported range 1..={max}")]
    DepthOutOfRange {
        /// The configured depth.
        depth: u8,
        /// Maximum supported depth.
        max: u8,
    },
    /// The root rectangle is empty, inverted, or not finite.
    #[error("invalid bounds: {reason}")]
    InvalidBounds {
        /// What went wrong.
        reason: String,
    },
}
