//! Spatial partitioning for Vicinity.
//!
//! This crate maps geographic coordinates onto a hierarchy of quadrant
//! regions and walks the resulting grid. A [`SpatialIndex`] recursively
//! bisects a bounded latitude/longitude rectangle `depth` times; each level
//! contributes one base-4 digit to the region's [`Partition`] path, so a
//! shared prefix means geographic proximity.
//!
//! # Neighbours
//!
//! [`SpatialIndex::translate`] moves one cell in a cardinal [`Direction`],
//! and [`SpatialIndex::nearby`] expands breadth-first to every region within
//! a hop radius. What happens at the edge of the root rectangle is
//! controlled per axis by [`EdgeBehavior`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub(crate) mod axis;
pub mod bounds;
pub mod direction;
pub mod edge;
pub mod error;
pub mod index;
pub mod partition;

#[cfg(test)]
pub(crate) mod compliance;

pub use bounds::GeoBounds;
pub use direction::Direction;
pub use edge::EdgeBehavior;
pub use error::SpaceError;
pub use index::{IndexConfig, SpatialIndex};
pub use partition::{Partition, Quadrant};
