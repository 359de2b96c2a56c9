//! Edge (boundary) behavior for region translation.

/// What a translation does when it would step off the root rectangle.
///
/// Configured separately for the row axis (latitude) and the column axis
/// (longitude) on an [`IndexConfig`](crate::IndexConfig).
///
/// # Examples
///
/// ```
/// use vicinity_space::{Direction, EdgeBehavior, IndexConfig, SpatialIndex};
///
/// let config = IndexConfig {
///     depth: 2,
///     row_edge: EdgeBehavior::Absorb,
///     col_edge: EdgeBehavior::Wrap,
///     ..IndexConfig::default()
/// };
/// let index = SpatialIndex::new(config).unwrap();
///
/// // North-east corner cell.
/// let corner = index.from_encoded("33").unwrap();
/// // Absorb: nothing north of the top row.
/// assert!(index.translate(&corner, Direction::Up).is_err());
/// // Wrap: east of the last column is the first column.
/// assert_eq!(index.translate(&corner, Direction::Right).unwrap().encoded(), "22");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// Crossing the edge saturates: the edge cell is its own neighbour.
    Clamp,
    /// Crossing the edge wraps to the opposite side (periodic).
    Wrap,
    /// Crossing the edge is an error; `nearby` omits the missing neighbour.
    Absorb,
}
