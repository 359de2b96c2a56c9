//! The spatial index: coordinate encoding, translation, and neighbour search.

use std::collections::VecDeque;

use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::axis::step_axis;
use crate::bounds::GeoBounds;
use crate::direction::Direction;
use crate::edge::EdgeBehavior;
use crate::error::SpaceError;
use crate::partition::{Partition, MAX_DEPTH};

/// Construction parameters for a [`SpatialIndex`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexConfig {
    /// Root rectangle that is bisected. Default: the whole globe.
    pub bounds: GeoBounds,
    /// Number of bisection levels (digits per region path). Default: 10.
    pub depth: u8,
    /// Edge behavior when translating north of the top row or south of the
    /// bottom row. Default: `Absorb`, since nothing lies beyond a pole.
    pub row_edge: EdgeBehavior,
    /// Edge behavior when translating across the east/west edge.
    /// Default: `Wrap`, since the antimeridian is continuous.
    pub col_edge: EdgeBehavior,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::GLOBAL,
            depth: 10,
            row_edge: EdgeBehavior::Absorb,
            col_edge: EdgeBehavior::Wrap,
        }
    }
}

impl IndexConfig {
    /// Check the depth range and the root rectangle.
    pub fn validate(&self) -> Result<(), SpaceError> {
        if self.depth == 0 || self.depth > MAX_DEPTH {
            return Err(SpaceError::DepthOutOfRange {
                depth: self.depth,
                max: MAX_DEPTH,
            });
        }
        self.bounds.validate()
    }
}

/// Deterministic mapping between coordinates and region paths.
///
/// Every replica must construct its index from the same [`IndexConfig`]:
/// region paths are only comparable between identically configured
/// indexes.
///
/// # Examples
///
/// ```
/// use vicinity_space::{IndexConfig, SpatialIndex};
///
/// let index = SpatialIndex::new(IndexConfig::default()).unwrap();
/// let p = index.from_coordinates(20.0, -60.0).unwrap();
/// assert_eq!(p.depth(), 10);
/// assert_eq!(index.from_encoded(&p.encoded()).unwrap(), p);
///
/// // Radius 0 is just the region itself.
/// assert_eq!(index.nearby(&p, 0).len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialIndex {
    config: IndexConfig,
}

impl SpatialIndex {
    /// Create an index, rejecting a zero or oversized depth and malformed bounds.
    pub fn new(config: IndexConfig) -> Result<Self, SpaceError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this index was built from.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of digits in every region path this index produces.
    pub fn depth(&self) -> u8 {
        self.config.depth
    }

    /// Cells per axis: `2^depth`.
    pub fn cells_per_axis(&self) -> u64 {
        1u64 << self.config.depth
    }

    /// Encode a coordinate as a region path.
    ///
    /// Bisects the root rectangle `depth` times, keeping the half that
    /// contains the point on each axis. A value exactly on a midpoint goes
    /// to the upper half. The point is re-checked against the working
    /// rectangle at every level, so NaN or out-of-bounds input fails with
    /// [`SpaceError::OutOfRange`] instead of producing a bogus path.
    pub fn from_coordinates(&self, lat: f64, long: f64) -> Result<Partition, SpaceError> {
        let mut cell = self.config.bounds;
        let mut rows = 0u64;
        let mut cols = 0u64;

        for level in 0..self.config.depth {
            if !cell.contains(lat, long) {
                return Err(SpaceError::OutOfRange { lat, long, level });
            }
            let (lat_mid, long_mid) = cell.center();

            let row = if lat < lat_mid {
                cell.lat_max = lat_mid;
                0
            } else {
                cell.lat_min = lat_mid;
                1
            };
            let col = if long < long_mid {
                cell.long_max = long_mid;
                0
            } else {
                cell.long_min = long_mid;
                1
            };

            rows = (rows << 1) | row;
            cols = (cols << 1) | col;
        }

        Partition::from_parts(rows, cols, self.config.depth).ok_or(SpaceError::OutOfRange {
            lat,
            long,
            level: self.config.depth,
        })
    }

    /// Parse a region path produced by an identically configured index.
    pub fn from_encoded(&self, encoded: &str) -> Result<Partition, SpaceError> {
        let partition = Partition::parse(encoded)?;
        self.check_depth(&partition)?;
        Ok(partition)
    }

    fn check_depth(&self, partition: &Partition) -> Result<(), SpaceError> {
        if partition.depth() != self.config.depth {
            return Err(SpaceError::DepthMismatch {
                expected: self.config.depth,
                found: partition.depth() as usize,
            });
        }
        Ok(())
    }

    /// Move one cell in `direction`.
    ///
    /// Rows and columns are independent binary numbers, so a step is an
    /// increment or decrement with carry across levels. Stepping off the
    /// root rectangle follows the axis's [`EdgeBehavior`]; under `Absorb`
    /// it fails with [`SpaceError::BoundaryCrossed`].
    pub fn translate(
        &self,
        partition: &Partition,
        direction: Direction,
    ) -> Result<Partition, SpaceError> {
        self.check_depth(partition)?;
        self.step(partition, direction)
            .ok_or(SpaceError::BoundaryCrossed { direction })
    }

    fn step(&self, p: &Partition, direction: Direction) -> Option<Partition> {
        let len = self.cells_per_axis();
        let (rows, cols) = if direction.is_vertical() {
            let rows = step_axis(p.rows(), direction.is_forward(), len, self.config.row_edge)?;
            (rows, p.cols())
        } else {
            let cols = step_axis(p.cols(), direction.is_forward(), len, self.config.col_edge)?;
            (p.rows(), cols)
        };
        Partition::from_parts(rows, cols, p.depth())
    }

    /// The cardinal neighbours of a region, in [`Direction::ALL`] order.
    ///
    /// Absorbed edges contribute nothing; clamped edges contribute the
    /// region itself.
    pub fn neighbours(&self, partition: &Partition) -> SmallVec<[Partition; 4]> {
        Direction::ALL
            .iter()
            .filter_map(|&d| self.step(partition, d))
            .collect()
    }

    /// Every region within `radius` hops of `partition`, including itself.
    ///
    /// Breadth-first expansion over [`neighbours`](Self::neighbours),
    /// deduplicated by region. The result is a set; its iteration order is
    /// BFS discovery order but callers must not rely on it.
    pub fn nearby(&self, partition: &Partition, radius: u32) -> IndexSet<Partition> {
        let mut visited = IndexSet::new();
        let mut queue = VecDeque::new();

        visited.insert(partition.clone());
        queue.push_back((partition.clone(), 0u32));

        while let Some((p, dist)) = queue.pop_front() {
            if dist >= radius {
                continue;
            }
            for n in self.neighbours(&p) {
                if !visited.contains(&n) {
                    visited.insert(n.clone());
                    queue.push_back((n, dist + 1));
                }
            }
        }

        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use proptest::prelude::*;

    fn index(depth: u8) -> SpatialIndex {
        SpatialIndex::new(IndexConfig {
            depth,
            ..IndexConfig::default()
        })
        .unwrap()
    }

    fn with_edges(depth: u8, row_edge: EdgeBehavior, col_edge: EdgeBehavior) -> SpatialIndex {
        SpatialIndex::new(IndexConfig {
            depth,
            row_edge,
            col_edge,
            ..IndexConfig::default()
        })
        .unwrap()
    }

    // ── Construction ────────────────────────────────────────────

    #[test]
    fn new_rejects_zero_and_oversized_depth() {
        assert!(matches!(
            SpatialIndex::new(IndexConfig {
                depth: 0,
                ..IndexConfig::default()
            }),
            Err(SpaceError::DepthOutOfRange { depth: 0, .. })
        ));
        assert!(SpatialIndex::new(IndexConfig {
            depth: MAX_DEPTH + 1,
            ..IndexConfig::default()
        })
        .is_err());
        assert!(SpatialIndex::new(IndexConfig {
            depth: MAX_DEPTH,
            ..IndexConfig::default()
        })
        .is_ok());
    }

    // ── Encoding ────────────────────────────────────────────────

    #[test]
    fn first_level_quadrants() {
        let idx = index(1);
        assert_eq!(idx.from_coordinates(-45.0, -90.0).unwrap().encoded(), "0");
        assert_eq!(idx.from_coordinates(-45.0, 90.0).unwrap().encoded(), "1");
        assert_eq!(idx.from_coordinates(45.0, -90.0).unwrap().encoded(), "2");
        assert_eq!(idx.from_coordinates(45.0, 90.0).unwrap().encoded(), "3");
    }

    #[test]
    fn midpoint_goes_to_upper_half() {
        let idx = index(1);
        assert_eq!(idx.from_coordinates(0.0, 0.0).unwrap().encoded(), "3");
    }

    #[test]
    fn known_path_for_reference_point() {
        // lat 20 -> rows 1001110001, long -60 -> cols 0101010101
        let p = index(10).from_coordinates(20.0, -60.0).unwrap();
        assert_eq!(p.rows(), 0b1001110001);
        assert_eq!(p.cols(), 0b0101010101);
        assert_eq!(p.encoded(), "2103230103");
    }

    #[test]
    fn root_corners_encode() {
        let idx = index(10);
        assert_eq!(idx.from_coordinates(-90.0, -180.0).unwrap().encoded(), "0000000000");
        assert_eq!(idx.from_coordinates(90.0, 180.0).unwrap().encoded(), "3333333333");
    }

    #[test]
    fn out_of_range_and_nan() {
        let idx = index(10);
        assert!(matches!(
            idx.from_coordinates(91.0, 0.0),
            Err(SpaceError::OutOfRange { level: 0, .. })
        ));
        assert!(matches!(
            idx.from_coordinates(0.0, -180.5),
            Err(SpaceError::OutOfRange { .. })
        ));
        assert!(idx.from_coordinates(f64::NAN, 0.0).is_err());
        assert!(idx.from_coordinates(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn custom_bounds_reject_outside_points() {
        let idx = SpatialIndex::new(IndexConfig {
            bounds: GeoBounds {
                lat_min: 40.0,
                lat_max: 60.0,
                long_min: -10.0,
                long_max: 30.0,
            },
            ..IndexConfig::default()
        })
        .unwrap();
        assert!(idx.from_coordinates(51.5, -0.1).is_ok());
        assert!(idx.from_coordinates(20.0, 0.0).is_err());
    }

    #[test]
    fn from_encoded_checks_depth_and_alphabet() {
        let idx = index(4);
        assert!(idx.from_encoded("0123").is_ok());
        assert_eq!(
            idx.from_encoded("012"),
            Err(SpaceError::DepthMismatch {
                expected: 4,
                found: 3
            })
        );
        assert!(matches!(
            idx.from_encoded("01a3"),
            Err(SpaceError::InvalidEncoding { position: 2, found: 'a' })
        ));
    }

    #[test]
    fn region_contains_its_points() {
        let idx = index(8);
        let p = idx.from_coordinates(-33.86, 151.21).unwrap();
        let cell = p.bounds(&GeoBounds::GLOBAL);
        assert!(cell.contains(-33.86, 151.21));
        assert_eq!(idx.from_coordinates(cell.lat_min, cell.long_min).unwrap(), p);
    }

    // ── Translation ─────────────────────────────────────────────

    #[test]
    fn translate_carries_across_levels() {
        let idx = index(3);
        // rows 011 -> 100: the carry crosses every level.
        let p = Partition::from_parts(0b011, 0b000, 3).unwrap();
        let up = idx.translate(&p, Direction::Up).unwrap();
        assert_eq!(up.rows(), 0b100);
        assert_eq!(up.cols(), 0b000);
        assert_eq!(up.encoded(), "200");
        // And borrow back.
        assert_eq!(idx.translate(&up, Direction::Down).unwrap(), p);
    }

    #[test]
    fn translate_left_right_only_touch_columns() {
        let idx = index(3);
        let p = idx.from_encoded("123").unwrap();
        let right = idx.translate(&p, Direction::Right).unwrap();
        assert_eq!(right.rows(), p.rows());
        assert_eq!(right.cols(), p.cols() + 1);
        let left = idx.translate(&p, Direction::Left).unwrap();
        assert_eq!(left.cols(), p.cols() - 1);
    }

    #[test]
    fn default_policy_absorbs_poles_and_wraps_antimeridian() {
        let idx = index(10);
        let north = idx.from_coordinates(90.0, 0.0).unwrap();
        assert_eq!(
            idx.translate(&north, Direction::Up),
            Err(SpaceError::BoundaryCrossed {
                direction: Direction::Up
            })
        );
        let south = idx.from_coordinates(-90.0, 0.0).unwrap();
        assert!(idx.translate(&south, Direction::Down).is_err());

        let east = idx.from_coordinates(0.0, 179.99).unwrap();
        let wrapped = idx.translate(&east, Direction::Right).unwrap();
        assert_eq!(wrapped, idx.from_coordinates(0.0, -180.0).unwrap());
        assert_eq!(idx.translate(&wrapped, Direction::Left).unwrap(), east);
    }

    #[test]
    fn clamp_policy_saturates() {
        let idx = with_edges(4, EdgeBehavior::Clamp, EdgeBehavior::Clamp);
        let corner = idx.from_encoded("3333").unwrap();
        assert_eq!(idx.translate(&corner, Direction::Up).unwrap(), corner);
        assert_eq!(idx.translate(&corner, Direction::Right).unwrap(), corner);
        // Clamped steps do not invert: down from the saturated cell moves.
        let down = idx.translate(&corner, Direction::Down).unwrap();
        assert_ne!(down, corner);
    }

    #[test]
    fn translate_rejects_foreign_depth() {
        let idx = index(4);
        let p = Partition::parse("01").unwrap();
        assert!(matches!(
            idx.translate(&p, Direction::Up),
            Err(SpaceError::DepthMismatch { .. })
        ));
    }

    // ── Nearby ──────────────────────────────────────────────────

    #[test]
    fn nearby_radius_zero_is_self() {
        let idx = index(10);
        let p = idx.from_coordinates(20.0, -60.0).unwrap();
        let set = idx.nearby(&p, 0);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&p));
    }

    #[test]
    fn nearby_interior_is_a_diamond() {
        let idx = index(10);
        let p = idx.from_coordinates(20.0, -60.0).unwrap();
        assert_eq!(idx.nearby(&p, 1).len(), 5);
        // 1 + 4 + 8 = 13 for radius 2.
        assert_eq!(idx.nearby(&p, 2).len(), 13);
    }

    #[test]
    fn nearby_at_pole_loses_absorbed_neighbours() {
        let idx = index(10);
        let pole = idx.from_coordinates(90.0, 0.0).unwrap();
        // Up is absorbed; down, left, right remain.
        assert_eq!(idx.nearby(&pole, 1).len(), 4);
    }

    #[test]
    fn nearby_wraps_on_tiny_grid() {
        let idx = with_edges(1, EdgeBehavior::Wrap, EdgeBehavior::Wrap);
        let p = idx.from_encoded("0").unwrap();
        // A 2x2 torus: every cell is reachable in two hops.
        assert_eq!(idx.nearby(&p, 2).len(), 4);
    }

    // ── Compliance suites ───────────────────────────────────────

    #[test]
    fn compliance_default() {
        compliance::run_full_compliance(&index(3));
    }

    #[test]
    fn compliance_absorb() {
        compliance::run_full_compliance(&with_edges(3, EdgeBehavior::Absorb, EdgeBehavior::Absorb));
    }

    #[test]
    fn compliance_wrap() {
        compliance::run_full_compliance(&with_edges(3, EdgeBehavior::Wrap, EdgeBehavior::Wrap));
    }

    #[test]
    fn compliance_clamp() {
        compliance::run_full_compliance(&with_edges(3, EdgeBehavior::Clamp, EdgeBehavior::Clamp));
    }

    // ── Property tests ──────────────────────────────────────────

    fn arb_edge() -> impl Strategy<Value = EdgeBehavior> {
        prop_oneof![
            Just(EdgeBehavior::Absorb),
            Just(EdgeBehavior::Clamp),
            Just(EdgeBehavior::Wrap),
        ]
    }

    fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    proptest! {
        #[test]
        fn coordinates_roundtrip_through_encoding(
            lat in -90.0f64..=90.0,
            long in -180.0f64..=180.0,
            depth in 1u8..=16,
        ) {
            let idx = index(depth);
            let p = idx.from_coordinates(lat, long).unwrap();
            prop_assert_eq!(idx.from_encoded(&p.encoded()).unwrap(), p);
        }

        #[test]
        fn shallower_index_yields_prefix(
            lat in -90.0f64..=90.0,
            long in -180.0f64..=180.0,
        ) {
            let coarse = index(5).from_coordinates(lat, long).unwrap();
            let fine = index(12).from_coordinates(lat, long).unwrap();
            prop_assert!(coarse.contains(&fine));
        }

        #[test]
        fn translate_then_opposite_is_identity_when_not_crossing(
            rows in 0u64..256,
            cols in 0u64..256,
            row_edge in arb_edge(),
            col_edge in arb_edge(),
            d in arb_direction(),
        ) {
            let idx = with_edges(8, row_edge, col_edge);
            let p = Partition::from_parts(rows, cols, 8).unwrap();
            let edge = if d.is_vertical() { row_edge } else { col_edge };
            let (value, len) = if d.is_vertical() { (rows, 256) } else { (cols, 256) };
            let at_edge = (d.is_forward() && value == len - 1) || (!d.is_forward() && value == 0);

            match idx.translate(&p, d) {
                Ok(q) => {
                    if at_edge && edge == EdgeBehavior::Clamp {
                        prop_assert_eq!(q, p);
                    } else {
                        prop_assert_eq!(idx.translate(&q, d.opposite()).unwrap(), p);
                    }
                }
                Err(e) => {
                    prop_assert!(at_edge && edge == EdgeBehavior::Absorb);
                    prop_assert_eq!(e, SpaceError::BoundaryCrossed { direction: d });
                }
            }
        }

        #[test]
        fn nearby_is_monotone_in_radius(
            lat in -90.0f64..=90.0,
            long in -180.0f64..=180.0,
            r in 0u32..4,
        ) {
            let idx = index(6);
            let p = idx.from_coordinates(lat, long).unwrap();
            let inner = idx.nearby(&p, r);
            let outer = idx.nearby(&p, r + 1);
            prop_assert!(inner.contains(&p));
            prop_assert!(inner.iter().all(|q| outer.contains(q)));
            prop_assert!(outer.len() >= inner.len());
        }
    }
}
