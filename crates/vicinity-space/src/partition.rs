//! Region paths produced by recursive quadrant bisection.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bounds::GeoBounds;
use crate::error::SpaceError;

/// Deepest supported partition: row and column numbers must fit in `u64`
/// and the cell count per axis (`2^depth`) must too.
pub const MAX_DEPTH: u8 = 32;

/// One bisection level's choice: which latitude half and which longitude half.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Quadrant {
    /// `1` = northern half, `0` = southern half.
    pub row: u8,
    /// `1` = eastern half, `0` = western half.
    pub col: u8,
}

impl Quadrant {
    /// The base-4 digit for this quadrant: `2 * row + col`.
    pub fn digit(self) -> u8 {
        2 * self.row + self.col
    }

    /// Inverse of [`digit`](Self::digit).
    pub fn from_digit(digit: u8) -> Option<Quadrant> {
        (digit < 4).then_some(Quadrant {
            row: digit >> 1,
            col: digit & 1,
        })
    }
}

/// A region path: `depth` quadrant choices, coarsest first.
///
/// Stored as two `depth`-bit numbers, one for the row choices and one for
/// the column choices, with the coarsest level in the most significant
/// bit. This makes one-cell translation plain integer arithmetic with
/// carry, and makes the encoded string (one digit per level) a pure
/// function of the two numbers.
///
/// Partitions order lexicographically by their encoded digits, so sorting
/// groups regions that share a prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    rows: u64,
    cols: u64,
    depth: u8,
}

impl Partition {
    /// Build a partition from raw row and column numbers.
    ///
    /// Returns `None` if `depth` exceeds [`MAX_DEPTH`] or either number
    /// does not fit in `depth` bits.
    pub fn from_parts(rows: u64, cols: u64, depth: u8) -> Option<Partition> {
        if depth > MAX_DEPTH {
            return None;
        }
        let len = 1u64 << depth;
        (rows < len && cols < len).then_some(Partition { rows, cols, depth })
    }

    /// Parse a region path of any length up to [`MAX_DEPTH`].
    ///
    /// Use [`SpatialIndex::from_encoded`](crate::SpatialIndex::from_encoded)
    /// when the path must also match an index's configured depth.
    pub fn parse(encoded: &str) -> Result<Partition, SpaceError> {
        let mut rows = 0u64;
        let mut cols = 0u64;
        let mut depth = 0usize;
        for (position, found) in encoded.chars().enumerate() {
            let quadrant = found
                .to_digit(4)
                .and_then(|d| Quadrant::from_digit(d as u8))
                .ok_or(SpaceError::InvalidEncoding { position, found })?;
            rows = (rows << 1) | u64::from(quadrant.row);
            cols = (cols << 1) | u64::from(quadrant.col);
            depth += 1;
            if depth > MAX_DEPTH as usize {
                return Err(SpaceError::DepthOutOfRange {
                    depth: u8::try_from(encoded.chars().count()).unwrap_or(u8::MAX),
                    max: MAX_DEPTH,
                });
            }
        }
        Ok(Partition {
            rows,
            cols,
            depth: depth as u8,
        })
    }

    /// Number of bisection levels.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Row number: the latitude choices read as a binary number.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Column number: the longitude choices read as a binary number.
    pub fn cols(&self) -> u64 {
        self.cols
    }

    /// Quadrant chosen at `level` (0 = coarsest).
    pub fn quadrant(&self, level: u8) -> Option<Quadrant> {
        if level >= self.depth {
            return None;
        }
        let shift = self.depth - 1 - level;
        Some(Quadrant {
            row: ((self.rows >> shift) & 1) as u8,
            col: ((self.cols >> shift) & 1) as u8,
        })
    }

    /// Every level's quadrant, coarsest first.
    pub fn decode(&self) -> Vec<Quadrant> {
        (0..self.depth).filter_map(|l| self.quadrant(l)).collect()
    }

    fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.depth).filter_map(|l| self.quadrant(l).map(Quadrant::digit))
    }

    /// The region path string, one digit `0..=3` per level.
    pub fn encoded(&self) -> String {
        self.digits().map(|d| char::from(b'0' + d)).collect()
    }

    /// Whether `other` lies inside this region (prefix containment).
    ///
    /// Every partition contains itself.
    pub fn contains(&self, other: &Partition) -> bool {
        if self.depth > other.depth {
            return false;
        }
        let shift = other.depth - self.depth;
        (other.rows >> shift) == self.rows && (other.cols >> shift) == self.cols
    }

    /// The enclosing region one level up, or `None` at the root.
    pub fn parent(&self) -> Option<Partition> {
        (self.depth > 0).then(|| Partition {
            rows: self.rows >> 1,
            cols: self.cols >> 1,
            depth: self.depth - 1,
        })
    }

    /// The cell rectangle this region covers within `root`.
    pub fn bounds(&self, root: &GeoBounds) -> GeoBounds {
        let cells = (1u64 << self.depth) as f64;
        let lat_step = (root.lat_max - root.lat_min) / cells;
        let long_step = (root.long_max - root.long_min) / cells;
        let lat_min = root.lat_min + self.rows as f64 * lat_step;
        let long_min = root.long_min + self.cols as f64 * long_step;
        GeoBounds {
            lat_min,
            lat_max: lat_min + lat_step,
            long_min,
            long_max: long_min + long_step,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition({})", self.encoded())
    }
}

impl Ord for Partition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits().cmp(other.digits())
    }
}

impl PartialOrd for Partition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Partition {
    type Err = SpaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Partition::parse(s)
    }
}

impl Serialize for Partition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded())
    }
}

impl<'de> Deserialize<'de> for Partition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Partition::parse(&encoded).map_err(serde::de::Error::custom)
    }
}
