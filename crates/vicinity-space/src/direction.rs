//! Cardinal translation directions.

use std::fmt;

/// A cardinal direction on the partition grid.
///
/// Rows count upward from the southern edge of the root rectangle, so
/// [`Up`](Direction::Up) is north. Columns count eastward, so
/// [`Right`](Direction::Right) is east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// North: row number + 1.
    Up,
    /// South: row number - 1.
    Down,
    /// West: column number - 1.
    Left,
    /// East: column number + 1.
    Right,
}

impl Direction {
    /// All four directions in BFS expansion order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The direction that undoes this one.
    pub fn opposite(self) -> Direction {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether this direction moves along the row (latitude) axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Whether this direction increases its axis value.
    pub(crate) fn is_forward(self) -> bool {
        matches!(self, Self::Up | Self::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}
