//! Single-axis stepping shared by row and column translation.

use crate::edge::EdgeBehavior;

/// Step `value` by one cell along an axis of `len` cells.
///
/// Returns `None` when the step leaves the axis under
/// [`EdgeBehavior::Absorb`].
pub(crate) fn step_axis(value: u64, forward: bool, len: u64, edge: EdgeBehavior) -> Option<u64> {
    debug_assert!(value < len, "axis value {value} outside [0, {len})");
    if forward {
        if value + 1 < len {
            return Some(value + 1);
        }
        match edge {
            EdgeBehavior::Absorb => None,
            EdgeBehavior::Clamp => Some(len - 1),
            EdgeBehavior::Wrap => Some(0),
        }
    } else {
        if value > 0 {
            return Some(value - 1);
        }
        match edge {
            EdgeBehavior::Absorb => None,
            EdgeBehavior::Clamp => Some(0),
            EdgeBehavior::Wrap => Some(len - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_steps_ignore_edge() {
        for edge in [EdgeBehavior::Absorb, EdgeBehavior::Clamp, EdgeBehavior::Wrap] {
            assert_eq!(step_axis(3, true, 8, edge), Some(4));
            assert_eq!(step_axis(3, false, 8, edge), Some(2));
        }
    }

    #[test]
    fn edges_follow_policy() {
        assert_eq!(step_axis(7, true, 8, EdgeBehavior::Absorb), None);
        assert_eq!(step_axis(7, true, 8, EdgeBehavior::Clamp), Some(7));
        assert_eq!(step_axis(7, true, 8, EdgeBehavior::Wrap), Some(0));
        assert_eq!(step_axis(0, false, 8, EdgeBehavior::Absorb), None);
        assert_eq!(step_axis(0, false, 8, EdgeBehavior::Clamp), Some(0));
        assert_eq!(step_axis(0, false, 8, EdgeBehavior::Wrap), Some(7));
    }

    #[test]
    fn single_cell_axis() {
        assert_eq!(step_axis(0, true, 1, EdgeBehavior::Wrap), Some(0));
        assert_eq!(step_axis(0, false, 1, EdgeBehavior::Absorb), None);
    }
}
