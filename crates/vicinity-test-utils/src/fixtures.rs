//! Reusable scenario fixtures.
//!
//! Fixed coordinates and clocks shared by the store and engine tests:
//!
//! - [`START`]: an arbitrary but fixed wall-clock origin.
//! - [`manual_clock`]: a shared [`ManualClock`] stopped at [`START`].
//! - [`CARIBBEAN`] and friends: named coordinates for proximity scenarios.

use std::sync::Arc;
use std::time::Duration;

use vicinity_core::{ManualClock, Timestamp};

/// 2024-01-01T00:00:00Z.
pub const START: Timestamp = Timestamp::from_millis(1_704_067_200_000);

/// Five minutes, the default record TTL.
pub const FIVE_MINUTES: Duration = Duration::from_secs(300);

/// A point well inside a depth-10 cell, far from every boundary.
pub const CARIBBEAN: (f64, f64) = (20.0, -60.0);

/// One degree east of [`CARIBBEAN`]: three depth-10 cells away.
pub const CARIBBEAN_EAST: (f64, f64) = (20.0, -59.0);

/// The other side of the planet from [`CARIBBEAN`].
pub const INDIAN_OCEAN: (f64, f64) = (-20.0, 80.0);

/// A shared manual clock stopped at [`START`].
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(START))
}
