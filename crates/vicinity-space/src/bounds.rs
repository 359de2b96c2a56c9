//! The root latitude/longitude rectangle.

use crate::error::SpaceError;

/// An axis-aligned latitude/longitude rectangle, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
    /// Western edge.
    pub long_min: f64,
    /// Eastern edge.
    pub long_max: f64,
}

impl GeoBounds {
    /// The whole globe: latitude `[-90, 90]`, longitude `[-180, 180]`.
    pub const GLOBAL: GeoBounds = GeoBounds {
        lat_min: -90.0,
        lat_max: 90.0,
        long_min: -180.0,
        long_max: 180.0,
    };

    /// Whether `(lat, long)` lies inside the rectangle. NaN is never inside.
    pub fn contains(&self, lat: f64, long: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && long >= self.long_min && long <= self.long_max
    }

    /// Geometric centre.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.long_min + self.long_max) / 2.0,
        )
    }

    /// Check that every edge is finite and each axis has positive extent.
    pub fn validate(&self) -> Result<(), SpaceError> {
        let edges = [self.lat_min, self.lat_max, self.long_min, self.long_max];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(SpaceError::InvalidBounds {
                reason: format!("non-finite edge in {self:?}"),
            });
        }
        if self.lat_min >= self.lat_max {
            return Err(SpaceError::InvalidBounds {
                reason: format!("lat_min {} >= lat_max {}", self.lat_min, self.lat_max),
            });
        }
        if self.long_min >= self.long_max {
            return Err(SpaceError::InvalidBounds {
                reason: format!("long_min {} >= long_max {}", self.long_min, self.long_max),
            });
        }
        Ok(())
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::GLOBAL
    }
}
