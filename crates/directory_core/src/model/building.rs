//! Building domain model.

use crate::geo::GeoPoint;

/// Storage-assigned building identifier.
pub type BuildingId = i64;

/// Physical location that hosts zero or more organizations.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: BuildingId,
    pub address: String,
    /// Degrees, WGS84.
    pub latitude: f64,
    /// Degrees, WGS84.
    pub longitude: f64,
}

impl Building {
    /// Returns building coordinates as a geo point.
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
