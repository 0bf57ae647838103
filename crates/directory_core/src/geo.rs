//! Geospatial predicates over building coordinates.
//!
//! # Responsibility
//! - Compute great-circle distances between coordinate pairs.
//! - Decide radius and bounding-box membership for buildings.
//! - Turn loosely-typed geo request parameters into one validated query.
//!
//! # Invariants
//! - Radius membership is inclusive: `distance <= radius_km`.
//! - Bounding-box membership is inclusive on all four bounds.
//! - No antimeridian wraparound: `lon_min > lon_max` matches nothing.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mean Earth radius used for great-circle distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine great-circle distance between two points in kilometers.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let from_lat = from.latitude.to_radians();
    let to_lat = to.latitude.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Circle around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl RadiusFilter {
    pub fn new(center: GeoPoint, radius_km: f64) -> Self {
        Self { center, radius_km }
    }

    /// Returns whether `point` lies within the radius, boundary included.
    pub fn contains(&self, point: GeoPoint) -> bool {
        haversine_km(self.center, point) <= self.radius_km
    }
}

/// Axis-aligned latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lon_min,
            lat_max,
            lon_max,
        }
    }

    /// Returns whether `point` lies inside the box, all bounds inclusive.
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.latitude)
            && (self.lon_min..=self.lon_max).contains(&point.longitude)
    }
}

/// Validated geo filter request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoQuery {
    Radius(RadiusFilter),
    BoundingBox(BoundingBox),
}

/// Raw geo parameters as received from a caller.
///
/// `lat`/`lon` are always required; the filter shape is decided by which of
/// the optional fields are present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoParams {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
    pub lat_min: Option<f64>,
    pub lon_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_max: Option<f64>,
}

/// Geo parameters that cannot be turned into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoQueryError {
    /// Neither `radius_km` nor all four bbox bounds were supplied.
    MissingFilter,
}

impl Display for GeoQueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFilter => write!(
                f,
                "either radius_km or all four bbox parameters (lat_min, lon_min, lat_max, lon_max) are required"
            ),
        }
    }
}

impl Error for GeoQueryError {}

impl GeoQuery {
    /// Builds a query from raw parameters.
    ///
    /// `radius_km` wins when present, even if bbox bounds are also supplied.
    /// A partial bbox without radius is rejected.
    pub fn from_params(params: &GeoParams) -> Result<Self, GeoQueryError> {
        if let Some(radius_km) = params.radius_km {
            return Ok(Self::Radius(RadiusFilter::new(
                GeoPoint::new(params.lat, params.lon),
                radius_km,
            )));
        }

        match (
            params.lat_min,
            params.lon_min,
            params.lat_max,
            params.lon_max,
        ) {
            (Some(lat_min), Some(lon_min), Some(lat_max), Some(lon_max)) => Ok(Self::BoundingBox(
                BoundingBox::new(lat_min, lon_min, lat_max, lon_max),
            )),
            _ => Err(GeoQueryError::MissingFilter),
        }
    }
}
