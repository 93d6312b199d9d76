use serde::{Deserialize, Serialize};

use crate::error::EmptyGeometryError;
use crate::layer::BoundaryLayer;

/// Initial zoom of the dashboard map. Not fit to the data extent.
pub const DEFAULT_ZOOM: u8 = 11;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Map center: the mean of the per-feature centroids of the boundary.
pub fn map_center(boundary: &BoundaryLayer) -> Result<LatLon, EmptyGeometryError> {
    let centroids: Vec<_> = boundary
        .features
        .iter()
        .filter_map(|feature| feature.geometry.centroid())
        .collect();
    if centroids.is_empty() {
        return Err(EmptyGeometryError);
    }

    let n = centroids.len() as f64;
    let lat = centroids.iter().map(|c| c.y()).sum::<f64>() / n;
    let lon = centroids.iter().map(|c| c.x()).sum::<f64>() / n;
    Ok(LatLon::new(lat, lon))
}
