//! Geometry for search grids.
//!
//! A grid cell is a rectangular sub-region of a city that bounds a single
//! discovery API call. Cells come from tiling a city's bounding box.

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A bounding rectangle, northeast/southwest corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub northeast: GeoPoint,
    pub southwest: GeoPoint,
}

impl GeoBounds {
    pub fn new(northeast: GeoPoint, southwest: GeoPoint) -> Self {
        Self {
            northeast,
            southwest,
        }
    }

    /// Validate that the bounds form a non-degenerate rectangle.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.northeast.lat <= self.southwest.lat || self.northeast.lng <= self.southwest.lng {
            return Err(AuditError::Validation(format!(
                "degenerate bounds: ne=({}, {}) sw=({}, {})",
                self.northeast.lat, self.northeast.lng, self.southwest.lat, self.southwest.lng
            )));
        }
        Ok(())
    }

    /// Center of the cell, used as the search origin for one API call.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.northeast.lat + self.southwest.lat) / 2.0,
            (self.northeast.lng + self.southwest.lng) / 2.0,
        )
    }

    /// Split into `rows x cols` equally sized cells.
    pub fn tile(&self, rows: u32, cols: u32) -> Vec<GeoBounds> {
        let lat_step = (self.northeast.lat - self.southwest.lat) / rows as f64;
        let lng_step = (self.northeast.lng - self.southwest.lng) / cols as f64;

        let mut cells = Vec::with_capacity((rows * cols) as usize);
        for r in 0..rows {
            for c in 0..cols {
                let sw = GeoPoint::new(
                    self.southwest.lat + lat_step * r as f64,
                    self.southwest.lng + lng_step * c as f64,
                );
                let ne = GeoPoint::new(sw.lat + lat_step, sw.lng + lng_step);
                cells.push(GeoBounds::new(ne, sw));
            }
        }
        cells
    }
}
