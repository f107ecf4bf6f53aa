//! Map Marker Projection
//!
//! Turns the visible vehicle list into map markers. The layer is rebuilt
//! from scratch on every update; there is no incremental diffing.

use serde::Serialize;
use tracing::debug;

use crate::models::Vehicle;

/// Currency suffix appended to marker labels
pub const CURRENCY_SUFFIX: &str = "€";

/// Visual variant of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerVariant {
    Favorite,
    Regular,
}

/// A single marker placed on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub variant: MarkerVariant,
    pub vehicle: Vehicle,
}

impl MapMarker {
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            latitude: vehicle.location.latitude,
            longitude: vehicle.location.longitude,
            label: price_label(vehicle.price),
            variant: if vehicle.is_favorite {
                MarkerVariant::Favorite
            } else {
                MarkerVariant::Regular
            },
            vehicle: vehicle.clone(),
        }
    }
}

pub fn price_label(price: f64) -> String {
    format!("{price:.2}{CURRENCY_SUFFIX}")
}

/// The marker overlay of the map view
#[derive(Debug, Default)]
pub struct MarkerLayer {
    markers: Vec<MapMarker>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all markers and place one per vehicle
    pub fn rebuild(&mut self, vehicles: &[Vehicle]) {
        self.markers.clear();
        self.markers.extend(vehicles.iter().map(MapMarker::for_vehicle));
        debug!("Map markers rebuilt: {}", self.markers.len());
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    /// Vehicle behind a clicked marker
    pub fn click(&self, vehicle_id: i64) -> Option<&Vehicle> {
        self.markers
            .iter()
            .map(|m| &m.vehicle)
            .find(|v| v.vehicle_id == vehicle_id)
    }
}
