//! Derived Views
//!
//! Read-only projections of the vehicle collection. Nothing here mutates
//! state; the sync module and the command layer call these on snapshots.

use std::cmp::Ordering;

use crate::models::{SortOrder, Vehicle, VehicleType};

/// Vehicles of the given category, collection order preserved
pub fn vehicles_of_type(vehicles: &[Vehicle], vehicle_type: VehicleType) -> Vec<Vehicle> {
    vehicles
        .iter()
        .filter(|v| v.vehicle_type_id == vehicle_type.type_id())
        .cloned()
        .collect()
}

/// Case-insensitive substring match on the vehicle name. Empty query matches all.
pub fn matches_query(vehicle: &Vehicle, query: &str) -> bool {
    query.is_empty() || vehicle.name.to_lowercase().contains(&query.to_lowercase())
}

/// Price first (direction per `order`), then name ascending.
pub fn compare(a: &Vehicle, b: &Vehicle, order: SortOrder) -> Ordering {
    let by_price = match order {
        SortOrder::PriceAsc => a.price.total_cmp(&b.price),
        SortOrder::PriceDesc => b.price.total_cmp(&a.price),
    };
    by_price.then_with(|| a.name.cmp(&b.name))
}

/// The list shown to the user: filtered by type and query, then sorted.
pub fn visible_vehicles(
    vehicles: &[Vehicle],
    vehicle_type: VehicleType,
    query: &str,
    order: SortOrder,
) -> Vec<Vehicle> {
    let mut visible: Vec<Vehicle> = vehicles
        .iter()
        .filter(|v| v.vehicle_type_id == vehicle_type.type_id() && matches_query(v, query))
        .cloned()
        .collect();
    visible.sort_by(|a, b| compare(a, b, order));
    visible
}

/// Favorites screen: every favorited vehicle regardless of category
pub fn favorite_vehicles(vehicles: &[Vehicle]) -> Vec<Vehicle> {
    vehicles.iter().filter(|v| v.is_favorite).cloned().collect()
}
