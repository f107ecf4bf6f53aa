//! Domain Models
//!
//! Vehicle data as served by the rental API, plus the small closed sets
//! used for filtering and ordering.

use serde::{Deserialize, Serialize};

/// Geographic position of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A rentable vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "vehicleID")]
    pub vehicle_id: i64,
    #[serde(rename = "vehicleTypeID")]
    pub vehicle_type_id: i64,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub name: String,
    pub location: Location,
    pub rating: f64,
    pub price: f64,
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

/// Vehicle category used as the list/map filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    #[default]
    Car,
    Motorcycle,
    Truck,
}

impl VehicleType {
    /// Numeric id used by the API in `vehicleTypeID`
    pub fn type_id(self) -> i64 {
        match self {
            VehicleType::Car => 1,
            VehicleType::Motorcycle => 2,
            VehicleType::Truck => 3,
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleType::Car => write!(f, "car"),
            VehicleType::Motorcycle => write!(f, "motorcycle"),
            VehicleType::Truck => write!(f, "truck"),
        }
    }
}

/// Price ordering for list views. Name is always the ascending tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}
