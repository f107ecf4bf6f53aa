//! Command Line Interface
//!
//! Subcommands and flags for the vehicle-finder binary.

use clap::{Parser, Subcommand, ValueEnum};

use crate::models::{SortOrder, VehicleType};

#[derive(Parser, Debug)]
#[command(name = "vehicle-finder", version, about = "Browse and favorite rental vehicles")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login { email: String },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// List vehicles of one category
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List favorited vehicles of every category
    Favorites,
    /// Mark or unmark a vehicle as favorite
    Favorite {
        vehicle_id: i64,
        #[arg(long, default_value_t = false, help = "Unmark instead of mark")]
        remove: bool,
    },
    /// Show one vehicle
    Show { vehicle_id: i64 },
    /// Print map markers for the filtered list
    Markers {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(long = "type", value_enum, default_value_t = TypeArg::Car)]
    pub vehicle_type: TypeArg,
    #[arg(long, default_value = "", help = "Case-insensitive name filter")]
    pub query: String,
    #[arg(long, value_enum, default_value_t = SortArg::PriceAsc)]
    pub sort: SortArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeArg {
    Car,
    Motorcycle,
    Truck,
}

impl From<TypeArg> for VehicleType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Car => VehicleType::Car,
            TypeArg::Motorcycle => VehicleType::Motorcycle,
            TypeArg::Truck => VehicleType::Truck,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    PriceAsc,
    PriceDesc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::PriceAsc => SortOrder::PriceAsc,
            SortArg::PriceDesc => SortOrder::PriceDesc,
        }
    }
}
