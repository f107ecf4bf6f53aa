//! Vehicle Finder - Main Entry Point
//!
//! Command-line client for browsing and favoriting rental vehicles.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use vehicle_finder_lib::{
    auth::SessionStore,
    cli::{Cli, Commands, FilterArgs},
    commands::{self, ListFilter},
    config::{self, ApiConfig},
    logging,
    markers::price_label,
    models::Vehicle,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    let data_dir = config::data_dir_from_env();
    logging::init(&config::log_dir(&data_dir));
    info!("Vehicle Finder starting...");

    // Session-only commands never touch the API
    match cli.command {
        Commands::Logout => {
            let store = SessionStore::open(&data_dir);
            let result = commands::logout(&store).map_err(anyhow::Error::msg)?;
            return emit(json, &result, || {
                if result.was_signed_in {
                    println!("Signed out");
                } else {
                    println!("Not signed in");
                }
            });
        }
        Commands::Status => {
            let session = commands::get_stored_session(&SessionStore::open(&data_dir));
            return emit(json, &session, || match &session {
                Some(s) => println!("Signed in as {}", s.email),
                None => println!("Not signed in"),
            });
        }
        _ => {}
    }

    let config = ApiConfig::from_env().context("Failed to load configuration")?;
    let state = AppState::new(&config).context("Failed to create API client")?;

    match cli.command {
        Commands::Login { email } => {
            let result = commands::login(&email, &state).await;
            if !result.success {
                bail!(result.error.unwrap_or_else(|| "Login failed".to_string()));
            }
            emit(json, &result, || {
                println!("Signed in as {}", result.email.as_deref().unwrap_or(&email))
            })?;
        }
        Commands::Logout | Commands::Status => {}
        Commands::List { filter } => {
            let vehicles = commands::list_vehicles(&to_filter(filter), &state)
                .await
                .map_err(anyhow::Error::msg)?;
            emit(json, &vehicles, || print_vehicles(&vehicles))?;
        }
        Commands::Favorites => {
            let vehicles = commands::list_favorites(&state)
                .await
                .map_err(anyhow::Error::msg)?;
            emit(json, &vehicles, || print_vehicles(&vehicles))?;
        }
        Commands::Favorite { vehicle_id, remove } => {
            let vehicle = commands::set_favorite(vehicle_id, !remove, &state)
                .await
                .map_err(anyhow::Error::msg)?;
            emit(json, &vehicle, || print_vehicles(std::slice::from_ref(&vehicle)))?;
        }
        Commands::Show { vehicle_id } => {
            let vehicle = commands::vehicle_detail(vehicle_id, &state)
                .await
                .map_err(anyhow::Error::msg)?;
            emit(json, &vehicle, || {
                println!("Name:      {}", vehicle.name);
                println!("Rating:    {}", vehicle.rating);
                println!("Price:     {}", price_label(vehicle.price));
                println!("Latitude:  {}", vehicle.location.latitude);
                println!("Longitude: {}", vehicle.location.longitude);
                println!("Favorite:  {}", if vehicle.is_favorite { "yes" } else { "no" });
            })?;
        }
        Commands::Markers { filter } => {
            let markers = commands::map_markers(&to_filter(filter), &state)
                .await
                .map_err(anyhow::Error::msg)?;
            emit(json, &markers, || {
                for m in &markers {
                    println!(
                        "{:>10.5} {:>10.5}  {:<10} {:?}  #{}",
                        m.latitude, m.longitude, m.label, m.variant, m.vehicle.vehicle_id
                    );
                }
            })?;
        }
    }

    state.sync.shutdown().await.ok();
    Ok(())
}

fn to_filter(args: FilterArgs) -> ListFilter {
    ListFilter {
        vehicle_type: args.vehicle_type.into(),
        query: args.query,
        sort: args.sort.into(),
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn print_vehicles(vehicles: &[Vehicle]) {
    if vehicles.is_empty() {
        println!("No vehicles");
        return;
    }
    for v in vehicles {
        println!(
            "#{:<5} {:<28} {:>10}  {:.1}★ {}",
            v.vehicle_id,
            v.name,
            price_label(v.price),
            v.rating,
            if v.is_favorite { "♥" } else { "" }
        );
    }
}
