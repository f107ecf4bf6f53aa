//! Vehicle Sync Module
//!
//! Owns the authoritative vehicle collection and the selection state.
//!
//! A single actor task holds all mutable state and drains a mailbox of
//! commands one at a time, awaiting each remote call before it looks at the
//! next command. Every state change is published as a [`SyncSnapshot`] on a
//! watch channel for the presentation layer.
//!
//! Failure handling differs per operation and is spelled out as a
//! [`FailurePolicy`]: a failed refresh empties the collection, a failed
//! favorite toggle leaves it alone.
//!
//! The API only offers an "add to favorites" endpoint, so `toggle_favorite`
//! calls it for both directions and then applies `new_value` locally.
//! Un-favoriting is therefore not persisted server side.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, VehicleApi};
use crate::auth::SecretStore;
use crate::models::{SortOrder, Vehicle, VehicleType};
use crate::view;

const MAILBOX_CAPACITY: usize = 32;

/// What an operation does to the collection when it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop every vehicle; the views show an empty list
    ClearCollection,
    /// Leave the collection exactly as it was
    KeepState,
}

pub const REFRESH_FAILURE_POLICY: FailurePolicy = FailurePolicy::ClearCollection;
pub const FAVORITE_FAILURE_POLICY: FailurePolicy = FailurePolicy::KeepState;

/// Observable state of the sync module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSnapshot {
    /// Authoritative collection, server order
    pub vehicles: Vec<Vehicle>,
    /// `vehicles` restricted to `selected_type`
    pub vehicles_by_type: Vec<Vehicle>,
    pub selected_type: VehicleType,
    pub search_query: String,
    pub refresh_loading: bool,
    pub favorite_loading: bool,
    /// Human-readable message of the most recent failure
    pub last_error: Option<String>,
}

impl SyncSnapshot {
    /// List view for the current selection
    pub fn visible(&self, order: SortOrder) -> Vec<Vehicle> {
        view::visible_vehicles(&self.vehicles, self.selected_type, &self.search_query, order)
    }

    pub fn favorites(&self) -> Vec<Vehicle> {
        view::favorite_vehicles(&self.vehicles)
    }

    pub fn vehicle(&self, vehicle_id: i64) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.vehicle_id == vehicle_id)
    }

    fn reproject(&mut self) {
        self.vehicles_by_type = view::vehicles_of_type(&self.vehicles, self.selected_type);
    }
}

type Reply = oneshot::Sender<Result<(), SyncError>>;

enum Command {
    RefreshAll { reply: Reply },
    SetSelectedType { vehicle_type: VehicleType, reply: Reply },
    SetSearchQuery { query: String, reply: Reply },
    ToggleFavorite { vehicle_id: i64, new_value: bool, reply: Reply },
    Shutdown { reply: Reply },
}

/// Handle to the sync actor. Cheap to clone.
#[derive(Clone)]
pub struct VehicleSync {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SyncSnapshot>,
    api: Arc<dyn VehicleApi>,
    store: Arc<dyn SecretStore>,
}

impl VehicleSync {
    /// Start the actor on the current tokio runtime
    pub fn spawn(api: Arc<dyn VehicleApi>, store: Arc<dyn SecretStore>) -> (Self, JoinHandle<()>) {
        let (commands, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
        let (publisher, snapshots) = watch::channel(SyncSnapshot::default());

        let actor = SyncActor {
            api: api.clone(),
            store: store.clone(),
            state: SyncSnapshot::default(),
            mailbox,
            publisher,
        };
        let task = tokio::spawn(actor.run());

        let handle = Self {
            commands,
            snapshots,
            api,
            store,
        };
        (handle, task)
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published state
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Replace the collection with a fresh server listing
    pub async fn refresh_all(&self) -> Result<(), SyncError> {
        self.request(|reply| Command::RefreshAll { reply }).await
    }

    /// Switch category, clear the search query and refetch
    pub async fn set_selected_type(&self, vehicle_type: VehicleType) -> Result<(), SyncError> {
        self.request(|reply| Command::SetSelectedType { vehicle_type, reply })
            .await
    }

    /// Update the search query. An empty query resets the selection and refetches.
    pub async fn set_search_query(&self, query: impl Into<String>) -> Result<(), SyncError> {
        let query = query.into();
        self.request(|reply| Command::SetSearchQuery { query, reply })
            .await
    }

    /// Mark a vehicle's favorite flag after the server acknowledges it
    pub async fn toggle_favorite(&self, vehicle_id: i64, new_value: bool) -> Result<(), SyncError> {
        self.request(|reply| Command::ToggleFavorite {
            vehicle_id,
            new_value,
            reply,
        })
        .await
    }

    /// Fetch one vehicle for the detail view. Never touches the collection.
    pub async fn fetch_vehicle_detail(&self, vehicle_id: i64) -> Result<Vehicle, SyncError> {
        let token = self.store.get_token().ok_or(SyncError::AuthMissing)?;
        match self.api.get_vehicle(&token, vehicle_id).await {
            Ok(vehicle) => Ok(vehicle),
            Err(e) => {
                error!("Failed to fetch vehicle {}: {}", vehicle_id, e);
                Err(e.into())
            }
        }
    }

    /// Stop the actor once every command queued before this one has run
    pub async fn shutdown(&self) -> Result<(), SyncError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request(&self, build: impl FnOnce(Reply) -> Command) -> Result<(), SyncError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SyncError::Closed)?;
        response.await.map_err(|_| SyncError::Closed)?
    }
}

struct SyncActor {
    api: Arc<dyn VehicleApi>,
    store: Arc<dyn SecretStore>,
    state: SyncSnapshot,
    mailbox: mpsc::Receiver<Command>,
    publisher: watch::Sender<SyncSnapshot>,
}

impl SyncActor {
    async fn run(mut self) {
        debug!("Vehicle sync started");

        while let Some(command) = self.mailbox.recv().await {
            match command {
                Command::RefreshAll { reply } => {
                    let _ = reply.send(self.refresh_all().await);
                }
                Command::SetSelectedType { vehicle_type, reply } => {
                    let _ = reply.send(self.set_selected_type(vehicle_type).await);
                }
                Command::SetSearchQuery { query, reply } => {
                    let _ = reply.send(self.set_search_query(query).await);
                }
                Command::ToggleFavorite {
                    vehicle_id,
                    new_value,
                    reply,
                } => {
                    let _ = reply.send(self.toggle_favorite(vehicle_id, new_value).await);
                }
                Command::Shutdown { reply } => {
                    let _ = reply.send(Ok(()));
                    break;
                }
            }
        }

        debug!("Vehicle sync stopped");
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }

    fn token(&self) -> Result<String, SyncError> {
        self.store.get_token().ok_or(SyncError::AuthMissing)
    }

    fn apply_failure(&mut self, policy: FailurePolicy, error: &SyncError) {
        self.state.last_error = Some(error.to_string());
        match policy {
            FailurePolicy::ClearCollection => {
                self.state.vehicles.clear();
                self.state.vehicles_by_type.clear();
            }
            FailurePolicy::KeepState => {}
        }
    }

    async fn refresh_all(&mut self) -> Result<(), SyncError> {
        self.state.refresh_loading = true;
        self.publish();

        let result = match self.token() {
            Ok(token) => self.api.list_vehicles(&token).await.map_err(SyncError::from),
            Err(e) => Err(e),
        };
        self.state.refresh_loading = false;

        let outcome = match result {
            Ok(vehicles) => {
                self.state.vehicles = dedup_by_id(vehicles);
                self.state.last_error = None;
                info!("Vehicle collection replaced: {} vehicles", self.state.vehicles.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch vehicles: {}", e);
                self.apply_failure(REFRESH_FAILURE_POLICY, &e);
                Err(e)
            }
        };

        self.state.reproject();
        self.publish();
        outcome
    }

    async fn set_selected_type(&mut self, vehicle_type: VehicleType) -> Result<(), SyncError> {
        self.state.selected_type = vehicle_type;
        self.state.search_query.clear();
        self.state.reproject();
        self.publish();
        debug!("Vehicle type set to {}, refetching", vehicle_type);

        self.refresh_all().await
    }

    async fn set_search_query(&mut self, query: String) -> Result<(), SyncError> {
        if query.is_empty() {
            let current = self.state.selected_type;
            return self.set_selected_type(current).await;
        }

        self.state.search_query = query;
        self.publish();
        Ok(())
    }

    async fn toggle_favorite(&mut self, vehicle_id: i64, new_value: bool) -> Result<(), SyncError> {
        if self.state.vehicle(vehicle_id).is_none() {
            warn!("Ignoring favorite toggle for unknown vehicle {}", vehicle_id);
            return Ok(());
        }

        self.state.favorite_loading = true;
        self.publish();

        let result = match self.token() {
            Ok(token) => self
                .api
                .add_favorite(&token, vehicle_id)
                .await
                .map_err(SyncError::from),
            Err(e) => Err(e),
        };
        self.state.favorite_loading = false;

        let outcome = match result {
            Ok(()) => {
                let state = &mut self.state;
                state
                    .vehicles
                    .iter_mut()
                    .chain(state.vehicles_by_type.iter_mut())
                    .filter(|v| v.vehicle_id == vehicle_id)
                    .for_each(|v| v.is_favorite = new_value);
                state.last_error = None;
                info!("Favorite status of vehicle {} set to {}", vehicle_id, new_value);
                Ok(())
            }
            Err(e) => {
                error!("Failed to toggle favorite for vehicle {}: {}", vehicle_id, e);
                self.apply_failure(FAVORITE_FAILURE_POLICY, &e);
                Err(e)
            }
        };

        self.publish();
        outcome
    }
}

/// Keep the first occurrence of each `vehicle_id`
fn dedup_by_id(vehicles: Vec<Vehicle>) -> Vec<Vehicle> {
    let total = vehicles.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Vehicle> = vehicles
        .into_iter()
        .filter(|v| seen.insert(v.vehicle_id))
        .collect();

    if unique.len() != total {
        warn!("Dropped {} duplicate vehicles from listing", total - unique.len());
    }
    unique
}

/// Sync errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Not signed in")]
    AuthMissing,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Vehicle sync is not running")]
    Closed,
}

impl From<ApiError> for SyncError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Network(msg) | ApiError::Config(msg) => SyncError::NetworkFailure(msg),
            ApiError::Server { status, message } => SyncError::ServerError { status, message },
            ApiError::Parse(msg) => SyncError::InvalidResponse(msg),
        }
    }
}
