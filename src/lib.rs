//! Vehicle Finder Library
//!
//! Core modules for the rental vehicle client.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod markers;
pub mod models;
pub mod storage;
pub mod sync;
pub mod view;

use std::sync::Arc;

use api::{ApiClient, ApiError, VehicleApi};
use auth::{AuthManager, SecretStore, SessionStore};
use config::ApiConfig;
use sync::VehicleSync;

/// Application state shared across commands
pub struct AppState {
    pub auth: tokio::sync::Mutex<AuthManager>,
    pub store: Arc<dyn SecretStore>,
    pub sync: VehicleSync,
}

impl AppState {
    /// Wire the API client, encrypted session store and sync actor.
    /// Must be called inside a tokio runtime.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let api: Arc<dyn VehicleApi> = Arc::new(ApiClient::new(config)?);
        let store: Arc<dyn SecretStore> = Arc::new(SessionStore::open(&config.data_dir));
        Ok(Self::with_parts(api, store))
    }

    pub fn with_parts(api: Arc<dyn VehicleApi>, store: Arc<dyn SecretStore>) -> Self {
        let (sync, _task) = VehicleSync::spawn(api.clone(), store.clone());
        Self {
            auth: tokio::sync::Mutex::new(AuthManager::new(api, store.clone())),
            store,
            sync,
        }
    }
}
