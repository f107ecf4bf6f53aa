//! API Client Module
//!
//! Handles HTTP communication with the vehicle rental API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::models::{LoginRequest, LoginResponse, Vehicle};

const API_KEY_HEADER: &str = "x-api-key";

/// Remote operations the rest of the crate depends on
#[async_trait]
pub trait VehicleApi: Send + Sync {
    async fn login(&self, email: &str) -> Result<LoginResponse, ApiError>;

    async fn list_vehicles(&self, access_token: &str) -> Result<Vec<Vehicle>, ApiError>;

    /// Success carries no payload
    async fn add_favorite(&self, access_token: &str, vehicle_id: i64) -> Result<(), ApiError>;

    async fn get_vehicle(&self, access_token: &str, vehicle_id: i64) -> Result<Vehicle, ApiError>;
}

/// API client for the rental backend
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client. Every request carries the API key and JSON headers.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| ApiError::Config(format!("invalid API key: {}", e)))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    format!("Status: {}", status)
                } else {
                    body
                }
            });
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VehicleApi for ApiClient {
    async fn login(&self, email: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url("login");
        debug!("Logging in at: {}", url);

        let response = self
            .send(self.client.post(&url).json(&LoginRequest { email }))
            .await?;

        let data = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        info!("Login succeeded for: {}", data.user.email);
        Ok(data)
    }

    async fn list_vehicles(&self, access_token: &str) -> Result<Vec<Vehicle>, ApiError> {
        let url = self.url("allVehicles");
        debug!("Fetching vehicles from: {}", url);

        let response = self
            .send(self.client.get(&url).bearer_auth(access_token))
            .await?;

        let vehicles = response
            .json::<Vec<Vehicle>>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        info!("Fetched {} vehicles", vehicles.len());
        Ok(vehicles)
    }

    async fn add_favorite(&self, access_token: &str, vehicle_id: i64) -> Result<(), ApiError> {
        let url = self.url("addToFavorites");
        debug!("Adding vehicle {} to favorites at: {}", vehicle_id, url);

        self.send(
            self.client
                .post(&url)
                .bearer_auth(access_token)
                .query(&[("vehicleID", vehicle_id)]),
        )
        .await?;

        info!("Vehicle {} added to favorites", vehicle_id);
        Ok(())
    }

    async fn get_vehicle(&self, access_token: &str, vehicle_id: i64) -> Result<Vehicle, ApiError> {
        let url = self.url("vehicle");
        debug!("Fetching vehicle {} from: {}", vehicle_id, url);

        let response = self
            .send(
                self.client
                    .get(&url)
                    .bearer_auth(access_token)
                    .query(&[("vehicleID", vehicle_id)]),
            )
            .await?;

        response
            .json::<Vehicle>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(alias = "message")]
    error: String,
}

/// API errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}
