//! Authentication Module
//!
//! Handles the stored session credential and the sign-in flow.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::{ApiError, VehicleApi};
use crate::storage::{SecureStorage, StorageError};

const SESSION_KEY: &str = "session";

/// Session data stored securely on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub email: String,
}

/// Persistent home of the session credential
pub trait SecretStore: Send + Sync {
    fn save(&self, session: &Session) -> Result<(), StorageError>;

    fn load(&self) -> Option<Session>;

    fn clear(&self) -> Result<(), StorageError>;

    /// Stored token, `None` when absent or blank
    fn get_token(&self) -> Option<String> {
        self.load()
            .map(|s| s.token)
            .filter(|t| !t.trim().is_empty())
    }
}

/// `SecretStore` backed by encrypted files
pub struct SessionStore {
    storage: SecureStorage,
}

impl SessionStore {
    pub fn new(storage: SecureStorage) -> Self {
        Self { storage }
    }

    /// Session store kept under `data_dir`
    pub fn open(data_dir: &Path) -> Self {
        Self::new(SecureStorage::new(data_dir))
    }
}

impl SecretStore for SessionStore {
    fn save(&self, session: &Session) -> Result<(), StorageError> {
        self.storage.save(SESSION_KEY, session)
    }

    fn load(&self) -> Option<Session> {
        match self.storage.load::<Session>(SESSION_KEY) {
            Ok(session) => Some(session),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                warn!("Stored session is unreadable: {}", e);
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.storage.delete(SESSION_KEY)
    }
}

/// Sign-in progress as seen by the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInState {
    pub is_loading: bool,
    pub is_success: bool,
    pub is_logged_in: bool,
    pub token: Option<String>,
    pub error_message: Option<String>,
}

/// Manages authentication state
pub struct AuthManager {
    api: Arc<dyn VehicleApi>,
    store: Arc<dyn SecretStore>,
    state: SignInState,
}

impl AuthManager {
    /// Create a new auth manager; logged in if a token is already stored
    pub fn new(api: Arc<dyn VehicleApi>, store: Arc<dyn SecretStore>) -> Self {
        let state = SignInState {
            is_logged_in: store.get_token().is_some(),
            ..SignInState::default()
        };
        Self { api, store, state }
    }

    pub fn state(&self) -> &SignInState {
        &self.state
    }

    /// Check if currently authenticated
    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in
    }

    /// Log in with `email` and persist the returned credential
    pub async fn sign_in(&mut self, email: &str) -> Result<Session, AuthError> {
        self.state = SignInState {
            is_loading: true,
            ..SignInState::default()
        };

        let response = match self.api.login(email).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Sign in failed: {}", e);
                let message = match &e {
                    ApiError::Server { .. } => "Login failed".to_string(),
                    other => other.to_string(),
                };
                self.state = SignInState {
                    error_message: Some(message),
                    ..SignInState::default()
                };
                return Err(AuthError::Api(e));
            }
        };

        let session = Session {
            token: response.token,
            email: response.user.email,
        };

        if let Err(e) = self.store.save(&session) {
            error!("Failed to save session: {}", e);
            self.state = SignInState {
                error_message: Some(e.to_string()),
                ..SignInState::default()
            };
            return Err(AuthError::Storage(e));
        }

        info!("Signed in as: {}", session.email);
        self.state = SignInState {
            is_success: true,
            is_logged_in: true,
            token: Some(session.token.clone()),
            ..SignInState::default()
        };
        Ok(session)
    }

    /// Clear the stored session
    pub fn logout(&mut self) -> Result<(), AuthError> {
        info!("Logging out");
        self.store.clear()?;
        self.state = SignInState::default();
        Ok(())
    }
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
