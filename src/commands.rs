//! Commands Module
//!
//! Presentation-layer operations invoked by the command line.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::auth::SecretStore;
use crate::markers::{MapMarker, MarkerLayer};
use crate::models::{SortOrder, Vehicle, VehicleType};
use crate::AppState;

// Response types for the presentation layer

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResult {
    pub was_signed_in: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub success: bool,
    pub email: Option<String>,
    pub error: Option<String>,
}

/// Filter applied to list and map views
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub vehicle_type: VehicleType,
    pub query: String,
    pub sort: SortOrder,
}

// Commands

/// Get stored session from secure storage
pub fn get_stored_session(store: &dyn SecretStore) -> Option<SessionResponse> {
    debug!("Getting stored session");

    match store.get_token().and_then(|_| store.load()) {
        Some(session) => Some(SessionResponse {
            email: session.email,
        }),
        None => {
            debug!("No stored session found");
            None
        }
    }
}

/// Sign in with an email address
pub async fn login(email: &str, state: &AppState) -> LoginResult {
    info!("Signing in");

    let mut auth = state.auth.lock().await;
    match auth.sign_in(email).await {
        Ok(session) => LoginResult {
            success: true,
            email: Some(session.email),
            error: None,
        },
        Err(e) => {
            error!("Sign in failed: {}", e);
            LoginResult {
                success: false,
                email: None,
                error: auth.state().error_message.clone(),
            }
        }
    }
}

/// Logout and clear session. Works from the store alone so it needs no API settings.
pub fn logout(store: &dyn SecretStore) -> Result<LogoutResult, String> {
    info!("Logging out");

    let was_signed_in = store.get_token().is_some();
    store.clear().map_err(|e| e.to_string())?;
    Ok(LogoutResult { was_signed_in })
}

/// Vehicles of one category, filtered and sorted
pub async fn list_vehicles(filter: &ListFilter, state: &AppState) -> Result<Vec<Vehicle>, String> {
    apply_filter(filter, state).await?;
    Ok(state.sync.snapshot().visible(filter.sort))
}

/// Favorited vehicles across all categories
pub async fn list_favorites(state: &AppState) -> Result<Vec<Vehicle>, String> {
    state.sync.refresh_all().await.map_err(|e| e.to_string())?;

    let favorites = state.sync.snapshot().favorites();
    debug!("Displaying {} favorite vehicles", favorites.len());
    Ok(favorites)
}

/// Set a vehicle's favorite flag and return the updated entry
pub async fn set_favorite(vehicle_id: i64, value: bool, state: &AppState) -> Result<Vehicle, String> {
    state.sync.refresh_all().await.map_err(|e| e.to_string())?;
    state
        .sync
        .toggle_favorite(vehicle_id, value)
        .await
        .map_err(|e| e.to_string())?;

    state
        .sync
        .snapshot()
        .vehicle(vehicle_id)
        .cloned()
        .ok_or_else(|| format!("Vehicle {} not found", vehicle_id))
}

/// Details of a single vehicle
pub async fn vehicle_detail(vehicle_id: i64, state: &AppState) -> Result<Vehicle, String> {
    state
        .sync
        .fetch_vehicle_detail(vehicle_id)
        .await
        .map_err(|e| e.to_string())
}

/// Markers for the filtered list
pub async fn map_markers(filter: &ListFilter, state: &AppState) -> Result<Vec<MapMarker>, String> {
    let visible = list_vehicles(filter, state).await?;

    let mut layer = MarkerLayer::new();
    layer.rebuild(&visible);
    Ok(layer.markers().to_vec())
}

async fn apply_filter(filter: &ListFilter, state: &AppState) -> Result<(), String> {
    state
        .sync
        .set_selected_type(filter.vehicle_type)
        .await
        .map_err(|e| e.to_string())?;

    if !filter.query.is_empty() {
        state
            .sync
            .set_search_query(filter.query.clone())
            .await
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::ApiError;
    use crate::auth::fakes::MemoryStore;
    use crate::auth::{Session, SessionStore};
    use crate::markers::MarkerVariant;
    use crate::sync::fakes::FakeApi;
    use crate::view::fixtures::vehicle;

    fn state(api: FakeApi, store: MemoryStore) -> AppState {
        AppState::with_parts(Arc::new(api), Arc::new(store))
    }

    fn fleet() -> Vec<Vehicle> {
        vec![
            vehicle(1, 1, "Golf", 30.0),
            vehicle(2, 1, "Polo", 20.0),
            vehicle(3, 2, "Vespa", 10.0),
        ]
    }

    #[tokio::test]
    async fn login_then_status_then_logout() {
        let state = state(FakeApi::default(), MemoryStore::default());
        assert!(get_stored_session(state.store.as_ref()).is_none());

        let result = login("driver@example.com", &state).await;
        assert!(result.success);
        assert_eq!(
            get_stored_session(state.store.as_ref()).map(|s| s.email).as_deref(),
            Some("driver@example.com")
        );

        let result = logout(state.store.as_ref()).unwrap();
        assert!(result.was_signed_in);
        assert!(get_stored_session(state.store.as_ref()).is_none());
    }

    #[test]
    fn blank_stored_token_is_not_a_session() {
        let store = MemoryStore::with_token("  ");
        assert!(get_stored_session(&store).is_none());
        assert!(!logout(&store).unwrap().was_signed_in);
    }

    #[test]
    fn status_and_logout_work_from_disk_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path());
        store
            .save(&Session {
                token: "tok".into(),
                email: "driver@example.com".into(),
            })
            .unwrap();

        let reopened = SessionStore::open(dir.path());
        assert_eq!(
            get_stored_session(&reopened).map(|s| s.email).as_deref(),
            Some("driver@example.com")
        );
        assert!(logout(&reopened).unwrap().was_signed_in);
        assert!(get_stored_session(&SessionStore::open(dir.path())).is_none());
    }

    #[tokio::test]
    async fn failed_login_carries_message() {
        let api = FakeApi::default();
        api.fail_with(ApiError::Network("offline".into()));
        let state = state(api, MemoryStore::default());

        let result = login("driver@example.com", &state).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Network error: offline"));
    }

    #[tokio::test]
    async fn list_applies_type_query_and_sort() {
        let state = state(FakeApi::with_vehicles(fleet()), MemoryStore::with_token("t"));
        let filter = ListFilter {
            vehicle_type: VehicleType::Car,
            query: String::new(),
            sort: SortOrder::PriceDesc,
        };

        let names: Vec<String> = list_vehicles(&filter, &state)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Golf", "Polo"]);

        let filter = ListFilter {
            query: "pol".into(),
            ..filter
        };
        let listed = list_vehicles(&filter, &state).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].vehicle_id, 2);
    }

    #[tokio::test]
    async fn favorite_shows_up_in_favorites_and_markers() {
        let state = state(FakeApi::with_vehicles(fleet()), MemoryStore::with_token("t"));

        let updated = set_favorite(3, true, &state).await.unwrap();
        assert!(updated.is_favorite);

        let favorites = list_favorites(&state).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].vehicle_id, 3);

        let filter = ListFilter {
            vehicle_type: VehicleType::Motorcycle,
            ..ListFilter::default()
        };
        let markers = map_markers(&filter, &state).await.unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].variant, MarkerVariant::Favorite);
        assert_eq!(markers[0].label, "10.00€");
    }

    #[tokio::test]
    async fn commands_without_session_report_sign_in() {
        let state = state(FakeApi::with_vehicles(fleet()), MemoryStore::default());
        let err = list_vehicles(&ListFilter::default(), &state).await.unwrap_err();
        assert_eq!(err, "Not signed in");

        let err = vehicle_detail(1, &state).await.unwrap_err();
        assert_eq!(err, "Not signed in");
    }
}
