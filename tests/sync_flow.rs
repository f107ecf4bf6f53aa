//! End-to-end flow: sign in, browse, favorite, survive a restart.
//!
//! Uses the real HTTP client against wiremock and the encrypted session
//! store in a temporary directory.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use vehicle_finder_lib::api::{ApiClient, VehicleApi};
use vehicle_finder_lib::auth::{AuthManager, SecretStore, SessionStore};
use vehicle_finder_lib::config::ApiConfig;
use vehicle_finder_lib::markers::{MarkerLayer, MarkerVariant};
use vehicle_finder_lib::models::{SortOrder, VehicleType};
use vehicle_finder_lib::storage::SecureStorage;
use vehicle_finder_lib::sync::{SyncError, VehicleSync};
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestEnv {
    server: MockServer,
    dir: TempDir,
    api: Arc<dyn VehicleApi>,
}

impl TestEnv {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let dir = TempDir::new().expect("create temp dir");
        let api: Arc<dyn VehicleApi> =
            Arc::new(ApiClient::new(&ApiConfig::new(&server.uri(), "key")).expect("client builds"));
        Self { server, dir, api }
    }

    fn store(&self) -> Arc<dyn SecretStore> {
        Arc::new(SessionStore::new(SecureStorage::new(self.dir.path())))
    }
}

fn listing(favorite_ids: &[i64]) -> serde_json::Value {
    let rows = [
        (1, 1, "Golf", 30.0),
        (2, 1, "Polo", 20.0),
        (3, 2, "Vespa", 10.0),
        (4, 3, "Scania", 90.0),
    ];
    json!(rows
        .iter()
        .map(|(id, type_id, name, price)| json!({
            "vehicleID": id,
            "vehicleTypeID": type_id,
            "imageURL": "",
            "name": name,
            "location": {"latitude": 44.8, "longitude": 20.4},
            "rating": 4.0,
            "price": price,
            "isFavorite": favorite_ids.contains(id)
        }))
        .collect::<Vec<_>>())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-e2e",
            "user": {"email": "driver@example.com"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sign_in_browse_and_favorite() {
    let env = TestEnv::new().await;
    mount_login(&env.server).await;
    Mock::given(method("GET"))
        .and(path("/allVehicles"))
        .and(bearer_token("tok-e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(&[])))
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/addToFavorites"))
        .and(query_param("vehicleID", "2"))
        .and(bearer_token("tok-e2e"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.server)
        .await;

    let store = env.store();
    let mut auth = AuthManager::new(env.api.clone(), store.clone());
    assert!(!auth.is_logged_in());
    auth.sign_in("driver@example.com").await.unwrap();
    assert!(auth.is_logged_in());

    let (sync, _task) = VehicleSync::spawn(env.api.clone(), store);
    sync.refresh_all().await.unwrap();

    let snap = sync.snapshot();
    assert_eq!(snap.vehicles.len(), 4);
    let names: Vec<String> = snap.visible(SortOrder::PriceAsc).into_iter().map(|v| v.name).collect();
    assert_eq!(names, vec!["Polo", "Golf"]);

    sync.toggle_favorite(2, true).await.unwrap();
    let snap = sync.snapshot();
    assert!(snap.vehicle(2).unwrap().is_favorite);
    assert!(!snap.vehicle(1).unwrap().is_favorite);

    let mut layer = MarkerLayer::new();
    layer.rebuild(&snap.visible(SortOrder::PriceAsc));
    assert_eq!(layer.markers()[0].variant, MarkerVariant::Favorite);
    assert_eq!(layer.click(1).map(|v| v.name.as_str()), Some("Golf"));
}

#[tokio::test]
async fn session_survives_restart_and_logout_ends_it() {
    let env = TestEnv::new().await;
    mount_login(&env.server).await;

    let mut auth = AuthManager::new(env.api.clone(), env.store());
    auth.sign_in("driver@example.com").await.unwrap();

    let reopened = AuthManager::new(env.api.clone(), env.store());
    assert!(reopened.is_logged_in());
    assert_eq!(env.store().get_token().as_deref(), Some("tok-e2e"));

    auth.logout().unwrap();
    assert!(env.store().get_token().is_none());
    assert!(!AuthManager::new(env.api.clone(), env.store()).is_logged_in());
}

#[tokio::test]
async fn server_failure_empties_list_but_not_on_favorite() {
    let env = TestEnv::new().await;
    mount_login(&env.server).await;
    let mut auth = AuthManager::new(env.api.clone(), env.store());
    auth.sign_in("driver@example.com").await.unwrap();

    let (sync, _task) = VehicleSync::spawn(env.api.clone(), env.store());

    {
        let _listing = Mock::given(method("GET"))
            .and(path("/allVehicles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing(&[4])))
            .mount_as_scoped(&env.server)
            .await;
        sync.set_selected_type(VehicleType::Truck).await.unwrap();
    }
    assert_eq!(sync.snapshot().vehicles_by_type.len(), 1);

    {
        let _favorite = Mock::given(method("POST"))
            .and(path("/addToFavorites"))
            .respond_with(ResponseTemplate::new(503))
            .mount_as_scoped(&env.server)
            .await;
        let before = sync.snapshot().vehicles;
        let err = sync.toggle_favorite(4, false).await.unwrap_err();
        assert!(matches!(err, SyncError::ServerError { status: 503, .. }));
        assert_eq!(sync.snapshot().vehicles, before);
    }

    {
        let _broken = Mock::given(method("GET"))
            .and(path("/allVehicles"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
            .mount_as_scoped(&env.server)
            .await;
        let err = sync.refresh_all().await.unwrap_err();
        assert_eq!(
            err,
            SyncError::ServerError {
                status: 500,
                message: "db down".into()
            }
        );
    }

    let snap = sync.snapshot();
    assert!(snap.vehicles.is_empty());
    assert!(snap.vehicles_by_type.is_empty());
    assert_eq!(snap.last_error.as_deref(), Some("Server error (500): db down"));
}

#[tokio::test]
async fn detail_without_session_is_auth_missing() {
    let env = TestEnv::new().await;
    let (sync, _task) = VehicleSync::spawn(env.api.clone(), env.store());

    assert_eq!(sync.fetch_vehicle_detail(1).await.unwrap_err(), SyncError::AuthMissing);
    assert!(env.server.received_requests().await.unwrap_or_default().is_empty());
}
