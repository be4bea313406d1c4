use chrono::Utc;
use garagesync::model::Entity;
use garagesync::{
    Backend, CollectionStatus, EntityKind, InMemoryBackend, Invoice, LocalStore, Mechanic,
    MemoryStore, NewInvoice, NewMechanic, NewServiceRequest, NewVehicle, NoticeLevel,
    RemoteError, RemoteOp, ServiceRequest, ServiceState, Vehicle,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn fixture() -> (ServiceState, Arc<InMemoryBackend>, Arc<MemoryStore>) {
    let backend = Arc::new(InMemoryBackend::new());
    let store = Arc::new(MemoryStore::new());
    let state = ServiceState::open(store.clone(), Backend::from_shared(backend.clone()));
    (state, backend, store)
}

fn stored<T: serde::de::DeserializeOwned>(store: &MemoryStore, key: &str) -> Vec<T> {
    let raw = store.get(key).expect("store read").unwrap_or_else(|| "[]".to_string());
    serde_json::from_str(&raw).expect("stored json")
}

fn mechanic(id: i64, name: &str, email: &str) -> Mechanic {
    Mechanic::from_draft(id, &NewMechanic::new(name, email), Utc::now())
}

fn vehicle(id: i64, model: &str) -> Vehicle {
    Vehicle::from_draft(id, &NewVehicle::new("Toyota", model, 2020), Utc::now())
}

#[tokio::test]
async fn test_unsynced_mechanic_is_uploaded_and_replaced_by_canonical_record() {
    let backend = Arc::new(InMemoryBackend::new());
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            "mechanics",
            &json!([{
                "id": 1_690_000_000_000_i64,
                "name": "Jo",
                "email": "j@x.com",
                "phone": "",
                "address": "",
                "role": "MECHANIC",
                "unsynced": true,
                "password": "secret"
            }])
            .to_string(),
        )
        .expect("seed store");
    backend.set_next_id(42).await;

    let state = ServiceState::open(store.clone(), Backend::from_shared(backend.clone()));
    assert_eq!(state.mechanics().len(), 1);

    let report = state.refresh_data().await;

    assert!(!report.offline);
    assert_eq!(report.uploaded_mechanics.len(), 1);
    assert_eq!(report.uploaded_mechanics[0].id, 42);
    assert_eq!(report.pending_mechanics, 0);
    assert_eq!(backend.calls(EntityKind::Mechanics, RemoteOp::Create).await, 1);

    let mechanics = state.mechanics();
    assert_eq!(mechanics.len(), 1);
    assert_eq!(mechanics[0].id, 42);
    assert_eq!(mechanics[0].email, "j@x.com");
    assert!(!mechanics[0].unsynced);
    assert_eq!(mechanics[0].password, None);

    let persisted: Vec<Mechanic> = stored(&store, "mechanics");
    assert_eq!(persisted, mechanics);

    let notices = report.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Mechanic Jo synced to backend!");
}

#[tokio::test]
async fn test_failed_collection_keeps_its_previous_state() {
    let backend = Arc::new(InMemoryBackend::new());
    let store = Arc::new(MemoryStore::new());
    let prior = Invoice::from_draft(5, &NewInvoice::for_items(Some(1), Vec::new()), Utc::now());
    store
        .set("invoices", &serde_json::to_string(&vec![prior.clone()]).expect("encode"))
        .expect("seed store");
    let state = ServiceState::open(store.clone(), Backend::from_shared(backend.clone()));

    backend.seed(vec![vehicle(7, "Corolla")]).await;
    backend
        .seed(vec![ServiceRequest::from_draft(
            1,
            &NewServiceRequest::new(7, "Brakes squeal"),
            Utc::now(),
        )])
        .await;
    backend
        .fail(
            EntityKind::Invoices,
            RemoteOp::GetAll,
            RemoteError::Unavailable {
                status: 503,
                message: "maintenance".to_string(),
            },
        )
        .await;

    let report = state.refresh_data().await;

    assert!(!report.offline);
    assert!(matches!(report.invoices, CollectionStatus::Stale { .. }));
    assert_eq!(report.vehicles, CollectionStatus::Fresh { count: 1 });
    assert_eq!(report.service_requests, CollectionStatus::Fresh { count: 1 });
    let invoices = state.invoices();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id, prior.id);
    assert_eq!(invoices[0].service_request_id, Some(1));
    assert_eq!(state.vehicles()[0].id, 7);
    assert_eq!(state.service_requests()[0].description, "Brakes squeal");
}

#[tokio::test]
async fn test_total_failure_falls_back_to_local_store() {
    let (state, backend, store) = fixture();
    state
        .add_service_request(NewServiceRequest::new(7, "Oil change"))
        .await
        .expect("add request");

    // Another session wrote to the store since this one loaded it.
    store
        .set(
            "vehicles",
            &serde_json::to_string(&vec![vehicle(9, "Yaris")]).expect("encode"),
        )
        .expect("seed vehicles");
    store
        .set(
            "mechanics",
            &serde_json::to_string(&vec![mechanic(3, "Ana", "ana@x.com")]).expect("encode"),
        )
        .expect("seed mechanics");
    backend.set_offline(true).await;

    let report = state.refresh_data().await;

    assert!(report.offline);
    assert_eq!(report.mechanics, CollectionStatus::LocalFallback { count: 1 });
    assert_eq!(report.vehicles, CollectionStatus::LocalFallback { count: 1 });
    assert!(matches!(report.service_requests, CollectionStatus::Stale { .. }));
    assert_eq!(state.vehicles()[0].id, 9);
    assert_eq!(state.mechanics()[0].email, "ana@x.com");
    assert_eq!(state.service_requests().len(), 1);

    let notices = report.notices();
    assert!(notices.iter().any(|notice| notice.level == NoticeLevel::Warning
        && notice.message == "Could not connect to the server. Displaying local data."));
}

#[tokio::test]
async fn test_offline_create_survives_restart_and_syncs_later() {
    let (state, backend, store) = fixture();
    backend.set_offline(true).await;

    let outcome = state
        .add_mechanic(NewMechanic::new("Jo", "j@x.com").password("secret"))
        .await
        .expect("add mechanic");
    assert!(outcome.is_local_only());
    let local = outcome.into_record().expect("local record");
    assert!(local.unsynced);
    assert!(local.id >= 1_600_000_000_000);

    // New session over the same store.
    let reopened = ServiceState::open(store.clone(), Backend::from_shared(backend.clone()));
    assert_eq!(reopened.mechanics(), vec![local.clone()]);

    backend.set_offline(false).await;
    let report = reopened.refresh_data().await;
    assert_eq!(report.uploaded_mechanics.len(), 1);

    let remote = backend.items::<Mechanic>().await;
    assert_eq!(remote.len(), 1);
    assert_eq!(reopened.mechanics(), remote);
}

#[tokio::test]
async fn test_failed_upload_stays_pending_until_a_later_cycle() {
    let (state, backend, _store) = fixture();
    backend.seed(vec![mechanic(1, "Ana", "ana@x.com")]).await;
    backend.set_offline(true).await;
    state
        .add_mechanic(NewMechanic::new("Jo", "j@x.com"))
        .await
        .expect("add mechanic");
    backend.set_offline(false).await;
    backend
        .fail(
            EntityKind::Mechanics,
            RemoteOp::Create,
            RemoteError::unreachable("connection reset"),
        )
        .await;

    let first = state.refresh_data().await;
    let after_first = state.mechanics();
    assert!(first.uploaded_mechanics.is_empty());
    assert_eq!(first.pending_mechanics, 1);
    assert_eq!(after_first.len(), 2);
    assert_eq!(after_first[0].email, "ana@x.com");
    assert!(after_first[1].unsynced);

    // Same inputs, same merged list.
    let second = state.refresh_data().await;
    assert_eq!(second.pending_mechanics, 1);
    assert_eq!(state.mechanics(), after_first);

    backend.restore(EntityKind::Mechanics, RemoteOp::Create).await;
    let third = state.refresh_data().await;
    assert_eq!(third.uploaded_mechanics.len(), 1);
    assert_eq!(third.pending_mechanics, 0);
    assert!(state.mechanics().iter().all(|m| !m.unsynced));
    assert_eq!(state.mechanics().len(), 2);
}

#[tokio::test]
async fn test_mechanics_fetch_failure_uploads_nothing() {
    let (state, backend, _store) = fixture();
    backend.set_offline(true).await;
    state
        .add_mechanic(NewMechanic::new("Jo", "j@x.com"))
        .await
        .expect("add mechanic");
    backend.set_offline(false).await;
    backend
        .fail(
            EntityKind::Mechanics,
            RemoteOp::GetAll,
            RemoteError::unreachable("timeout"),
        )
        .await;

    let report = state.refresh_data().await;

    assert!(!report.offline);
    assert_eq!(report.mechanics, CollectionStatus::LocalFallback { count: 1 });
    assert_eq!(report.pending_mechanics, 1);
    assert_eq!(backend.calls(EntityKind::Mechanics, RemoteOp::Create).await, 0);
    assert!(state.mechanics()[0].unsynced);
}

#[tokio::test]
async fn test_vehicle_ids_are_numeric_after_refresh() {
    let (state, backend, _store) = fixture();
    let from_backend: Vehicle = serde_json::from_value(json!({
        "id": "7",
        "make": "Toyota",
        "model": "Corolla",
        "year": 2020
    }))
    .expect("decode vehicle");
    backend.seed(vec![from_backend]).await;

    state.refresh_data().await;

    let vehicles = state.vehicles();
    assert_eq!(vehicles[0].id, 7);
    assert!(
        state
            .update_vehicle(7, Default::default())
            .await
            .expect("update")
            .is_synced()
    );
}

#[tokio::test]
async fn test_overlapping_refreshes_share_one_cycle() {
    let (state, backend, _store) = fixture();
    backend.seed(vec![mechanic(1, "Ana", "ana@x.com")]).await;
    backend.set_latency(Some(Duration::from_millis(50))).await;

    let (first, second) = tokio::join!(state.refresh_data(), state.refresh_data());

    assert_eq!(first, second);
    assert_eq!(backend.calls(EntityKind::Mechanics, RemoteOp::GetAll).await, 1);

    state.refresh_data().await;
    assert_eq!(backend.calls(EntityKind::Mechanics, RemoteOp::GetAll).await, 2);
}

#[tokio::test]
async fn test_loading_flag_covers_the_cycle() {
    let (state, backend, _store) = fixture();
    backend.set_latency(Some(Duration::from_millis(100))).await;
    assert!(!state.is_loading());

    let handle = tokio::spawn({
        let state = state.clone();
        async move { state.refresh_data().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(state.is_loading());

    let report = handle.await.expect("refresh task");
    assert!(report.is_complete());
    assert!(!state.is_loading());
}

#[tokio::test]
async fn test_failed_vehicle_fetch_keeps_previous_vehicles() {
    let (state, backend, _store) = fixture();
    backend.seed(vec![vehicle(7, "Corolla")]).await;
    backend.seed(vec![mechanic(1, "Ana", "ana@x.com")]).await;
    let first = state.refresh_data().await;
    assert_eq!(first.vehicles, CollectionStatus::Fresh { count: 1 });

    backend.seed(vec![vehicle(8, "Yaris")]).await;
    backend
        .fail(
            EntityKind::Vehicles,
            RemoteOp::GetAll,
            RemoteError::unreachable("connection reset"),
        )
        .await;
    let second = state.refresh_data().await;

    assert!(!second.offline);
    assert!(matches!(second.vehicles, CollectionStatus::Stale { .. }));
    assert!(second.mechanics.is_fresh());
    assert!(second.service_requests.is_fresh());
    assert!(second.invoices.is_fresh());
    let vehicles = state.vehicles();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].id, 7);
}

#[tokio::test]
async fn test_canonical_mechanic_without_email_is_not_duplicated() {
    let (state, backend, store) = fixture();
    backend.seed(vec![mechanic(1, "Nameless", "")]).await;

    let mut sizes = Vec::new();
    for _ in 0..4 {
        let report = state.refresh_data().await;
        assert_eq!(report.pending_mechanics, 0);
        sizes.push(state.mechanics().len());
    }

    assert_eq!(sizes, vec![1, 1, 1, 1]);
    assert!(!state.mechanics()[0].unsynced);
    let persisted: Vec<Mechanic> = stored(&store, "mechanics");
    assert_eq!(persisted.len(), 1);
    assert_eq!(backend.calls(EntityKind::Mechanics, RemoteOp::Create).await, 0);
}

#[tokio::test]
async fn test_abandoned_refresh_still_completes() {
    let (state, backend, _store) = fixture();
    backend.seed(vec![vehicle(7, "Corolla")]).await;
    backend.set_latency(Some(Duration::from_millis(100))).await;

    let waited = tokio::time::timeout(Duration::from_millis(10), state.refresh_data()).await;
    assert!(waited.is_err());
    assert!(state.is_loading());

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!state.is_loading());
    assert_eq!(state.vehicles().len(), 1);
    assert_eq!(backend.calls(EntityKind::Vehicles, RemoteOp::GetAll).await, 1);

    // The slot was freed, so the next call starts a new cycle.
    state.refresh_data().await;
    assert_eq!(backend.calls(EntityKind::Vehicles, RemoteOp::GetAll).await, 2);
}
