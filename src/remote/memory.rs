use super::RemoteCollection;
use crate::core::{RemoteError, RemoteResult};
use crate::model::{Entity, EntityKind, Invoice, Mechanic, ServiceRequest, Vehicle};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    GetAll,
    Create,
    Update,
    Delete,
}

/// Tables and fault switches behind an [`InMemoryBackend`].
#[derive(Default)]
pub struct BackendState {
    service_requests: Vec<ServiceRequest>,
    mechanics: Vec<Mechanic>,
    invoices: Vec<Invoice>,
    vehicles: Vec<Vehicle>,
    next_id: i64,
    offline: bool,
    latency: Option<Duration>,
    failures: HashMap<(EntityKind, RemoteOp), RemoteError>,
    calls: HashMap<(EntityKind, RemoteOp), usize>,
}

/// In-memory stand-in for the REST backend.
///
/// Behaves like the real service (server-assigned ids, unique mechanic emails)
/// and lets tests take it offline or make individual operations fail.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

/// Gives [`InMemoryBackend`] access to an entity's table.
pub trait MemoryResource: Entity {
    fn rows(state: &mut BackendState) -> &mut Vec<Self>;

    /// Rejects a create that the real backend would refuse.
    fn check_unique(_rows: &[Self], _draft: &Self::Draft) -> RemoteResult<()> {
        Ok(())
    }
}

impl MemoryResource for ServiceRequest {
    fn rows(state: &mut BackendState) -> &mut Vec<Self> {
        &mut state.service_requests
    }
}

impl MemoryResource for Mechanic {
    fn rows(state: &mut BackendState) -> &mut Vec<Self> {
        &mut state.mechanics
    }

    fn check_unique(rows: &[Self], draft: &Self::Draft) -> RemoteResult<()> {
        let key = crate::model::mechanic::identity_key(&draft.email);
        if rows.iter().any(|row| row.identity_key() == key) {
            return Err(RemoteError::rejected(409, "Email is already registered"));
        }
        Ok(())
    }
}

impl MemoryResource for Invoice {
    fn rows(state: &mut BackendState) -> &mut Vec<Self> {
        &mut state.invoices
    }
}

impl MemoryResource for Vehicle {
    fn rows(state: &mut BackendState) -> &mut Vec<Self> {
        &mut state.vehicles
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as unreachable while offline.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Delay applied to every call before it is served.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// Id handed to the next created record (ids count up from there).
    pub async fn set_next_id(&self, next_id: i64) {
        self.state.lock().await.next_id = next_id;
    }

    pub async fn fail(&self, kind: EntityKind, op: RemoteOp, error: RemoteError) {
        self.state.lock().await.failures.insert((kind, op), error);
    }

    pub async fn restore(&self, kind: EntityKind, op: RemoteOp) {
        self.state.lock().await.failures.remove(&(kind, op));
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    pub async fn calls(&self, kind: EntityKind, op: RemoteOp) -> usize {
        self.state
            .lock()
            .await
            .calls
            .get(&(kind, op))
            .copied()
            .unwrap_or(0)
    }

    /// Inserts canonical records directly, bypassing failure injection.
    pub async fn seed<E: MemoryResource>(&self, items: Vec<E>) {
        let mut state = self.state.lock().await;
        let max_id = items.iter().map(Entity::id).max().unwrap_or(0);
        state.next_id = state.next_id.max(max_id + 1);
        E::rows(&mut state).extend(items);
    }

    pub async fn items<E: MemoryResource>(&self) -> Vec<E> {
        E::rows(&mut *self.state.lock().await).clone()
    }

    async fn begin(&self, kind: EntityKind, op: RemoteOp) -> RemoteResult<()> {
        let latency = {
            let mut state = self.state.lock().await;
            *state.calls.entry((kind, op)).or_insert(0) += 1;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.lock().await;
        if state.offline {
            return Err(RemoteError::unreachable("backend is offline"));
        }
        match state.failures.get(&(kind, op)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn allocate_id(state: &mut BackendState) -> i64 {
    let id = state.next_id.max(1);
    state.next_id = id + 1;
    id
}

#[async_trait]
impl<E: MemoryResource> RemoteCollection<E> for InMemoryBackend {
    async fn get_all(&self) -> RemoteResult<Vec<E>> {
        self.begin(E::KIND, RemoteOp::GetAll).await?;
        Ok(E::rows(&mut *self.state.lock().await).clone())
    }

    async fn create(&self, draft: &E::Draft) -> RemoteResult<E> {
        self.begin(E::KIND, RemoteOp::Create).await?;
        let mut state = self.state.lock().await;
        E::check_unique(E::rows(&mut state), draft)?;
        let id = allocate_id(&mut state);
        let record = E::from_draft(id, draft, Utc::now());
        E::rows(&mut state).push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: i64, patch: &E::Patch) -> RemoteResult<E> {
        self.begin(E::KIND, RemoteOp::Update).await?;
        let mut state = self.state.lock().await;
        let record = E::rows(&mut state)
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| RemoteError::not_found(format!("{} {} not found", E::KIND.label(), id)))?;
        record.apply_patch(patch, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> RemoteResult<()> {
        self.begin(E::KIND, RemoteOp::Delete).await?;
        let mut state = self.state.lock().await;
        let rows = E::rows(&mut state);
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Err(RemoteError::not_found(format!(
                "{} {} not found",
                E::KIND.label(),
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewMechanic, NewVehicle};

    #[tokio::test]
    async fn test_create_assigns_ids_and_enforces_unique_email() {
        let backend = InMemoryBackend::new();
        backend.set_next_id(42).await;

        let created =
            RemoteCollection::<Mechanic>::create(&backend, &NewMechanic::new("Jo", "j@x.com"))
                .await
                .unwrap();
        assert_eq!(created.id, 42);

        let duplicate = RemoteCollection::<Mechanic>::create(
            &backend,
            &NewMechanic::new("Jo", "J@X.com"),
        )
        .await
        .unwrap_err();
        assert_eq!(duplicate.status(), Some(409));
        assert!(!duplicate.is_transport());
    }

    #[tokio::test]
    async fn test_offline_and_injected_failures() {
        let backend = InMemoryBackend::new();
        backend.set_offline(true).await;
        let err = RemoteCollection::<Vehicle>::get_all(&backend).await.unwrap_err();
        assert!(err.is_transport());

        backend.set_offline(false).await;
        backend
            .fail(
                EntityKind::Vehicles,
                RemoteOp::Create,
                RemoteError::rejected(422, "year out of range"),
            )
            .await;
        let err = RemoteCollection::<Vehicle>::create(&backend, &NewVehicle::new("VW", "Up", 1800))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert!(RemoteCollection::<Vehicle>::get_all(&backend).await.unwrap().is_empty());
        assert_eq!(backend.calls(EntityKind::Vehicles, RemoteOp::GetAll).await, 2);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = RemoteCollection::<Invoice>::delete(&backend, 5).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
