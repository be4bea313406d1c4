//! Remote Collection Client: CRUD against the backend, one seam per entity kind.

pub mod http;
pub mod memory;

pub use http::{HttpBackend, HttpResource, Route};
pub use memory::{InMemoryBackend, RemoteOp};

use crate::core::RemoteResult;
use crate::model::{Entity, Invoice, Mechanic, ServiceRequest, Vehicle};
use async_trait::async_trait;
use std::sync::Arc;

/// CRUD surface for one collection. Every call independently succeeds or fails;
/// ordinary failures come back as [`RemoteError`](crate::core::RemoteError)
/// values rather than panics.
#[async_trait]
pub trait RemoteCollection<E: Entity>: Send + Sync {
    async fn get_all(&self) -> RemoteResult<Vec<E>>;
    async fn create(&self, draft: &E::Draft) -> RemoteResult<E>;
    async fn update(&self, id: i64, patch: &E::Patch) -> RemoteResult<E>;
    async fn delete(&self, id: i64) -> RemoteResult<()>;
}

/// The four collection clients the reconciler talks to.
#[derive(Clone)]
pub struct Backend {
    pub service_requests: Arc<dyn RemoteCollection<ServiceRequest>>,
    pub mechanics: Arc<dyn RemoteCollection<Mechanic>>,
    pub invoices: Arc<dyn RemoteCollection<Invoice>>,
    pub vehicles: Arc<dyn RemoteCollection<Vehicle>>,
}

impl Backend {
    /// Uses one shared implementation for all four collections.
    pub fn from_shared<B>(backend: Arc<B>) -> Self
    where
        B: RemoteCollection<ServiceRequest>
            + RemoteCollection<Mechanic>
            + RemoteCollection<Invoice>
            + RemoteCollection<Vehicle>
            + 'static,
    {
        Self {
            service_requests: backend.clone(),
            mechanics: backend.clone(),
            invoices: backend.clone(),
            vehicles: backend,
        }
    }

    pub fn collection<E: RemoteSlot>(&self) -> &dyn RemoteCollection<E> {
        E::remote(self)
    }
}

/// Picks an entity's client out of a [`Backend`].
pub trait RemoteSlot: Entity {
    fn remote(backend: &Backend) -> &dyn RemoteCollection<Self>;
}

impl RemoteSlot for ServiceRequest {
    fn remote(backend: &Backend) -> &dyn RemoteCollection<Self> {
        backend.service_requests.as_ref()
    }
}

impl RemoteSlot for Mechanic {
    fn remote(backend: &Backend) -> &dyn RemoteCollection<Self> {
        backend.mechanics.as_ref()
    }
}

impl RemoteSlot for Invoice {
    fn remote(backend: &Backend) -> &dyn RemoteCollection<Self> {
        backend.invoices.as_ref()
    }
}

impl RemoteSlot for Vehicle {
    fn remote(backend: &Backend) -> &dyn RemoteCollection<Self> {
        backend.vehicles.as_ref()
    }
}
