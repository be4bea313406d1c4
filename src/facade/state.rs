use super::outcome::{Notice, RefreshReport};
use super::reconcile;
use crate::cache::{CacheSlot, EntityCache};
use crate::config::SyncConfig;
use crate::core::{LocalIdGenerator, RemoteError, Result};
use crate::model::{EntityKind, Invoice, Mechanic, ServiceRequest, Vehicle};
use crate::remote::{Backend, HttpBackend};
use crate::storage::{FileStore, LocalStore, MemoryStore, load_collection, save_collection};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{Level, event};

type InFlightCycle = Shared<BoxFuture<'static, RefreshReport>>;

/// Shared handle to the client-side data layer.
///
/// Clones are cheap and all observe the same cache, store and backend.
#[derive(Clone)]
pub struct ServiceState {
    pub(crate) inner: Arc<StateInner>,
}

pub(crate) struct StateInner {
    pub(crate) store: Arc<dyn LocalStore>,
    pub(crate) backend: Backend,
    cache: RwLock<EntityCache>,
    pub(crate) loading: AtomicBool,
    pub(crate) local_ids: LocalIdGenerator,
    in_flight: Mutex<Option<InFlightCycle>>,
}

impl StateInner {
    // Poisoning is ignored: the cache only holds plain collections.
    pub(crate) fn read_cache(&self) -> RwLockReadGuard<'_, EntityCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_cache(&self) -> RwLockWriteGuard<'_, EntityCache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn load<E: CacheSlot>(&self) -> Vec<E> {
        load_collection(self.store.as_ref(), E::KIND.storage_key())
    }

    /// Writes the cached collection through to the Local Store.
    /// Failures are logged; the cache stays authoritative for this session.
    pub(crate) fn mirror<E: CacheSlot>(&self, cache: &EntityCache) {
        let key = E::KIND.storage_key();
        if let Err(err) = save_collection(self.store.as_ref(), key, cache.items::<E>()) {
            event!(Level::WARN, key, error = %err, "local store write failed");
        }
    }

    /// Applies `f` to the cache and mirrors collection `E` while still holding
    /// the write lock, so store writes land in cache order.
    pub(crate) fn mutate<E: CacheSlot, R>(&self, f: impl FnOnce(&mut EntityCache) -> R) -> R {
        let mut cache = self.write_cache();
        let result = f(&mut cache);
        self.mirror::<E>(&cache);
        result
    }

    pub(crate) fn publish<E: CacheSlot>(&self, items: Vec<E>) {
        self.mutate::<E, _>(|cache| cache.replace(items));
    }
}

impl ServiceState {
    /// Builds the state over an injected store and backend, seeding the cache
    /// from whatever the store holds.
    pub fn open(store: Arc<dyn LocalStore>, backend: Backend) -> Self {
        let inner = StateInner {
            store,
            backend,
            cache: RwLock::new(EntityCache::new()),
            loading: AtomicBool::new(false),
            local_ids: LocalIdGenerator::new(),
            in_flight: Mutex::new(None),
        };
        let cache = EntityCache {
            service_requests: inner.load(),
            mechanics: inner.load(),
            invoices: inner.load(),
            vehicles: inner.load(),
        };
        event!(
            Level::DEBUG,
            service_requests = cache.service_requests.len(),
            mechanics = cache.mechanics.len(),
            invoices = cache.invoices.len(),
            vehicles = cache.vehicles.len(),
            "loaded local snapshot"
        );
        *inner.write_cache() = cache;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// HTTP backend plus a [`FileStore`] when a storage directory is
    /// configured, otherwise a session-scoped [`MemoryStore`].
    pub fn connect(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn LocalStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStore::open(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        let backend = Backend::from_shared(Arc::new(HttpBackend::new(config)?));
        event!(Level::INFO, api_url = %config.api_url, "service state connected");
        Ok(Self::open(store, backend))
    }

    pub fn service_requests(&self) -> Vec<ServiceRequest> {
        self.inner.read_cache().service_requests.clone()
    }

    pub fn mechanics(&self) -> Vec<Mechanic> {
        self.inner.read_cache().mechanics.clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.inner.read_cache().invoices.clone()
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.inner.read_cache().vehicles.clone()
    }

    pub fn snapshot(&self) -> EntityCache {
        self.inner.read_cache().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Purges every collection from the Local Store and the cache.
    ///
    /// Runs under the cache write lock so readers see either the old state or
    /// the empty one.
    pub fn clear_all_data(&self) -> Notice {
        let mut cache = self.inner.write_cache();
        for kind in EntityKind::ALL {
            let key = kind.storage_key();
            if let Err(err) = self.inner.store.remove(key) {
                event!(Level::WARN, key, error = %err, "failed to purge local collection");
            }
        }
        cache.clear();
        event!(Level::INFO, "local data cleared");
        Notice::info("All local data has been cleared.")
    }

    /// Runs one reconciliation cycle, or joins the one already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn refresh_data(&self) -> RefreshReport {
        let cycle = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(cycle) => {
                    event!(Level::DEBUG, "joining in-flight refresh");
                    cycle.clone()
                }
                None => {
                    // The cycle runs as its own task so it completes even when
                    // every caller stops waiting for it.
                    self.inner.loading.store(true, Ordering::SeqCst);
                    let inner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move {
                        let _guard = CycleGuard(Arc::clone(&inner));
                        reconcile::run_cycle(&inner).await
                    });
                    let cycle = async move {
                        task.await.unwrap_or_else(|err| {
                            event!(Level::ERROR, error = %err, "refresh task failed");
                            RefreshReport::failed(RemoteError::unreachable(format!(
                                "refresh task failed: {}",
                                err
                            )))
                        })
                    }
                    .boxed()
                    .shared();
                    *slot = Some(cycle.clone());
                    cycle
                }
            }
        };
        cycle.await
    }
}

/// Ends a cycle: clears the loading flag and frees the in-flight slot, also
/// when the cycle task panics.
struct CycleGuard(Arc<StateInner>);

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.loading.store(false, Ordering::SeqCst);
        self.0
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
