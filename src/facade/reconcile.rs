//! Reconciliation cycle: fetch all four collections, upload mechanics that
//! were created offline, and publish the merged result.

use super::outcome::{CollectionStatus, RefreshReport};
use super::state::StateInner;
use crate::cache::CacheSlot;
use crate::core::RemoteResult;
use crate::model::{Entity, Mechanic, Vehicle};
use std::collections::HashSet;
use tracing::{Instrument, Level, event, info_span};

/// Local mechanics the backend does not know about, keyed by email.
///
/// Duplicates by email are collapsed to the first occurrence. Records without
/// an email can never match a canonical record: they are kept only while
/// flagged unsynced, once per id.
pub fn unsynced_mechanics(local: &[Mechanic], remote: &[Mechanic]) -> Vec<Mechanic> {
    let remote_keys: HashSet<String> = remote.iter().filter_map(Mechanic::identity_key).collect();
    let mut seen_keys = HashSet::new();
    let mut seen_ids = HashSet::new();
    local
        .iter()
        .filter(|mechanic| match mechanic.identity_key() {
            Some(key) => !remote_keys.contains(&key) && seen_keys.insert(key),
            None => mechanic.unsynced && seen_ids.insert(mechanic.id),
        })
        .map(|mechanic| Mechanic {
            unsynced: true,
            ..mechanic.clone()
        })
        .collect()
}

/// Canonical list followed by the pending records it does not cover.
pub fn merge_mechanics(remote: Vec<Mechanic>, pending: &[Mechanic]) -> Vec<Mechanic> {
    let carried = unsynced_mechanics(pending, &remote);
    let mut merged = remote;
    merged.extend(carried);
    merged
}

struct MechanicSync {
    status: CollectionStatus,
    uploaded: Vec<Mechanic>,
    pending: usize,
}

pub(crate) async fn run_cycle(state: &StateInner) -> RefreshReport {
    cycle(state).instrument(info_span!("garagesync.refresh")).await
}

async fn cycle(state: &StateInner) -> RefreshReport {
    let backend = &state.backend;
    let (service_requests, mechanics, invoices, vehicles) = tokio::join!(
        backend.service_requests.get_all(),
        backend.mechanics.get_all(),
        backend.invoices.get_all(),
        backend.vehicles.get_all(),
    );
    let offline = service_requests.is_err()
        && mechanics.is_err()
        && invoices.is_err()
        && vehicles.is_err();

    let mechanics = match mechanics {
        Ok(remote) => sync_mechanics(state, remote).await,
        Err(reason) => {
            event!(Level::WARN, error = %reason, "mechanics fetch failed, using local copy");
            let local: Vec<Mechanic> = state.load();
            let pending = local.iter().filter(|mechanic| mechanic.unsynced).count();
            let count = local.len();
            state.write_cache().replace(local);
            MechanicSync {
                status: CollectionStatus::LocalFallback { count },
                uploaded: Vec::new(),
                pending,
            }
        }
    };

    let vehicles = match vehicles {
        Err(reason) if offline => {
            event!(Level::WARN, error = %reason, "vehicles fetch failed, using local copy");
            let local: Vec<Vehicle> = state.load();
            let count = local.len();
            state.write_cache().replace(local);
            CollectionStatus::LocalFallback { count }
        }
        result => publish_fetched(state, result),
    };

    let report = RefreshReport {
        service_requests: publish_fetched(state, service_requests),
        mechanics: mechanics.status,
        invoices: publish_fetched(state, invoices),
        vehicles,
        uploaded_mechanics: mechanics.uploaded,
        pending_mechanics: mechanics.pending,
        offline,
    };

    if report.offline {
        event!(Level::WARN, "backend unreachable, displaying local data");
    } else {
        event!(
            Level::INFO,
            uploaded = report.uploaded_mechanics.len(),
            pending = report.pending_mechanics,
            "refresh complete"
        );
    }
    report
}

/// Publishes a successful fetch; a failed one leaves the cache untouched.
fn publish_fetched<E: CacheSlot>(state: &StateInner, result: RemoteResult<Vec<E>>) -> CollectionStatus {
    match result {
        Ok(items) => {
            let count = items.len();
            state.publish(items);
            CollectionStatus::Fresh { count }
        }
        Err(reason) => {
            event!(Level::WARN, collection = %E::KIND, error = %reason, "fetch failed, keeping cached data");
            CollectionStatus::Stale { reason }
        }
    }
}

async fn sync_mechanics(state: &StateInner, remote: Vec<Mechanic>) -> MechanicSync {
    let count = remote.len();
    let pending = state.mutate::<Mechanic, _>(|cache| {
        let pending = unsynced_mechanics(&cache.mechanics, &remote);
        cache.replace(merge_mechanics(remote, &pending));
        pending
    });
    if pending.is_empty() {
        return MechanicSync {
            status: CollectionStatus::Fresh { count },
            uploaded: Vec::new(),
            pending: 0,
        };
    }

    event!(Level::INFO, pending = pending.len(), "uploading unsynced mechanics");
    let uploaded = upload_mechanics(state, &pending).await;

    match state.backend.mechanics.get_all().await {
        Ok(fresh) => {
            let count = fresh.len();
            let still_pending = state.mutate::<Mechanic, _>(|cache| {
                // Offline creates that landed during the upload are carried too.
                let carried: Vec<Mechanic> = cache
                    .mechanics
                    .iter()
                    .filter(|mechanic| mechanic.unsynced)
                    .cloned()
                    .collect();
                let still_pending = unsynced_mechanics(&carried, &fresh);
                cache.replace(merge_mechanics(fresh, &still_pending));
                still_pending.len()
            });
            MechanicSync {
                status: CollectionStatus::Fresh { count },
                uploaded,
                pending: still_pending,
            }
        }
        Err(reason) => {
            event!(Level::WARN, error = %reason, "mechanics re-fetch failed, keeping merged list");
            MechanicSync {
                status: CollectionStatus::Fresh { count },
                uploaded,
                pending: pending.len(),
            }
        }
    }
}

/// Creates each pending mechanic on the backend, one at a time.
async fn upload_mechanics(state: &StateInner, pending: &[Mechanic]) -> Vec<Mechanic> {
    let mut uploaded = Vec::new();
    for mechanic in pending {
        let draft = mechanic.to_draft();
        if let Err(err) = Mechanic::validate_draft(&draft) {
            event!(Level::WARN, id = mechanic.id, error = %err, "skipping unsynced mechanic");
            continue;
        }
        match state.backend.mechanics.create(&draft).await {
            Ok(created) => {
                event!(Level::INFO, email = %created.email, id = created.id, "mechanic synced to backend");
                uploaded.push(created.into_canonical());
            }
            Err(err) => {
                event!(Level::WARN, email = %mechanic.email, error = %err, "mechanic upload failed");
            }
        }
    }
    uploaded
}
