//! Optimistic mutators: try the backend first, fall back to a local-only
//! change when it cannot be reached.

use super::outcome::MutationOutcome;
use super::state::ServiceState;
use crate::cache::CacheSlot;
use crate::core::Result;
use crate::model::{
    Invoice, InvoicePatch, Mechanic, MechanicPatch, NewInvoice, NewMechanic, NewServiceRequest,
    NewVehicle, ServiceRequest, ServiceRequestPatch, Vehicle, VehiclePatch,
};
use crate::remote::RemoteSlot;
use chrono::Utc;
use tracing::{Instrument, Level, event, info_span};

impl ServiceState {
    async fn create<E: CacheSlot + RemoteSlot>(&self, draft: E::Draft) -> Result<MutationOutcome<E>> {
        E::validate_draft(&draft)?;
        let inner = &self.inner;
        let span = info_span!("garagesync.mutation", collection = %E::KIND, op = "create");
        let outcome = async move {
            match inner.backend.collection::<E>().create(&draft).await {
                Ok(record) => {
                    let record = record.into_canonical();
                    inner.mutate::<E, _>(|cache| cache.upsert(record.clone()));
                    event!(Level::INFO, id = record.id(), "created on backend");
                    MutationOutcome::Synced(record)
                }
                Err(reason) if reason.is_transport() => {
                    let record = inner.mutate::<E, _>(|cache| {
                        let id = inner.local_ids.next_free_id(|id| cache.contains_id::<E>(id));
                        let record = E::local_from_draft(id, &draft, Utc::now());
                        cache.upsert(record.clone());
                        record
                    });
                    event!(Level::WARN, id = record.id(), error = %reason, "created locally only");
                    MutationOutcome::LocalOnly { record, reason }
                }
                Err(reason) => {
                    event!(Level::WARN, error = %reason, "create rejected");
                    MutationOutcome::Rejected(reason)
                }
            }
        }
        .instrument(span)
        .await;
        Ok(outcome)
    }

    async fn update<E: CacheSlot + RemoteSlot>(
        &self,
        id: i64,
        patch: E::Patch,
    ) -> Result<MutationOutcome<Option<E>>> {
        let inner = &self.inner;
        let span = info_span!("garagesync.mutation", collection = %E::KIND, op = "update", id);
        let outcome = async move {
            match inner.backend.collection::<E>().update(id, &patch).await {
                Ok(record) => {
                    let record = record.into_canonical();
                    inner.mutate::<E, _>(|cache| cache.upsert(record.clone()));
                    event!(Level::INFO, "updated on backend");
                    MutationOutcome::Synced(Some(record))
                }
                Err(reason) if reason.is_transport() => {
                    let record = inner.mutate::<E, _>(|cache| {
                        let mut record = cache.get::<E>(id).cloned()?;
                        record.apply_patch(&patch, Utc::now());
                        cache.upsert(record.clone());
                        Some(record)
                    });
                    event!(Level::WARN, found = record.is_some(), error = %reason, "updated locally only");
                    MutationOutcome::LocalOnly { record, reason }
                }
                Err(reason) => {
                    event!(Level::WARN, error = %reason, "update rejected");
                    MutationOutcome::Rejected(reason)
                }
            }
        }
        .instrument(span)
        .await;
        Ok(outcome)
    }

    async fn delete<E: CacheSlot + RemoteSlot>(&self, id: i64) -> Result<MutationOutcome<Option<E>>> {
        let inner = &self.inner;
        let span = info_span!("garagesync.mutation", collection = %E::KIND, op = "delete", id);
        let outcome = async move {
            match inner.backend.collection::<E>().delete(id).await {
                Ok(()) => {
                    let removed = inner.mutate::<E, _>(|cache| cache.remove::<E>(id));
                    event!(Level::INFO, "deleted on backend");
                    MutationOutcome::Synced(removed)
                }
                // Already gone on the backend.
                Err(reason) if reason.is_not_found() => {
                    let removed = inner.mutate::<E, _>(|cache| cache.remove::<E>(id));
                    event!(Level::INFO, "delete of missing record");
                    MutationOutcome::Synced(removed)
                }
                Err(reason) if reason.is_transport() => {
                    let removed = inner.mutate::<E, _>(|cache| cache.remove::<E>(id));
                    event!(Level::WARN, error = %reason, "deleted locally only");
                    MutationOutcome::LocalOnly {
                        record: removed,
                        reason,
                    }
                }
                Err(reason) => {
                    event!(Level::WARN, error = %reason, "delete rejected");
                    MutationOutcome::Rejected(reason)
                }
            }
        }
        .instrument(span)
        .await;
        Ok(outcome)
    }

    pub async fn add_mechanic(&self, draft: NewMechanic) -> Result<MutationOutcome<Mechanic>> {
        self.create::<Mechanic>(draft).await
    }

    pub async fn update_mechanic(
        &self,
        id: i64,
        patch: MechanicPatch,
    ) -> Result<MutationOutcome<Option<Mechanic>>> {
        self.update::<Mechanic>(id, patch).await
    }

    pub async fn delete_mechanic(&self, id: i64) -> Result<MutationOutcome<Option<Mechanic>>> {
        self.delete::<Mechanic>(id).await
    }

    pub async fn add_service_request(
        &self,
        draft: NewServiceRequest,
    ) -> Result<MutationOutcome<ServiceRequest>> {
        self.create::<ServiceRequest>(draft).await
    }

    pub async fn update_service_request(
        &self,
        id: i64,
        patch: ServiceRequestPatch,
    ) -> Result<MutationOutcome<Option<ServiceRequest>>> {
        self.update::<ServiceRequest>(id, patch).await
    }

    pub async fn delete_service_request(
        &self,
        id: i64,
    ) -> Result<MutationOutcome<Option<ServiceRequest>>> {
        self.delete::<ServiceRequest>(id).await
    }

    pub async fn add_invoice(&self, draft: NewInvoice) -> Result<MutationOutcome<Invoice>> {
        self.create::<Invoice>(draft).await
    }

    pub async fn update_invoice(
        &self,
        id: i64,
        patch: InvoicePatch,
    ) -> Result<MutationOutcome<Option<Invoice>>> {
        self.update::<Invoice>(id, patch).await
    }

    pub async fn delete_invoice(&self, id: i64) -> Result<MutationOutcome<Option<Invoice>>> {
        self.delete::<Invoice>(id).await
    }

    pub async fn add_vehicle(&self, draft: NewVehicle) -> Result<MutationOutcome<Vehicle>> {
        self.create::<Vehicle>(draft).await
    }

    pub async fn update_vehicle(
        &self,
        id: i64,
        patch: VehiclePatch,
    ) -> Result<MutationOutcome<Option<Vehicle>>> {
        self.update::<Vehicle>(id, patch).await
    }

    pub async fn delete_vehicle(&self, id: i64) -> Result<MutationOutcome<Option<Vehicle>>> {
        self.delete::<Vehicle>(id).await
    }
}
