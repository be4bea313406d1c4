//! Entity Cache: the in-memory, UI-facing view of the four collections.

use crate::model::{Entity, Invoice, Mechanic, ServiceRequest, Vehicle};

/// Plain state holder. Ids are unique within a collection, except that the
/// mechanic list may briefly carry a duplicate while a reconciliation cycle is
/// between its merge and its re-fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCache {
    pub service_requests: Vec<ServiceRequest>,
    pub mechanics: Vec<Mechanic>,
    pub invoices: Vec<Invoice>,
    pub vehicles: Vec<Vehicle>,
}

/// Routes generic cache operations to the right collection.
pub trait CacheSlot: Entity {
    fn slot(cache: &EntityCache) -> &Vec<Self>;
    fn slot_mut(cache: &mut EntityCache) -> &mut Vec<Self>;
}

impl CacheSlot for ServiceRequest {
    fn slot(cache: &EntityCache) -> &Vec<Self> {
        &cache.service_requests
    }

    fn slot_mut(cache: &mut EntityCache) -> &mut Vec<Self> {
        &mut cache.service_requests
    }
}

impl CacheSlot for Mechanic {
    fn slot(cache: &EntityCache) -> &Vec<Self> {
        &cache.mechanics
    }

    fn slot_mut(cache: &mut EntityCache) -> &mut Vec<Self> {
        &mut cache.mechanics
    }
}

impl CacheSlot for Invoice {
    fn slot(cache: &EntityCache) -> &Vec<Self> {
        &cache.invoices
    }

    fn slot_mut(cache: &mut EntityCache) -> &mut Vec<Self> {
        &mut cache.invoices
    }
}

impl CacheSlot for Vehicle {
    fn slot(cache: &EntityCache) -> &Vec<Self> {
        &cache.vehicles
    }

    fn slot_mut(cache: &mut EntityCache) -> &mut Vec<Self> {
        &mut cache.vehicles
    }
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items<E: CacheSlot>(&self) -> &[E] {
        E::slot(self)
    }

    pub fn get<E: CacheSlot>(&self, id: i64) -> Option<&E> {
        E::slot(self).iter().find(|item| item.id() == id)
    }

    pub fn contains_id<E: CacheSlot>(&self, id: i64) -> bool {
        self.get::<E>(id).is_some()
    }

    /// Publishes a whole collection as-is.
    pub fn replace<E: CacheSlot>(&mut self, items: Vec<E>) {
        *E::slot_mut(self) = items;
    }

    /// Replaces the record with the same id in place, or appends it.
    pub fn upsert<E: CacheSlot>(&mut self, item: E) {
        let slot = E::slot_mut(self);
        match slot.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => slot.push(item),
        }
    }

    /// Removes the record with `id`; a missing id is a no-op.
    pub fn remove<E: CacheSlot>(&mut self, id: i64) -> Option<E> {
        let slot = E::slot_mut(self);
        let position = slot.iter().position(|item| item.id() == id)?;
        Some(slot.remove(position))
    }

    pub fn clear(&mut self) {
        self.service_requests.clear();
        self.mechanics.clear();
        self.invoices.clear();
        self.vehicles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.service_requests.is_empty()
            && self.mechanics.is_empty()
            && self.invoices.is_empty()
            && self.vehicles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewInvoice, NewVehicle, VehiclePatch};
    use chrono::Utc;

    fn vehicle(id: i64, model: &str) -> Vehicle {
        Vehicle::from_draft(id, &NewVehicle::new("Toyota", model, 2020), Utc::now())
    }

    #[test]
    fn test_upsert_keeps_ids_unique() {
        let mut cache = EntityCache::new();
        cache.upsert(vehicle(7, "Corolla"));
        cache.upsert(vehicle(8, "Yaris"));
        cache.upsert(vehicle(7, "Camry"));

        assert_eq!(cache.items::<Vehicle>().len(), 2);
        assert_eq!(cache.get::<Vehicle>(7).unwrap().model, "Camry");
        assert_eq!(cache.items::<Vehicle>()[0].id, 7);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cache = EntityCache::new();
        cache.upsert(vehicle(7, "Corolla"));
        assert!(cache.remove::<Vehicle>(7).is_some());
        assert!(cache.remove::<Vehicle>(7).is_none());
        assert!(!cache.contains_id::<Vehicle>(7));
    }

    #[test]
    fn test_collections_are_independent() {
        let mut cache = EntityCache::new();
        cache.upsert(vehicle(1, "Corolla"));
        cache.upsert(Invoice::from_draft(1, &NewInvoice::for_items(None, Vec::new()), Utc::now()));
        cache.replace::<Vehicle>(Vec::new());

        assert!(cache.vehicles.is_empty());
        assert_eq!(cache.invoices.len(), 1);
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_patch_through_cache_entry() {
        let mut cache = EntityCache::new();
        cache.upsert(vehicle(3, "Corolla"));
        let mut updated = cache.get::<Vehicle>(3).cloned().unwrap();
        updated.apply_patch(
            &VehiclePatch {
                mileage: Some(10_000),
                ..Default::default()
            },
            Utc::now(),
        );
        cache.upsert(updated);
        assert_eq!(cache.get::<Vehicle>(3).unwrap().mileage, Some(10_000));
    }
}
