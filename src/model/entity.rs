use crate::core::Result;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;

/// The four collections kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    ServiceRequests,
    Mechanics,
    Invoices,
    Vehicles,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::ServiceRequests,
        EntityKind::Mechanics,
        EntityKind::Invoices,
        EntityKind::Vehicles,
    ];

    /// Local Store key holding this collection's JSON snapshot.
    pub fn storage_key(self) -> &'static str {
        match self {
            EntityKind::ServiceRequests => "serviceRequests",
            EntityKind::Mechanics => "mechanics",
            EntityKind::Invoices => "invoices",
            EntityKind::Vehicles => "vehicles",
        }
    }

    /// Singular, capitalized name for notices.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::ServiceRequests => "Service request",
            EntityKind::Mechanics => "Mechanic",
            EntityKind::Invoices => "Invoice",
            EntityKind::Vehicles => "Vehicle",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// A record type held in one of the synced collections.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Create payload sent to the backend.
    type Draft: Clone + fmt::Debug + Serialize + Send + Sync + 'static;
    /// Partial update; applying the same patch twice yields the same record.
    type Patch: Clone + fmt::Debug + Serialize + Send + Sync + 'static;

    const KIND: EntityKind;

    fn id(&self) -> i64;

    /// Rejects drafts missing the fields that identify the record.
    fn validate_draft(draft: &Self::Draft) -> Result<()>;

    /// Materializes a draft the way the backend would.
    fn from_draft(id: i64, draft: &Self::Draft, now: DateTime<Utc>) -> Self;

    /// Record synthesized on the client while the backend is unreachable.
    fn local_from_draft(id: i64, draft: &Self::Draft, now: DateTime<Utc>) -> Self {
        Self::from_draft(id, draft, now)
    }

    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);

    /// Strips client-only state from a record received from the backend.
    fn into_canonical(self) -> Self {
        self
    }
}

pub(crate) fn require_text(value: &str, entity: &'static str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(crate::core::SyncError::missing(entity, field));
    }
    Ok(())
}

/// Assigns `value` to `slot` when the patch carries it.
pub(crate) fn patch_field<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

/// Like [`patch_field`] for optional record fields.
pub(crate) fn patch_optional<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}
