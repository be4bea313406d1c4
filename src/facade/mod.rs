//! `ServiceState`: the entity cache, the local store and the backend behind
//! one handle, with optimistic mutators and the reconciliation cycle.

mod mutations;
pub mod outcome;
pub mod reconcile;
mod state;

pub use outcome::{
    CollectionStatus, MutationKind, MutationOutcome, Notice, NoticeLevel, RefreshReport,
};
pub use reconcile::{merge_mechanics, unsynced_mechanics};
pub use state::ServiceState;
