// ============================================================================
// garagesync Library
// ============================================================================

//! Offline-first data layer for a vehicle-service client.
//!
//! [`ServiceState`] keeps an in-memory cache of service requests, mechanics,
//! invoices and vehicles, mirrors it into a [`LocalStore`], and reconciles it
//! with the backend through [`RemoteCollection`] clients. Mutations are
//! optimistic: when the backend cannot be reached they are recorded locally
//! and reported as [`MutationOutcome::LocalOnly`].
//!
//! ```no_run
//! use garagesync::{EntityKind, MutationKind, NewMechanic, ServiceState, SyncConfig};
//!
//! # async fn run() -> garagesync::Result<()> {
//! let state = ServiceState::connect(&SyncConfig::from_env()?)?;
//! let report = state.refresh_data().await;
//! for notice in report.notices() {
//!     println!("{}", notice.message);
//! }
//!
//! let outcome = state
//!     .add_mechanic(NewMechanic::new("Jo", "j@x.com").password("secret"))
//!     .await?;
//! let notice = outcome.notice(EntityKind::Mechanics, MutationKind::Create);
//! println!("{}", notice.message);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod facade;
pub mod model;
pub mod remote;
pub mod storage;

// Re-export main types for convenience
pub use cache::EntityCache;
pub use config::SyncConfig;
pub use core::{RemoteError, RemoteResult, Result, SyncError};
pub use facade::{
    CollectionStatus, MutationKind, MutationOutcome, Notice, NoticeLevel, RefreshReport,
    ServiceState,
};
pub use model::{
    EntityKind, Invoice, InvoicePatch, InvoiceStatus, Mechanic, MechanicPatch, NewInvoice,
    NewMechanic, NewServiceRequest, NewVehicle, ServiceItem, ServiceRequest, ServiceRequestPatch,
    ServiceStatus, Vehicle, VehiclePatch,
};

// Re-export the seams
pub use remote::{Backend, HttpBackend, InMemoryBackend, RemoteCollection, RemoteOp};
pub use storage::{FileStore, LocalStore, MemoryStore};
