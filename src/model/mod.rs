//! Domain records for the four synced collections.

pub mod entity;
pub mod invoice;
pub mod mechanic;
pub mod service_item;
pub mod service_request;
pub mod status;
pub mod vehicle;

pub use entity::{Entity, EntityKind};
pub use invoice::{Invoice, InvoicePatch, NewInvoice};
pub use mechanic::{MECHANIC_ROLE, Mechanic, MechanicPatch, NewMechanic};
pub use service_item::{ServiceItem, items_total};
pub use service_request::{NewServiceRequest, ServiceRequest, ServiceRequestPatch};
pub use status::{InvoiceStatus, ServiceStatus};
pub use vehicle::{NewVehicle, Vehicle, VehiclePatch};
