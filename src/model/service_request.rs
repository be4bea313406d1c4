use super::entity::{Entity, EntityKind, patch_field, patch_optional, require_text};
use super::service_item::ServiceItem;
use super::status::ServiceStatus;
use crate::core::ids::{numeric_id, optional_numeric_id};
use crate::core::nullable::null_default;
use crate::core::time::lenient_timestamp;
use crate::core::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub id: i64,
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub vehicle_id: i64,
    #[serde(
        default,
        deserialize_with = "optional_numeric_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub mechanic_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanic_name: Option<String>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub service_type: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanic_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub service_items: Vec<ServiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRequest {
    pub vehicle_id: i64,
    pub description: String,
    pub service_type: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_items: Vec<ServiceItem>,
}

impl NewServiceRequest {
    pub fn new(vehicle_id: i64, description: impl Into<String>) -> Self {
        Self {
            vehicle_id,
            description: description.into(),
            service_type: "GENERAL".to_string(),
            priority: "MEDIUM".to_string(),
            preferred_date: None,
            user_id: None,
            service_items: Vec::new(),
        }
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn preferred_date(mut self, date: impl Into<String>) -> Self {
        self.preferred_date = Some(date.into());
        self
    }

    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanic_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanic_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_items: Option<Vec<ServiceItem>>,
}

impl ServiceRequestPatch {
    pub fn status(status: ServiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn assign(mechanic_id: i64, mechanic_name: impl Into<String>) -> Self {
        Self {
            mechanic_id: Some(mechanic_id),
            mechanic_name: Some(mechanic_name.into()),
            status: Some(ServiceStatus::Assigned),
            ..Default::default()
        }
    }
}

impl Entity for ServiceRequest {
    type Draft = NewServiceRequest;
    type Patch = ServiceRequestPatch;

    const KIND: EntityKind = EntityKind::ServiceRequests;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate_draft(draft: &NewServiceRequest) -> Result<()> {
        if draft.vehicle_id <= 0 {
            return Err(SyncError::missing("service request", "vehicleId"));
        }
        require_text(&draft.description, "service request", "description")
    }

    fn from_draft(id: i64, draft: &NewServiceRequest, now: DateTime<Utc>) -> Self {
        Self {
            id,
            vehicle_id: draft.vehicle_id,
            mechanic_id: None,
            mechanic_name: None,
            description: draft.description.clone(),
            service_type: draft.service_type.clone(),
            priority: draft.priority.clone(),
            preferred_date: draft.preferred_date.clone(),
            status: ServiceStatus::Pending,
            mechanic_notes: None,
            created_at: Some(now),
            assigned_at: None,
            updated_at: None,
            service_items: draft.service_items.clone(),
        }
    }

    fn apply_patch(&mut self, patch: &ServiceRequestPatch, now: DateTime<Utc>) {
        let reassigned = patch.mechanic_id.is_some() && patch.mechanic_id != self.mechanic_id;
        patch_optional(&mut self.mechanic_id, &patch.mechanic_id);
        patch_optional(&mut self.mechanic_name, &patch.mechanic_name);
        patch_field(&mut self.description, &patch.description);
        patch_field(&mut self.service_type, &patch.service_type);
        patch_field(&mut self.priority, &patch.priority);
        patch_optional(&mut self.preferred_date, &patch.preferred_date);
        patch_field(&mut self.status, &patch.status);
        patch_optional(&mut self.mechanic_notes, &patch.mechanic_notes);
        patch_field(&mut self.service_items, &patch.service_items);
        if reassigned {
            self.assigned_at = Some(now);
        }
    }
}
