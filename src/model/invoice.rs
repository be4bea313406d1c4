use super::entity::{Entity, EntityKind, patch_field, patch_optional};
use super::service_item::ServiceItem;
use super::status::InvoiceStatus;
use crate::core::ids::{numeric_id, optional_numeric_id};
use crate::core::nullable::null_default;
use crate::core::time::lenient_timestamp;
use crate::core::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub id: i64,
    #[serde(
        default,
        deserialize_with = "optional_numeric_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_request_id: Option<i64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub status: InvoiceStatus,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub service_items: Vec<ServiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_request_id: Option<i64>,
    pub total_amount: f64,
    pub status: InvoiceStatus,
    pub service_items: Vec<ServiceItem>,
}

impl NewInvoice {
    /// Pending invoice whose total is the sum of `items`.
    pub fn for_items(service_request_id: Option<i64>, items: Vec<ServiceItem>) -> Self {
        Self {
            service_request_id,
            total_amount: super::service_item::items_total(&items),
            status: InvoiceStatus::Pending,
            service_items: items,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_items: Option<Vec<ServiceItem>>,
}

impl Entity for Invoice {
    type Draft = NewInvoice;
    type Patch = InvoicePatch;

    const KIND: EntityKind = EntityKind::Invoices;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate_draft(draft: &NewInvoice) -> Result<()> {
        if !draft.total_amount.is_finite() || draft.total_amount < 0.0 {
            return Err(SyncError::InvalidInput(format!(
                "invoice total must be a non-negative amount, got {}",
                draft.total_amount
            )));
        }
        Ok(())
    }

    fn from_draft(id: i64, draft: &NewInvoice, now: DateTime<Utc>) -> Self {
        Self {
            id,
            service_request_id: draft.service_request_id,
            total_amount: draft.total_amount,
            status: draft.status,
            created_at: Some(now),
            paid_at: (draft.status == InvoiceStatus::Paid).then_some(now),
            payment_method: None,
            service_items: draft.service_items.clone(),
        }
    }

    fn apply_patch(&mut self, patch: &InvoicePatch, now: DateTime<Utc>) {
        let newly_paid =
            patch.status == Some(InvoiceStatus::Paid) && self.status != InvoiceStatus::Paid;
        patch_field(&mut self.total_amount, &patch.total_amount);
        patch_field(&mut self.status, &patch.status);
        patch_optional(&mut self.payment_method, &patch.payment_method);
        patch_field(&mut self.service_items, &patch.service_items);
        if newly_paid {
            self.paid_at = Some(now);
        }
    }
}
