use super::entity::{Entity, EntityKind, patch_field, patch_optional, require_text};
use crate::core::Result;
use crate::core::ids::{numeric_id, optional_numeric_id};
use crate::core::nullable::null_default;
use crate::core::time::lenient_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer vehicle. The id is always numeric, whatever the wire carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub id: i64,
    #[serde(
        default,
        deserialize_with = "optional_numeric_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub make: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub model: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    /// Selects the owner-scoped create endpoint; not part of the body.
    #[serde(skip)]
    pub owner_id: Option<i64>,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
}

impl NewVehicle {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: i32) -> Self {
        Self {
            owner_id: None,
            make: make.into(),
            model: model.into(),
            year,
            license_plate: None,
            vin_number: None,
            mileage: None,
        }
    }

    pub fn owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn license_plate(mut self, plate: impl Into<String>) -> Self {
        self.license_plate = Some(plate.into());
        self
    }

    pub fn mileage(mut self, mileage: u32) -> Self {
        self.mileage = Some(mileage);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
}

impl Entity for Vehicle {
    type Draft = NewVehicle;
    type Patch = VehiclePatch;

    const KIND: EntityKind = EntityKind::Vehicles;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate_draft(draft: &NewVehicle) -> Result<()> {
        require_text(&draft.make, "vehicle", "make")?;
        require_text(&draft.model, "vehicle", "model")
    }

    fn from_draft(id: i64, draft: &NewVehicle, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.owner_id,
            make: draft.make.clone(),
            model: draft.model.clone(),
            year: draft.year,
            license_plate: draft.license_plate.clone(),
            vin_number: draft.vin_number.clone(),
            mileage: draft.mileage,
            last_service_date: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn apply_patch(&mut self, patch: &VehiclePatch, _now: DateTime<Utc>) {
        patch_field(&mut self.make, &patch.make);
        patch_field(&mut self.model, &patch.model);
        patch_field(&mut self.year, &patch.year);
        patch_optional(&mut self.license_plate, &patch.license_plate);
        patch_optional(&mut self.vin_number, &patch.vin_number);
        patch_optional(&mut self.mileage, &patch.mileage);
    }
}
