use super::entity::{Entity, EntityKind, patch_field, require_text};
use crate::core::Result;
use crate::core::ids::numeric_id;
use crate::core::nullable::null_default;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MECHANIC_ROLE: &str = "MECHANIC";

fn default_role() -> String {
    MECHANIC_ROLE.to_string()
}

// null or blank roles read as the mechanic role
fn role_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let role = Option::<String>::deserialize(deserializer)?;
    Ok(role
        .filter(|role| !role.trim().is_empty())
        .unwrap_or_else(default_role))
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A user account with the mechanic role.
///
/// Identity is the email address compared case-insensitively; ids differ
/// between a locally synthesized record and its canonical counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    #[serde(deserialize_with = "numeric_id::deserialize")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub email: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub address: String,
    #[serde(default = "default_role", deserialize_with = "role_or_default")]
    pub role: String,
    /// Present only in the Local Store, waiting for upload.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unsynced: bool,
    /// Kept on unsynced records so the deferred registration can be replayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Mechanic {
    /// Normalized identity key; `None` for records without an email.
    pub fn identity_key(&self) -> Option<String> {
        identity_key(&self.email)
    }

    pub fn same_identity(&self, other: &Mechanic) -> bool {
        match (self.identity_key(), other.identity_key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Registration payload used when uploading an unsynced record.
    pub fn to_draft(&self) -> NewMechanic {
        NewMechanic {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            password: self.password.clone(),
        }
    }
}

pub fn identity_key(email: &str) -> Option<String> {
    let trimmed = email.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMechanic {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewMechanic {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            address: String::new(),
            password: None,
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MechanicPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Entity for Mechanic {
    type Draft = NewMechanic;
    type Patch = MechanicPatch;

    const KIND: EntityKind = EntityKind::Mechanics;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate_draft(draft: &NewMechanic) -> Result<()> {
        require_text(&draft.email, "mechanic", "email")?;
        require_text(&draft.name, "mechanic", "name")
    }

    fn from_draft(id: i64, draft: &NewMechanic, _now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.clone(),
            address: draft.address.clone(),
            role: default_role(),
            unsynced: false,
            password: None,
        }
    }

    fn local_from_draft(id: i64, draft: &NewMechanic, now: DateTime<Utc>) -> Self {
        Self {
            unsynced: true,
            password: draft.password.clone(),
            ..Self::from_draft(id, draft, now)
        }
    }

    fn apply_patch(&mut self, patch: &MechanicPatch, _now: DateTime<Utc>) {
        patch_field(&mut self.name, &patch.name);
        patch_field(&mut self.phone, &patch.phone);
        patch_field(&mut self.address, &patch.address);
    }

    // The users endpoint echoes the stored password hash; never mirror it locally.
    fn into_canonical(self) -> Self {
        Self {
            unsynced: false,
            password: None,
            ..self
        }
    }
}
