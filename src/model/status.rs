use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Uppercases and folds `-` / whitespace into `_`, so `"in progress"`,
/// `"In-Progress"` and `"IN_PROGRESS"` all compare equal.
pub fn normalize_status_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' | '\t' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Lifecycle of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Pending => "PENDING",
            ServiceStatus::Assigned => "ASSIGNED",
            ServiceStatus::InProgress => "IN_PROGRESS",
            ServiceStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_status_token(raw).as_str() {
            "PENDING" => Ok(ServiceStatus::Pending),
            "ASSIGNED" => Ok(ServiceStatus::Assigned),
            "IN_PROGRESS" | "INPROGRESS" => Ok(ServiceStatus::InProgress),
            "COMPLETED" => Ok(ServiceStatus::Completed),
            _ => Err(format!("unknown service status '{}'", raw)),
        }
    }
}

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_status_token(raw).as_str() {
            "PENDING" | "UNPAID" => Ok(InvoiceStatus::Pending),
            // the backend marks invoices COMPLETED once payment is processed
            "PAID" | "COMPLETED" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("unknown invoice status '{}'", raw)),
        }
    }
}

macro_rules! status_serde {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match Option::<String>::deserialize(deserializer)? {
                    Some(raw) if !raw.trim().is_empty() => {
                        raw.parse().map_err(serde::de::Error::custom)
                    }
                    _ => Ok(Self::default()),
                }
            }
        }
    };
}

status_serde!(ServiceStatus);
status_serde!(InvoiceStatus);
