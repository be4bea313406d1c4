use crate::core::ids::optional_numeric_id;
use crate::core::nullable::null_default;
use serde::{Deserialize, Serialize};

/// Line entry attached to a service request or an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    #[serde(
        default,
        deserialize_with = "optional_numeric_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_info: Option<String>,
}

impl ServiceItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            price,
            quantity: None,
            item_type: None,
            part_number: None,
            warranty_info: None,
        }
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// `price * quantity`, with a missing quantity counting as one.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity.unwrap_or(1))
    }
}

/// Sum of all line totals.
pub fn items_total(items: &[ServiceItem]) -> f64 {
    items.iter().map(ServiceItem::line_total).sum()
}
