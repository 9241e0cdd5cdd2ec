//! Orders, each linking one client to one vendor.

use serde::{Deserialize, Serialize};

use super::{Draft, FieldMap, Model, Row, Value};
use crate::error::Error;
use crate::validation::{rules, ValidationErrors};

pub const ORDER_SUMMARY_MAX: usize = 140;

/// A purchase linking one client to one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub client_id: u64,
    pub vendor_id: u64,
    pub summary: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Candidate order fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewOrder {
    pub id: Option<u64>,
    pub client_id: Option<u64>,
    pub vendor_id: Option<u64>,
    pub summary: String,
}

impl NewOrder {
    pub fn new(client_id: u64, vendor_id: u64, summary: impl Into<String>) -> Self {
        Self {
            id: None,
            client_id: Some(client_id),
            vendor_id: Some(vendor_id),
            summary: summary.into(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

impl From<&Order> for NewOrder {
    fn from(order: &Order) -> Self {
        Self {
            id: Some(order.id),
            client_id: Some(order.client_id),
            vendor_id: Some(order.vendor_id),
            summary: order.summary.clone(),
        }
    }
}

impl Draft for NewOrder {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        rules::presence_of(&mut errors, "client_id", self.client_id.as_ref());
        rules::presence_of(&mut errors, "vendor_id", self.vendor_id.as_ref());
        rules::presence(&mut errors, "summary", &self.summary);
        rules::max_length(&mut errors, "summary", &self.summary, ORDER_SUMMARY_MAX);
        errors
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("client_id".into(), Value::from(self.client_id));
        fields.insert("vendor_id".into(), Value::from(self.vendor_id));
        fields.insert("summary".into(), Value::from(self.summary.as_str()));
        fields
    }
}

impl Model for Order {
    const TABLE: &'static str = "orders";
    type Draft = NewOrder;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_row(row: Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.id,
            client_id: row.id_field("client_id")?,
            vendor_id: row.id_field("vendor_id")?,
            summary: row.text("summary")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationKind;

    #[test]
    fn test_valid_order() {
        let draft = NewOrder::new(1, 2, "Walnut side table");
        assert!(draft.validate().is_empty());
    }

    #[test]
    fn test_missing_foreign_keys_and_summary() {
        let errors = NewOrder::default().validate();
        assert!(errors.has("client_id", ValidationKind::Presence));
        assert!(errors.has("vendor_id", ValidationKind::Presence));
        assert!(errors.has("summary", ValidationKind::Presence));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_summary_limit() {
        let ok = NewOrder::new(1, 1, "s".repeat(ORDER_SUMMARY_MAX));
        assert!(ok.validate().is_empty());

        let long = NewOrder::new(1, 1, "s".repeat(ORDER_SUMMARY_MAX + 1));
        assert!(long.validate().has("summary", ValidationKind::Length));
    }

    #[test]
    fn test_missing_vendor_is_stored_as_null() {
        let draft = NewOrder {
            vendor_id: None,
            ..NewOrder::new(1, 1, "Lamp")
        };
        assert!(draft.to_fields()["vendor_id"].is_null());
    }
}
