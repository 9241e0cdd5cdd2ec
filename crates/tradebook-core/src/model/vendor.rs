//! Vendor records.

use serde::{Deserialize, Serialize};

use super::{Draft, FieldMap, Model, Row, Value};
use crate::error::Error;
use crate::validation::{rules, ValidationErrors};

pub const VENDOR_NAME_MAX: usize = 50;

/// A supplier that fulfils orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: u64,
    pub name: String,
    pub promotion: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Candidate vendor fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVendor {
    pub id: Option<u64>,
    pub name: String,
    pub promotion: Option<bool>,
}

impl NewVendor {
    pub fn new(name: impl Into<String>, promotion: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            promotion: Some(promotion),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_promotion(mut self, promotion: Option<bool>) -> Self {
        self.promotion = promotion;
        self
    }
}

impl From<&Vendor> for NewVendor {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: Some(vendor.id),
            name: vendor.name.clone(),
            promotion: Some(vendor.promotion),
        }
    }
}

impl Draft for NewVendor {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        rules::presence(&mut errors, "name", &self.name);
        rules::max_length(&mut errors, "name", &self.name, VENDOR_NAME_MAX);
        rules::presence_of(&mut errors, "promotion", self.promotion.as_ref());
        rules::boolean_inclusion(&mut errors, "promotion", self.promotion);
        errors
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), Value::from(self.name.as_str()));
        fields.insert("promotion".into(), Value::from(self.promotion));
        fields
    }
}

impl Model for Vendor {
    const TABLE: &'static str = "vendors";
    type Draft = NewVendor;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_row(row: Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.id,
            name: row.text("name")?,
            promotion: row.bool("promotion")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
