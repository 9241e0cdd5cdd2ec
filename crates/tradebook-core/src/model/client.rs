//! Client records and the rules a new or edited client must pass.

use serde::{Deserialize, Serialize};

use super::{Draft, FieldMap, Model, Row, Value};
use crate::error::Error;
use crate::validation::{rules, ValidationErrors};

pub const CLIENT_NAME_MAX: usize = 50;
pub const CLIENT_EMAIL_MAX: usize = 255;

/// A customer who places orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Candidate client fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewClient {
    pub id: Option<u64>,
    pub name: String,
    pub email: String,
    pub active: Option<bool>,
}

impl NewClient {
    /// Active client with the given name and email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            active: Some(true),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_active(mut self, active: Option<bool>) -> Self {
        self.active = active;
        self
    }
}

impl From<&Client> for NewClient {
    fn from(client: &Client) -> Self {
        Self {
            id: Some(client.id),
            name: client.name.clone(),
            email: client.email.clone(),
            active: Some(client.active),
        }
    }
}

impl Draft for NewClient {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        rules::presence(&mut errors, "name", &self.name);
        rules::max_length(&mut errors, "name", &self.name, CLIENT_NAME_MAX);
        rules::presence(&mut errors, "email", &self.email);
        rules::max_length(&mut errors, "email", &self.email, CLIENT_EMAIL_MAX);
        rules::email_format(&mut errors, "email", &self.email);
        rules::boolean_inclusion(&mut errors, "active", self.active);
        errors
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), Value::from(self.name.as_str()));
        fields.insert("email".into(), Value::from(self.email.as_str()));
        fields.insert("active".into(), Value::from(self.active));
        fields
    }
}

impl Model for Client {
    const TABLE: &'static str = "clients";
    type Draft = NewClient;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_row(row: Row) -> Result<Self, Error> {
        Ok(Self {
            id: row.id,
            name: row.text("name")?,
            email: row.text("email")?,
            active: row.bool("active")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
