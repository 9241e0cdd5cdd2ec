//! Typed records and their drafts.
//!
//! A [`Model`] is a typed view of a stored row. Its [`Draft`] is the
//! candidate field set handed to the store on create and update; the draft
//! checks the rules that need no storage access (presence, length, format,
//! inclusion) and the store adds uniqueness and reference checks.

mod client;
mod order;
mod row;
mod value;
mod vendor;

pub use client::{Client, NewClient, CLIENT_EMAIL_MAX, CLIENT_NAME_MAX};
pub use order::{NewOrder, Order, ORDER_SUMMARY_MAX};
pub use row::Row;
pub use value::{decode_fields, encode_fields, FieldMap, Value};
pub use vendor::{NewVendor, Vendor, VENDOR_NAME_MAX};

use crate::error::Error;
use crate::validation::ValidationErrors;

/// A typed record bound to one table.
pub trait Model: Sized {
    /// Table the model is stored in.
    const TABLE: &'static str;

    /// Candidate field set for create and update.
    type Draft: Draft;

    fn id(&self) -> u64;

    fn from_row(row: Row) -> Result<Self, Error>;
}

/// Candidate fields for a record.
pub trait Draft {
    /// Explicit id requested by the caller. Ignored on update.
    fn id(&self) -> Option<u64>;

    /// Field-level rules. Every failure is collected.
    fn validate(&self) -> ValidationErrors;

    /// The field map that will be stored.
    fn to_fields(&self) -> FieldMap;
}
