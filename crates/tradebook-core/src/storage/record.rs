//! Record envelope for stored rows.

use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// A stored row with its timestamps.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Record {
    /// JSON-encoded field map.
    pub data: Vec<u8>,

    /// Creation timestamp in microseconds since Unix epoch.
    pub created_at: u64,

    /// Last update timestamp in microseconds since Unix epoch.
    pub updated_at: u64,
}

impl Record {
    /// Create a new record stamped with the current time.
    pub fn new(data: Vec<u8>) -> Self {
        let now = super::key::current_timestamp();
        Self::with_timestamps(data, now, now)
    }

    /// Create a record with explicit timestamps.
    pub fn with_timestamps(data: Vec<u8>, created_at: u64, updated_at: u64) -> Self {
        Self {
            data,
            created_at,
            updated_at,
        }
    }

    /// Replace the payload, keeping `created_at`.
    pub fn updated(&self, data: Vec<u8>) -> Self {
        let now = super::key::current_timestamp().max(self.created_at);
        Self::with_timestamps(data, self.created_at, now)
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // sled values carry no alignment guarantee
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}
