//! Row key encoding.

/// Separator between table name and id.
const SEPARATOR: u8 = 0;

/// Size of an encoded id in bytes.
pub const ID_SIZE: usize = 8;

/// Key of a row: `[table bytes][0x00][id (8 bytes, big-endian)]`.
///
/// Big-endian ids keep a table's rows in ascending id order during scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowKey<'a> {
    pub table: &'a str,
    pub id: u64,
}

impl<'a> RowKey<'a> {
    pub fn new(table: &'a str, id: u64) -> Self {
        Self { table, id }
    }

    /// Encode the key to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut key = table_prefix(self.table);
        key.extend_from_slice(&self.id.to_be_bytes());
        key
    }

    /// Decode a key belonging to `table`.
    pub fn decode(table: &'a str, bytes: &[u8]) -> Option<Self> {
        let prefix_len = table.len() + 1;
        if bytes.len() != prefix_len + ID_SIZE
            || &bytes[..table.len()] != table.as_bytes()
            || bytes[table.len()] != SEPARATOR
        {
            return None;
        }
        Some(Self {
            table,
            id: decode_id(&bytes[prefix_len..])?,
        })
    }
}

/// Prefix shared by every row of a table.
pub fn table_prefix(table: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(table.len() + 1 + ID_SIZE);
    prefix.extend_from_slice(table.as_bytes());
    prefix.push(SEPARATOR);
    prefix
}

/// Decode a big-endian id.
pub fn decode_id(bytes: &[u8]) -> Option<u64> {
    let buf: [u8; ID_SIZE] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(buf))
}

/// Get current timestamp in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
