//! Stored entity records
//!
//! Identifier layout (12 bytes, rendered as 24 lowercase hex chars):
//!
//! ```text
//! +-----------------+-------------------+-------------+
//! | seconds (u32 BE)| process random (5)| counter (3) |
//! +-----------------+-------------------+-------------+
//! ```
//!
//! Identifiers are unique per process and never reused.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Storage identifier of a record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; 12]);

impl RecordId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        static PROCESS: OnceLock<[u8; 5]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let process = PROCESS.get_or_init(rand::random);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;
        let seconds = Utc::now().timestamp() as u32;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self(bytes)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self)
    }
}

/// The text is not 24 hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid record identifier")]
pub struct ParseRecordIdError(pub String);

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseRecordIdError(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseRecordIdError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Current time truncated to millisecond precision
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Timestamp for a write following one stamped `previous`; always later.
pub fn next_updated(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_millis();
    let floor = previous + Duration::milliseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

/// Canonical text form of a stored timestamp
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A typed, validated record as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: RecordId,
    pub type_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// User data; never contains identity or bookkeeping keys
    pub fields: Map<String, Value>,
}

impl EntityRecord {
    /// A new record stamped with a fresh id and the current time
    pub fn new(type_name: impl Into<String>, fields: Map<String, Value>) -> Self {
        let now = now_millis();
        Self {
            id: RecordId::generate(),
            type_name: type_name.into(),
            created_at: now,
            updated_at: now,
            fields,
        }
    }
}
