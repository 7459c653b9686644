//! Values a variable can hold.
//!
//! `Value` is the single-element currency of the engine: it is what
//! `prepare` writes and what the typed readers return. Array variables are
//! read and written one element at a time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PseError, PseResult};
use crate::variable::StorageKind;

/// Simulation time as supplied by the host runtime.
///
/// Hosts built on optimistic discrete-event kernels represent time as a
/// double; this newtype is the single point of contact if that changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(pub f64);

impl SimTime {
    /// Returns the raw time value.
    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.0
    }
}

impl From<f64> for SimTime {
    fn from(t: f64) -> Self {
        Self(t)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single element of variable content.
///
/// # Examples
///
/// ```
/// use pse::{StorageKind, Value};
///
/// let v = Value::Double(12.4);
/// assert_eq!(v.storage(), StorageKind::Double);
/// assert_eq!(v.as_double(), Some(12.4));
/// assert_eq!(v.as_int(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Double(f64),
    String(String),
    Time(SimTime),
}

impl Value {
    /// Storage kind this value belongs to.
    #[must_use]
    pub const fn storage(&self) -> StorageKind {
        match self {
            Self::Int(_) => StorageKind::Int,
            Self::Double(_) => StorageKind::Double,
            Self::String(_) => StorageKind::String,
            Self::Time(_) => StorageKind::Time,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_time(&self) -> Option<SimTime> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.storage().name()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<SimTime> for Value {
    fn from(v: SimTime) -> Self {
        Self::Time(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Time(v) => write!(f, "t={v}"),
        }
    }
}

/// Fixed-length owned byte buffer backing one string element.
///
/// The buffer is allocated once with its full length and never grows past
/// it. Content is always valid UTF-8; the sampler only ever replaces ASCII
/// bytes with printable ASCII bytes.
#[derive(Debug, PartialEq, Eq)]
pub struct TextBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl Clone for TextBuffer {
    fn clone(&self) -> Self {
        let mut bytes = Vec::with_capacity(self.limit);
        bytes.extend_from_slice(&self.bytes);
        Self {
            bytes,
            limit: self.limit,
        }
    }
}

impl TextBuffer {
    /// Allocates an empty buffer of `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Replaces the content.
    ///
    /// # Errors
    ///
    /// Returns `PseError::StringTooLong` if `text` does not fit.
    pub fn set(&mut self, text: &str) -> PseResult<()> {
        if text.len() > self.limit {
            return Err(PseError::StringTooLong {
                len: text.len(),
                max: self.limit,
            });
        }
        self.bytes.clear();
        self.bytes.extend_from_slice(text.as_bytes());
        Ok(())
    }

    /// Current content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the buffer holds no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Buffer length in bytes.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently allocated for the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Replaces one ASCII byte with another ASCII byte.
    ///
    /// Returns false (and leaves the buffer untouched) if either byte is not
    /// ASCII or `pos` is out of range, which would break UTF-8.
    pub(crate) fn replace_ascii(&mut self, pos: usize, byte: u8) -> bool {
        match self.bytes.get_mut(pos) {
            Some(slot) if slot.is_ascii() && byte.is_ascii() => {
                *slot = byte;
                true
            }
            _ => false,
        }
    }

    /// Content as an owned string.
    #[must_use]
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
