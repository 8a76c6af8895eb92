//! Canonical driver-agnostic value shapes.
//!
//! Every reply a caller observes has been converted into a [`Value`]; the
//! native [`Reply`](crate::reply::Reply) type never crosses the crate
//! boundary upward. Text decoding is deliberately absent: bulk data stays
//! `Bytes`, and a higher-layer serializer decides what those bytes mean.

use bytes::Bytes;

/// A member together with its sorted-set score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredValue {
    pub member: Bytes,
    pub score: f64,
}

impl ScoredValue {
    pub fn new(member: impl Into<Bytes>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// A converted reply value.
///
/// `Set`, `Map` and `Scored` deduplicate on member while preserving first
/// insertion order, matching the linked-set semantics Redis set replies carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (missing key, elapsed blocking pop).
    Nil,
    /// Boolean, from integer replies of mutation-count commands.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating-point score or increment result.
    Double(f64),
    /// Raw data bytes, never implicitly decoded to text.
    Bytes(Bytes),
    /// Ordered sequence (list ranges, nested transaction results).
    Seq(Vec<Value>),
    /// Deduplicated members in first-insertion order.
    Set(Vec<Bytes>),
    /// Field-value pairs in first-insertion order.
    Map(Vec<(Bytes, Bytes)>),
    /// Scored members in first-insertion order.
    Scored(Vec<ScoredValue>),
}

impl Value {
    /// Check if absent.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Try to get as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as a string, if the bytes happen to be valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Try to get as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Try to get as an ordered sequence.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }
}
