//! Native reply values as produced by an underlying client library.
//!
//! A [`Reply`] is what the adapter hands back before any conversion: the
//! direct image of a RESP reply. Per-command server errors travel inline as
//! [`Reply::Error`] so that one failed command inside a transaction does not
//! disturb its siblings.

use bytes::Bytes;

/// A raw reply from the underlying client.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Null reply (missing key, elapsed blocking pop, aborted EXEC).
    Nil,
    /// Simple string (status replies like "OK" or "QUEUED").
    Simple(String),
    /// Integer reply.
    Int(i64),
    /// Bulk string (actual data bytes).
    Bulk(Bytes),
    /// Array of replies.
    Array(Vec<Reply>),
    /// Server-reported error for this command.
    Error(String),
}

impl Reply {
    /// Check if this is the null reply.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Check if this is a server-reported error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Try to get the reply as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            Reply::Simple(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get the reply as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(i) => Some(*i),
            _ => None,
        }
    }
}
