//! Reply conversion into canonical value shapes.
//!
//! The target shape is chosen by the call site, not inferred from the reply:
//! the same array reply becomes an ordered [`Value::Seq`] for a list range
//! and a deduplicating [`Value::Set`] for a set read. A reply whose runtime
//! shape does not fit the requested converter fails with
//! [`ErrorKind::Unknown`](crate::error::ErrorKind::Unknown); an inline
//! server error always fails with the server's message.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::reply::Reply;
use crate::value::{ScoredValue, Value};

/// Target shape for converting one reply, chosen per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Structural passthrough: the reply mapped one-to-one into a value.
    Identity,
    /// Integer reply of a mutation-count command: 0 is false, nonzero true.
    /// `OK` statuses are true, null replies false.
    Bool,
    /// Integer reply.
    Int,
    /// Bulk reply parsed as a floating-point number.
    Double,
    /// Bulk or status reply as raw bytes; null stays absent.
    Bytes,
    /// Array reply as an ordered sequence.
    Seq,
    /// Array reply as a deduplicated member set, first insertion wins.
    Set,
    /// Flat field-value array reply as a mapping.
    Map,
    /// Flat member-score array reply as scored tuples in input order.
    Scored,
}

impl Converter {
    /// Convert a reply into the requested shape.
    pub fn apply(self, reply: Reply) -> Result<Value> {
        if let Reply::Error(msg) = reply {
            return Err(Error::Server(msg));
        }
        match self {
            Converter::Identity => identity(reply),
            Converter::Bool => to_bool(reply),
            Converter::Int => to_int(reply),
            Converter::Double => to_double(reply),
            Converter::Bytes => to_bytes(reply),
            Converter::Seq => to_seq(reply),
            Converter::Set => to_set(reply),
            Converter::Map => to_map(reply),
            Converter::Scored => to_scored(reply),
        }
    }
}

fn mismatch(expected: &str, got: &Reply) -> Error {
    Error::Unexpected(format!("expected {expected}, got {got:?}"))
}

fn identity(reply: Reply) -> Result<Value> {
    Ok(match reply {
        Reply::Nil => Value::Nil,
        Reply::Simple(s) => Value::Bytes(Bytes::from(s)),
        Reply::Int(i) => Value::Int(i),
        Reply::Bulk(b) => Value::Bytes(b),
        Reply::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Reply::Error(msg) = item {
                    return Err(Error::Server(msg));
                }
                values.push(identity(item)?);
            }
            Value::Seq(values)
        }
        Reply::Error(msg) => return Err(Error::Server(msg)),
    })
}

fn to_bool(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Int(i) => Ok(Value::Bool(i != 0)),
        Reply::Simple(s) if s == "OK" => Ok(Value::Bool(true)),
        Reply::Nil => Ok(Value::Bool(false)),
        other => Err(mismatch("integer or status", &other)),
    }
}

fn to_int(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Int(i) => Ok(Value::Int(i)),
        Reply::Nil => Ok(Value::Nil),
        other => Err(mismatch("integer", &other)),
    }
}

fn to_double(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Int(i) => Ok(Value::Double(i as f64)),
        Reply::Nil => Ok(Value::Nil),
        Reply::Bulk(b) => {
            let text = std::str::from_utf8(&b)
                .map_err(|_| Error::Unexpected("non-utf8 double reply".into()))?;
            let parsed: f64 = text
                .parse()
                .map_err(|_| Error::Unexpected(format!("unparsable double: {text}")))?;
            Ok(Value::Double(parsed))
        }
        other => Err(mismatch("bulk double", &other)),
    }
}

fn to_bytes(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Bulk(b) => Ok(Value::Bytes(b)),
        Reply::Simple(s) => Ok(Value::Bytes(Bytes::from(s))),
        Reply::Nil => Ok(Value::Nil),
        other => Err(mismatch("bulk", &other)),
    }
}

fn to_seq(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(identity(item)?);
            }
            Ok(Value::Seq(values))
        }
        Reply::Nil => Ok(Value::Nil),
        other => Err(mismatch("array", &other)),
    }
}

fn to_set(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Array(items) => {
            let mut members: Vec<Bytes> = Vec::with_capacity(items.len());
            for item in items {
                let member = element_bytes(item)?;
                if !members.contains(&member) {
                    members.push(member);
                }
            }
            Ok(Value::Set(members))
        }
        Reply::Nil => Ok(Value::Set(Vec::new())),
        other => Err(mismatch("array", &other)),
    }
}

fn to_map(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Array(items) => {
            if items.len() % 2 != 0 {
                return Err(Error::Unexpected(format!(
                    "field-value array has odd length {}",
                    items.len()
                )));
            }
            let mut pairs: Vec<(Bytes, Bytes)> = Vec::with_capacity(items.len() / 2);
            let mut items = items.into_iter();
            while let (Some(field), Some(value)) = (items.next(), items.next()) {
                let field = element_bytes(field)?;
                let value = element_bytes(value)?;
                if !pairs.iter().any(|(f, _)| *f == field) {
                    pairs.push((field, value));
                }
            }
            Ok(Value::Map(pairs))
        }
        Reply::Nil => Ok(Value::Map(Vec::new())),
        other => Err(mismatch("array", &other)),
    }
}

fn to_scored(reply: Reply) -> Result<Value> {
    match reply {
        Reply::Array(items) => {
            if items.len() % 2 != 0 {
                return Err(Error::Unexpected(format!(
                    "member-score array has odd length {}",
                    items.len()
                )));
            }
            let mut tuples: Vec<ScoredValue> = Vec::with_capacity(items.len() / 2);
            let mut items = items.into_iter();
            while let (Some(member), Some(score)) = (items.next(), items.next()) {
                let member = element_bytes(member)?;
                let score = match to_double(score)? {
                    Value::Double(d) => d,
                    other => {
                        return Err(Error::Unexpected(format!("bad score value: {other:?}")));
                    }
                };
                if !tuples.iter().any(|t| t.member == member) {
                    tuples.push(ScoredValue { member, score });
                }
            }
            Ok(Value::Scored(tuples))
        }
        Reply::Nil => Ok(Value::Scored(Vec::new())),
        other => Err(mismatch("array", &other)),
    }
}

fn element_bytes(reply: Reply) -> Result<Bytes> {
    match reply {
        Reply::Bulk(b) => Ok(b),
        Reply::Simple(s) => Ok(Bytes::from(s)),
        Reply::Error(msg) => Err(Error::Server(msg)),
        other => Err(mismatch("bulk element", &other)),
    }
}
