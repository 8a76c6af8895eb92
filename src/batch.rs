//! Batch result collection for one open transaction or pipeline.
//!
//! A [`Batch`] owns the deferred results issued during one batch, in issue
//! order. On completion it resolves every entry in that order: server-side
//! failures are recorded in place of the entry's value and resolution
//! continues, so one bad command cannot lose its siblings' results. Only a
//! broken transport (or a blown resolve deadline) aborts the walk early.

use std::time::Duration;

use crate::connection::PendingReply;
use crate::convert::Converter;
use crate::deferred::{Deferred, resolve_pending};
use crate::error::{BatchFailure, Error, Result};
use crate::reply::Reply;
use crate::value::Value;

/// One collected entry: a plain command, or a whole transaction committed
/// while the pipeline was open. The transaction stays a single entry whose
/// resolved value is itself the ordered sequence of its sub-results.
#[derive(Debug)]
pub enum BatchEntry<P> {
    Command(Deferred<P>),
    Transaction {
        pending: P,
        shapes: Vec<Option<Converter>>,
    },
}

/// Ordered deferred results of one open transaction or pipeline.
#[derive(Debug)]
pub struct Batch<P> {
    entries: Vec<BatchEntry<P>>,
}

impl<P> Default for Batch<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Batch<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: PendingReply> Batch<P> {
    /// Append a deferred command result.
    pub fn push(&mut self, deferred: Deferred<P>) {
        self.entries.push(BatchEntry::Command(deferred));
    }

    /// Append a committed transaction as a single nested entry.
    pub fn push_transaction(&mut self, pending: P, shapes: Vec<Option<Converter>>) {
        self.entries.push(BatchEntry::Transaction { pending, shapes });
    }

    /// Drop the pending handles, keeping the converters in issue order.
    ///
    /// Used when this batch backs a transaction: EXEC delivers the replies
    /// positionally, so the per-command handles are never consumed.
    pub fn into_shapes(self) -> Vec<Option<Converter>> {
        self.entries
            .into_iter()
            .map(|entry| match entry {
                BatchEntry::Command(deferred) => deferred.into_converter(),
                // A transaction nested in a transaction cannot be queued;
                // treat its slot as structural passthrough.
                BatchEntry::Transaction { .. } => Some(Converter::Identity),
            })
            .collect()
    }

    /// Resolve every entry in issue order.
    ///
    /// Successful acknowledgement-only entries contribute no output value.
    /// If any entry failed, the aggregate [`Error::Batch`] carries the full
    /// partial sequence. Transport failures propagate immediately.
    pub async fn resolve_all(
        self,
        convert: bool,
        deadline: Option<Duration>,
    ) -> Result<Vec<Value>> {
        let mut partial: Vec<std::result::Result<Value, Error>> = Vec::new();
        let mut first_failed: Option<usize> = None;

        for entry in self.entries {
            let outcome = match entry {
                BatchEntry::Command(deferred) => {
                    let ack = deferred.is_ack();
                    match deferred.resolve_with(convert, deadline).await {
                        Ok(value) => {
                            if ack {
                                continue;
                            }
                            Ok(value)
                        }
                        Err(e) if e.aborts_batch() => return Err(e),
                        Err(e) => Err(e),
                    }
                }
                BatchEntry::Transaction { pending, shapes } => {
                    match resolve_pending(pending, deadline).await {
                        Ok(reply) => resolve_exec_reply(reply, shapes, convert).map(Value::Seq),
                        Err(e) if e.aborts_batch() => return Err(e),
                        Err(e) => Err(e),
                    }
                }
            };
            if outcome.is_err() && first_failed.is_none() {
                first_failed = Some(partial.len());
            }
            partial.push(outcome);
        }

        match first_failed {
            Some(index) => Err(Error::Batch(BatchFailure {
                partial,
                first_failed: index,
            })),
            None => Ok(partial.into_iter().filter_map(|r| r.ok()).collect()),
        }
    }
}

/// Convert an EXEC reply against the converters recorded at issue time.
///
/// The array entries are matched positionally. A `Nil` reply (transaction
/// aborted by the server) and an empty transaction both yield an empty
/// sequence. Per-entry server errors are recorded in place and bundled into
/// an aggregate, mirroring [`Batch::resolve_all`].
pub(crate) fn resolve_exec_reply(
    reply: Reply,
    shapes: Vec<Option<Converter>>,
    convert: bool,
) -> Result<Vec<Value>> {
    let items = match reply {
        Reply::Nil => return Ok(Vec::new()),
        Reply::Error(msg) => return Err(Error::Server(msg)),
        Reply::Array(items) => items,
        other => {
            return Err(Error::Unexpected(format!(
                "expected transaction reply array, got {other:?}"
            )));
        }
    };
    if items.len() != shapes.len() {
        return Err(Error::Unexpected(format!(
            "transaction reply has {} entries, {} commands were queued",
            items.len(),
            shapes.len()
        )));
    }

    let mut partial: Vec<std::result::Result<Value, Error>> = Vec::new();
    let mut first_failed: Option<usize> = None;

    for (item, shape) in items.into_iter().zip(shapes) {
        let converter = match shape {
            Some(c) if convert => c,
            Some(_) => Converter::Identity,
            None => {
                // Acknowledgement-only slot: drop the value unless the
                // server reported an error for it.
                match item {
                    Reply::Error(msg) => {
                        if first_failed.is_none() {
                            first_failed = Some(partial.len());
                        }
                        partial.push(Err(Error::Server(msg)));
                    }
                    _ => {}
                }
                continue;
            }
        };
        let outcome = converter.apply(item);
        if outcome.is_err() && first_failed.is_none() {
            first_failed = Some(partial.len());
        }
        partial.push(outcome);
    }

    match first_failed {
        Some(index) => Err(Error::Batch(BatchFailure {
            partial,
            first_failed: index,
        })),
        None => Ok(partial.into_iter().filter_map(|r| r.ok()).collect()),
    }
}
