//! Deferred results for commands issued inside a batch.

use std::time::Duration;

use crate::connection::PendingReply;
use crate::convert::Converter;
use crate::error::{Error, RawError, Result};
use crate::reply::Reply;
use crate::value::Value;

/// A not-yet-resolved reply plus the converter chosen at issue time.
///
/// A deferred with no converter is an acknowledgement-only entry: its reply
/// is still read on resolution but batch output drops its value.
#[derive(Debug)]
pub struct Deferred<P> {
    pending: P,
    converter: Option<Converter>,
}

impl<P: PendingReply> Deferred<P> {
    pub fn new(pending: P, converter: Option<Converter>) -> Self {
        Self { pending, converter }
    }

    /// Converter recorded at issue time, if any.
    pub fn converter(&self) -> Option<Converter> {
        self.converter
    }

    /// True for acknowledgement-only entries.
    pub fn is_ack(&self) -> bool {
        self.converter.is_none()
    }

    /// Discard the pending handle, keeping only the converter. Used when a
    /// transaction's replies will arrive positionally through EXEC instead
    /// of through the per-command handles.
    pub fn into_converter(self) -> Option<Converter> {
        self.converter
    }

    /// Block until the reply is available, translate any native error, and
    /// apply the converter (absence means structural passthrough).
    pub async fn resolve(self) -> Result<Value> {
        self.resolve_with(true, None).await
    }

    /// Resolution with batch-level knobs: `convert` disabled forces the
    /// structural passthrough, `deadline` bounds the wait.
    pub(crate) async fn resolve_with(
        self,
        convert: bool,
        deadline: Option<Duration>,
    ) -> Result<Value> {
        let reply = resolve_pending(self.pending, deadline).await?;
        let converter = match self.converter {
            Some(c) if convert => c,
            _ => Converter::Identity,
        };
        converter.apply(reply)
    }
}

/// Await a pending reply, bounded by `deadline` when one is configured.
pub(crate) async fn resolve_pending<P: PendingReply>(
    pending: P,
    deadline: Option<Duration>,
) -> Result<Reply> {
    let raw = match deadline {
        Some(limit) => match tokio::time::timeout(limit, pending.resolve()).await {
            Ok(resolved) => resolved,
            Err(_) => Err(RawError::TimedOut),
        },
        None => pending.resolve().await,
    };
    raw.map_err(Error::from)
}
