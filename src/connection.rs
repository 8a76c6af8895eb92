//! Adapter boundary to the underlying client library.
//!
//! The core never reaches into a concrete client's internals; each library
//! implements this capability set natively. [`RawConnection::command`] is the
//! direct round trip, [`RawConnection::enqueue`] the queued/pipelined form
//! whose reply arrives later through a [`PendingReply`] handle.

use crate::cmd::Command;
use crate::error::RawError;
use crate::reply::Reply;

/// Handle to a reply that has not been read yet.
///
/// Consumed by `resolve`; the underlying native handle supports a single
/// consumption, which the move enforces at the type level.
#[allow(async_fn_in_trait)]
pub trait PendingReply {
    /// Block until the reply is available and return it.
    async fn resolve(self) -> Result<Reply, RawError>;
}

/// Capability set an underlying client library exposes to the core.
///
/// The connection is exclusively owned by one logical caller; pooling and
/// thread-safety live in a collaborator that hands out one connection per
/// borrower.
#[allow(async_fn_in_trait)]
pub trait RawConnection {
    type Pending: PendingReply;

    /// Execute one command synchronously and return its reply.
    async fn command(&mut self, cmd: &Command) -> Result<Reply, RawError>;

    /// Send one command in batched form; the reply is deferred.
    async fn enqueue(&mut self, cmd: &Command) -> Result<Self::Pending, RawError>;

    /// Open a transaction block (MULTI).
    async fn begin(&mut self) -> Result<(), RawError>;

    /// Abandon the open transaction block (DISCARD).
    async fn abort(&mut self) -> Result<(), RawError>;

    /// Commit the open transaction block (EXEC). The pending reply resolves
    /// to the array of queued-command replies in issue order.
    async fn commit(&mut self) -> Result<Self::Pending, RawError>;

    /// Start buffering commands instead of waiting for individual replies.
    async fn open_batch(&mut self) -> Result<(), RawError>;

    /// Flush buffered commands and make their pending replies resolvable.
    async fn sync(&mut self) -> Result<(), RawError>;
}
