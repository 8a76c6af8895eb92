//! Execution mode controller: the single dispatch point over one connection.
//!
//! A [`Session`] tracks which of direct, queued (MULTI/EXEC) and pipelined
//! execution the connection is in and routes every issued command down the
//! matching path. Direct commands convert and return immediately; batched
//! commands register a [`Deferred`] and return nothing until the batch
//! completes. The compound queued-and-pipelined state nests the whole
//! transaction as one entry of the pipeline's batch.

use std::time::Duration;

use crate::batch::{Batch, resolve_exec_reply};
use crate::cmd::Command;
use crate::connection::RawConnection;
use crate::convert::Converter;
use crate::deferred::{Deferred, resolve_pending};
use crate::error::{Error, ErrorKind, Result};
use crate::reply::Reply;
use crate::value::Value;

/// Execution mode of a session. Queued and pipelined are not exclusive:
/// opening a transaction inside a pipeline (or a pipeline inside a
/// transaction) enters the compound state, where commands route through the
/// transaction's collector and the transaction itself resolves as one
/// pipeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Direct,
    Queued,
    Pipelined,
    PipelinedQueued,
}

impl Mode {
    /// Commands are being collected inside a MULTI block.
    pub fn is_queueing(self) -> bool {
        matches!(self, Mode::Queued | Mode::PipelinedQueued)
    }

    /// Replies are being collected for resolution at pipeline close.
    pub fn is_pipelined(self) -> bool {
        matches!(self, Mode::Pipelined | Mode::PipelinedQueued)
    }

    fn with_queued(self) -> Mode {
        if self.is_pipelined() {
            Mode::PipelinedQueued
        } else {
            Mode::Queued
        }
    }

    fn without_queued(self) -> Mode {
        if self.is_pipelined() {
            Mode::Pipelined
        } else {
            Mode::Direct
        }
    }

    fn with_pipelined(self) -> Mode {
        if self.is_queueing() {
            Mode::PipelinedQueued
        } else {
            Mode::Pipelined
        }
    }

    fn without_pipelined(self) -> Mode {
        if self.is_queueing() {
            Mode::Queued
        } else {
            Mode::Direct
        }
    }
}

/// Session tuning knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Apply per-command converters to batch results. When disabled, batch
    /// entries come back as structural passthrough values.
    pub convert_results: bool,
    /// Upper bound on waiting for any single deferred reply.
    pub resolve_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            convert_results: true,
            resolve_timeout: None,
        }
    }
}

impl SessionConfig {
    /// Toggle converter application on batch results.
    pub fn convert_results(mut self, convert: bool) -> Self {
        self.convert_results = convert;
        self
    }

    /// Bound the wait for each deferred reply.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }
}

/// Execution engine over one exclusively-owned connection.
pub struct Session<C: RawConnection> {
    conn: C,
    mode: Mode,
    /// Collector for the open transaction, if any.
    tx: Batch<C::Pending>,
    /// Collector for the open pipeline, if any.
    pipeline: Batch<C::Pending>,
    broken: bool,
    config: SessionConfig,
}

impl<C: RawConnection> Session<C> {
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, SessionConfig::default())
    }

    pub fn with_config(conn: C, config: SessionConfig) -> Self {
        Self {
            conn,
            mode: Mode::Direct,
            tx: Batch::new(),
            pipeline: Batch::new(),
            broken: false,
            config,
        }
    }

    /// Current execution mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True while inside a MULTI block.
    pub fn is_queueing(&self) -> bool {
        self.mode.is_queueing()
    }

    /// True while a pipeline is open.
    pub fn is_pipelined(&self) -> bool {
        self.mode.is_pipelined()
    }

    /// True once a transport failure has been observed. A pooling
    /// collaborator must discard the connection instead of reusing it.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// The underlying native connection.
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Mutable access to the underlying native connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Give the connection back, consuming the session.
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Issue one command.
    ///
    /// In direct mode the converted value comes back immediately. In queued
    /// or pipelined mode the command's deferred result joins the active
    /// batch and `None` is returned; the value arrives at batch completion.
    pub async fn issue(
        &mut self,
        cmd: Command,
        converter: Option<Converter>,
    ) -> Result<Option<Value>> {
        if self.mode == Mode::Direct {
            let reply = match self.conn.command(&cmd).await {
                Ok(reply) => reply,
                Err(raw) => return Err(self.fail(Error::from(raw))),
            };
            if let Reply::Error(msg) = reply {
                return Err(Error::Server(msg));
            }
            // convert_results only governs batch resolution; direct replies
            // are always converted.
            let converter = converter.unwrap_or(Converter::Identity);
            return converter.apply(reply).map(Some);
        }

        let pending = match self.conn.enqueue(&cmd).await {
            Ok(pending) => pending,
            Err(raw) => return Err(self.fail(Error::from(raw))),
        };
        let deferred = Deferred::new(pending, converter);
        if self.mode.is_queueing() {
            self.tx.push(deferred);
        } else {
            self.pipeline.push(deferred);
        }
        Ok(None)
    }

    /// Enter queued mode (MULTI). Repeated calls are no-ops: the open
    /// transaction keeps collecting, no second batch is created.
    pub async fn begin_transaction(&mut self) -> Result<()> {
        if self.mode.is_queueing() {
            return Ok(());
        }
        if let Err(raw) = self.conn.begin().await {
            return Err(self.fail(Error::from(raw)));
        }
        self.tx = Batch::new();
        self.mode = self.mode.with_queued();
        tracing::debug!(mode = ?self.mode, "transaction opened");
        Ok(())
    }

    /// Abandon the open transaction without resolving anything queued.
    pub async fn discard_transaction(&mut self) -> Result<()> {
        if !self.mode.is_queueing() {
            return Err(Error::NoTransaction);
        }
        let result = self.conn.abort().await;
        self.tx = Batch::new();
        self.mode = self.mode.without_queued();
        tracing::debug!(mode = ?self.mode, "transaction discarded");
        match result {
            Ok(()) => Ok(()),
            Err(raw) => Err(self.fail(Error::from(raw))),
        }
    }

    /// Commit the open transaction (EXEC).
    ///
    /// Outside a pipeline the queued commands' results come back now, in
    /// issue order, acknowledgement-only entries dropped; a per-command
    /// server failure surfaces as an aggregate carrying the partial results.
    /// Inside a pipeline the whole transaction instead becomes one deferred
    /// entry of the pipeline and `None` is returned; its value — the
    /// transaction's own ordered sequence, not flattened — arrives at
    /// pipeline close.
    ///
    /// The transaction collector is cleared in every outcome, so a fresh
    /// batch can start immediately.
    pub async fn commit_transaction(&mut self) -> Result<Option<Vec<Value>>> {
        if !self.mode.is_queueing() {
            return Err(Error::NoTransaction);
        }
        let shapes = std::mem::take(&mut self.tx).into_shapes();
        self.mode = self.mode.without_queued();

        let pending = match self.conn.commit().await {
            Ok(pending) => pending,
            Err(raw) => return Err(self.fail(Error::from(raw))),
        };
        tracing::debug!(queued = shapes.len(), pipelined = self.mode.is_pipelined(), "transaction committed");

        if self.mode.is_pipelined() {
            self.pipeline.push_transaction(pending, shapes);
            return Ok(None);
        }

        let reply = match resolve_pending(pending, self.config.resolve_timeout).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(e)),
        };
        resolve_exec_reply(reply, shapes, self.config.convert_results).map(Some)
    }

    /// Enter pipelined mode. A no-op when a pipeline is already open.
    pub async fn open_pipeline(&mut self) -> Result<()> {
        if self.mode.is_pipelined() {
            return Ok(());
        }
        if let Err(raw) = self.conn.open_batch().await {
            return Err(self.fail(Error::from(raw)));
        }
        self.pipeline = Batch::new();
        self.mode = self.mode.with_pipelined();
        tracing::debug!(mode = ?self.mode, "pipeline opened");
        Ok(())
    }

    /// Flush the pipeline and resolve every collected entry in issue order.
    ///
    /// Closing without an open pipeline yields an empty sequence. The
    /// pipeline collector is cleared in every outcome. A transaction opened
    /// after the pipeline and not yet committed stays open: the session
    /// drops back to queued mode rather than direct.
    pub async fn close_pipeline(&mut self) -> Result<Vec<Value>> {
        if !self.mode.is_pipelined() {
            return Ok(Vec::new());
        }
        let batch = std::mem::take(&mut self.pipeline);
        self.mode = self.mode.without_pipelined();
        tracing::debug!(entries = batch.len(), mode = ?self.mode, "pipeline closing");

        if let Err(raw) = self.conn.sync().await {
            return Err(self.fail(Error::from(raw)));
        }
        match batch
            .resolve_all(self.config.convert_results, self.config.resolve_timeout)
            .await
        {
            Ok(values) => Ok(values),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Record a broken transport before handing the error up.
    fn fail(&mut self, err: Error) -> Error {
        if err.kind() == ErrorKind::Connection {
            self.broken = true;
            tracing::debug!("connection marked broken");
        }
        err
    }
}
