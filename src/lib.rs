//! Transaction and pipeline execution core for Redis clients.
//!
//! `redbatch` is the engine a Redis client abstraction sits on: it multiplexes
//! direct, queued (MULTI/EXEC) and pipelined execution over one logical
//! connection, defers results issued inside a batch, and resolves them in
//! issue order once the batch completes. It owns no wire protocol — an
//! underlying client library plugs in through the [`RawConnection`] adapter
//! trait and hands back [`Reply`] values, which the core converts into the
//! driver-agnostic [`Value`] shapes.
//!
//! # Example
//! ```ignore
//! use redbatch::{Command, Converter, Session};
//!
//! let mut session = Session::new(conn);
//!
//! // Direct mode: the value comes back immediately.
//! let hits = session
//!     .issue(Command::new("INCR").arg("hits"), Some(Converter::Int))
//!     .await?;
//!
//! // Pipelined mode: values come back together on close.
//! session.open_pipeline().await?;
//! session.issue(Command::new("GET").arg("a"), Some(Converter::Bytes)).await?;
//! session.issue(Command::new("GET").arg("b"), Some(Converter::Bytes)).await?;
//! let values = session.close_pipeline().await?;
//! ```

pub mod batch;
pub mod cmd;
pub mod connection;
pub mod convert;
pub mod deferred;
pub mod error;
pub mod reply;
pub mod session;
pub mod value;

pub use batch::Batch;
pub use cmd::Command;
pub use connection::{PendingReply, RawConnection};
pub use convert::Converter;
pub use deferred::Deferred;
pub use error::{BatchFailure, Error, ErrorKind, RawError, Result};
pub use reply::Reply;
pub use session::{Mode, Session, SessionConfig};
pub use value::{ScoredValue, Value};

pub mod prelude {
    pub use crate::{
        Batch, Command, Converter, Deferred, Error, ErrorKind, Mode, PendingReply, RawConnection,
        RawError, Reply, Result, ScoredValue, Session, SessionConfig, Value,
    };
}
