//! Command invocations: an opcode plus raw byte arguments.
//!
//! A [`Command`] is consumed exactly once by [`Session::issue`]
//! (crate::session::Session::issue): either executed synchronously in direct
//! mode or handed to the underlying client's batched form. Argument bytes are
//! never interpreted here; serialization of domain values is a higher layer's
//! concern.

use bytes::Bytes;

/// One issued Redis operation: command name and raw arguments.
///
/// # Example
/// ```
/// use redbatch::Command;
///
/// let cmd = Command::new("LPUSH").arg("queue").arg("job-1");
/// assert_eq!(cmd.name(), "LPUSH");
/// assert_eq!(cmd.args().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    args: Vec<Bytes>,
}

impl Command {
    /// Create a command with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a raw argument.
    pub fn arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append an argument from a borrowed byte slice.
    pub fn arg_slice(mut self, arg: &[u8]) -> Self {
        self.args.push(Bytes::copy_from_slice(arg));
        self
    }

    /// Append an integer argument in its decimal text form.
    pub fn arg_int(mut self, arg: i64) -> Self {
        self.args.push(Bytes::from(arg.to_string()));
        self
    }

    /// Command name (opcode).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw arguments in order.
    pub fn args(&self) -> &[Bytes] {
        &self.args
    }
}
