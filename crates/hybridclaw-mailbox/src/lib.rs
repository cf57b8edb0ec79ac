//! Hybridclaw Mailbox - filesystem-based IPC between the host process and a
//! sandboxed container.
//!
//! Two files per session inside a bind-mounted directory: `input.json`
//! (host → container) and `output.json` (container → host). The very first
//! turn for a freshly spawned container is instead delivered over its
//! private stdin line, so the model API key never touches disk.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod container;
mod error;
mod host;
mod messages;

pub mod prelude;

pub use container::{ContainerMailbox, CONTAINER_POLL_INTERVAL};
pub use error::{MailboxError, MailboxResult};
pub use host::{HostMailbox, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_REPLY_BYTES, HOST_POLL_INTERVAL};
pub use messages::{
    SanitizedTask, SideEffects, ToolExecution, TurnRequest, TurnResponse, TurnStatus, WireMessage,
};
