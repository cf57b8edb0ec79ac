//! Hybridclaw Pool - the container pool managing one sandboxed
//! turn-runner process per active session.
//!
//! A [`ContainerPool`] acquires-or-spawns a container per [`SessionId`],
//! delivers turns over the mailbox (first turn via stdin, subsequent turns
//! via `input.json`), and surfaces tool-progress events parsed line by
//! line from the container's stderr.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod pool;
mod progress;
mod spawn;

pub mod prelude;

pub use error::{PoolError, PoolResult};
pub use pool::{ContainerPool, ProgressCallback, MAX_CONCURRENT};
pub use progress::{parse_stderr_line, ToolProgressEvent};
pub use spawn::{BindMount, SpawnArgs, DEFAULT_IMAGE};
