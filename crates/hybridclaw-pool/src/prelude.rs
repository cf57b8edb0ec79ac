//! Prelude module - commonly used types for convenient import.

pub use crate::{PoolError, PoolResult};
pub use crate::{ContainerPool, ProgressCallback, MAX_CONCURRENT};
pub use crate::{parse_stderr_line, ToolProgressEvent};
pub use crate::{BindMount, SpawnArgs, DEFAULT_IMAGE};
