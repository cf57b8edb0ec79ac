//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hybridclaw_audit::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuditError, AuditResult};

// Wire record types
pub use crate::{MetadataGenesis, VerifyReport, WireRecord, PROTOCOL_VERSION, WIRE_VERSION};

// Log trait and implementation
pub use crate::{AuditLog, FileAuditLog};

// Redaction and canonicalization
pub use crate::{canonicalize, redact_value};
