//! Subcommand implementations, one module per top-level command.

pub(crate) mod audit;
pub(crate) mod schedule;
