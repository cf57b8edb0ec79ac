//! Hybridclaw Test - Shared test utilities for the Hybridclaw runtime.
//!
//! This crate provides mock implementations and fixture builders that can
//! be used across multiple Hybridclaw crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! hybridclaw-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use hybridclaw_test::{temp_home, ScriptedLlmProvider};
//!
//!     #[tokio::test]
//!     async fn replies_with_the_scripted_text() {
//!         let (_dir, home) = temp_home();
//!         let provider = ScriptedLlmProvider::new().then_text("hi there");
//!         let reply = provider.complete_simple("hello").await.unwrap();
//!         assert_eq!(reply, "hi there");
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mock_llm;

pub use fixtures::*;
pub use mock_llm::*;
