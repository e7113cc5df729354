//! Shared plumbing for the mention bot crates.
//!
//! Keeps the tracing setup in one place so the binary and integration tests
//! emit into the same rolling file sink.
//!
//! ```rust
//! use mention_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "mentionbot");
//! ```
pub mod observability;
