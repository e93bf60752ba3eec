//! Utility modules for common functionality.
//!
//! - error: Error context shared by all error types
//! - logging: Tracing subscriber setup for applications

mod error;
pub mod logging;

pub use error::*;
