//! Shared domain types and error definitions used across all reshare crates.

pub mod error;
pub mod types;

pub use error::{Error, FromMessage, Result};
