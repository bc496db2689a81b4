//! `buildgate-core` — configuration loading and shared primitives.

pub mod config;
pub mod error;

pub use error::{BuildgateError, Result};
