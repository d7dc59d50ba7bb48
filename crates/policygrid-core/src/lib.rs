//! policygrid-core — shared types for PolicyGrid.
//!
//! Holds the autoscaling policy document model, the policy validator,
//! and the `policyd.toml` configuration parser.

pub mod config;
pub mod types;
pub mod validate;

pub use config::{ConfigError, PolicydConfig};
pub use types::*;
pub use validate::{validate, ValidationError};
