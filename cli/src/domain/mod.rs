//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod descriptors;
pub mod error;
pub mod preflight;
pub mod secrets;

pub use config::{DeployConfig, EnvOverrides};
pub use error::{DeployError, ErrorKind};
pub use preflight::{CheckName, PreflightReport, Role};
pub use secrets::Secrets;
