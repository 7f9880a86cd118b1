//! CLI command implementations.
//!
//! Each subcommand has its own module with its handler.
//!
//! # Command Modules
//!
//! - [`status`] - Measure current cache usage
//! - [`clean`] - Run one cleaning pass
//! - [`wipe`] - Delete every recognized file

pub mod clean;
pub mod status;
pub mod wipe;
