//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, path, show)
//! - [`inspect`] - Build a dynamic atlas from shards and report what it loaded
//! - [`query`] - List features from spatial queries
//! - [`shards`] - Show the shard covering a location
//! - [`slice`] - Cut a raw atlas into shard files

pub mod common;
pub mod config;
pub mod inspect;
pub mod query;
pub mod shards;
pub mod slice;
