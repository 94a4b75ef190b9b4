//! # Sentinel Common Library
//!
//! Shared code for the Sentinel personal-safety service:
//! - Entity models and request payload validation
//! - The `Storage` repository trait with in-memory and SQLite backends
//! - Database bootstrap and schema migrations
//! - Configuration loading and root folder resolution
//! - Sample data seeding

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod storage;
pub mod validation;

pub use error::{Error, FieldError, Result};
pub use storage::{MemStorage, SqliteStorage, Storage};
