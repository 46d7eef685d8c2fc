//! # Member Portal Shared Library
//!
//! Types, persistence and authentication shared by the portal API server and
//! the client crate.
//!
//! ## Module Organization
//!
//! - `models`: entity records and role/status enums
//! - `auth`: password hashing, sessions, middleware and authorization checks
//! - `storage`: the `Storage` data-access contract and its implementations
//! - `db`: PostgreSQL pool and migrations
//! - `redis`: Redis connection handle for the session store

pub mod auth;
pub mod db;
pub mod models;
pub mod redis;
pub mod storage;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
