//! # Member Portal API Server Library
//!
//! HTTP surface of the member portal: session login, account management,
//! member records (tasks, warnings, bans) with moderator approval, and
//! support tickets.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: First-admin creation at startup
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
