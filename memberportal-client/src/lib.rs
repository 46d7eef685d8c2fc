//! # Member Portal Client
//!
//! Typed access to the portal API for tools and front ends.
//!
//! ## Modules
//!
//! - `client`: [`PortalClient`], one cookie-carrying session against the API
//! - `cache`: [`cache::QueryCache`], responses keyed by resource tag and path
//! - `cached`: [`CachedPortal`], the client behind the cache with
//!   invalidation on every mutation
//! - `stats`: dashboard counters
//! - `error`: [`ClientError`]

pub mod cache;
pub mod cached;
pub mod client;
pub mod error;
pub mod stats;

pub use cached::CachedPortal;
pub use client::{
    AccountPatch, HealthStatus, NewAccount, NewTask, NewTicket, PortalClient, ProfilePatch,
    TicketPatch,
};
pub use error::ClientError;
pub use stats::DashboardStats;
