/// Redis integration
///
/// Redis holds the server-side session records (see
/// [`crate::auth::session::RedisSessionStore`]).

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
