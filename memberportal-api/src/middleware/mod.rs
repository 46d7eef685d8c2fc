/// HTTP middleware for the API server
///
/// Session authentication lives in
/// [`memberportal_shared::auth::middleware`]; this module holds the
/// response-side layers.

pub mod security;
