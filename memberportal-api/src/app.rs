/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use memberportal_api::{app::{build_router, AppState}, config::Config};
/// use memberportal_shared::auth::session::{MemorySessionStore, SessionManager};
/// use memberportal_shared::storage::MemoryStorage;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let sessions = SessionManager::new(
///     Arc::new(MemorySessionStore::new()),
///     config.session.ttl_seconds,
/// );
/// let state = AppState::new(Arc::new(MemoryStorage::new()), sessions, config);
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use memberportal_shared::auth::middleware::{
    require_role_middleware, session_auth_middleware, CookieSettings, SessionAuth,
};
use memberportal_shared::auth::session::SessionManager;
use memberportal_shared::models::Role;
use memberportal_shared::storage::SharedStorage;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; every field is a
/// cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub storage: SharedStorage,

    /// Session issuing and resolution plus cookie settings
    pub auth: SessionAuth,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(storage: SharedStorage, sessions: SessionManager, config: Config) -> Self {
        let auth = SessionAuth {
            sessions,
            storage: storage.clone(),
            cookie: CookieSettings {
                name: config.session.cookie_name.clone(),
                secure: config.api.production,
            },
        };

        Self {
            storage,
            auth,
            config: Arc::new(config),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.auth.sessions
    }

    pub fn cookies(&self) -> &CookieSettings {
        &self.auth.cookie
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                       public
/// └── /api
///     ├── POST /login                    public
///     ├── POST /register                 public, only with ALLOW_REGISTRATION
///     ├── POST /logout                   authenticated
///     ├── GET|PATCH /user                authenticated (own profile)
///     ├── GET|POST /users                admin
///     ├── PATCH /users/:id               admin
///     ├── GET|POST /tasks                authenticated (own tasks)
///     ├── PATCH /tasks/:id               owner or admin
///     ├── GET /warnings, GET /bans       authenticated (own records)
///     ├── POST /warnings, POST /bans     admin
///     ├── POST /{tasks,warnings,bans}/:id/approve   moderator+
///     ├── GET|POST /tickets              authenticated (own tickets)
///     └── /admin
///         ├── GET /tasks, /warnings, /bans          admin
///         └── GET /tickets, PATCH /tickets/:id      moderator+
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost last):
/// 1. Role gate (admin and moderator routes, per method)
/// 2. Session authentication (protected routes only, via `route_layer`)
/// 3. Logging (tower-http TraceLayer)
/// 4. CORS (tower-http CorsLayer)
/// 5. Security headers
///
/// Unmatched paths fall through to an empty 404 without touching the
/// session store.
pub fn build_router(state: AppState) -> Router {
    let mut public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/login", post(routes::auth::login));

    if state.config.api.allow_registration {
        public_routes = public_routes.route("/api/register", post(routes::auth::register));
    }

    // Role gates run before any extractor, so under-privileged callers get
    // the empty 401 whatever body they send
    let admin = || middleware::from_fn_with_state(Role::Admin, require_role_middleware);
    let moderator = || middleware::from_fn_with_state(Role::Moderator, require_role_middleware);

    let admin_routes = Router::new()
        .route("/tasks", get(routes::tasks::list_all_tasks).route_layer(admin()))
        .route(
            "/warnings",
            get(routes::warnings::list_all_warnings).route_layer(admin()),
        )
        .route("/bans", get(routes::bans::list_all_bans).route_layer(admin()))
        .route(
            "/tickets",
            get(routes::tickets::list_all_tickets).route_layer(moderator()),
        )
        .route(
            "/tickets/:id",
            patch(routes::tickets::update_ticket).route_layer(moderator()),
        );

    let protected_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route(
            "/user",
            get(routes::auth::current_user).patch(routes::auth::update_profile),
        )
        .route(
            "/users",
            get(routes::users::list_users)
                .post(routes::users::create_user)
                .route_layer(admin()),
        )
        .route(
            "/users/:id",
            patch(routes::users::update_user).route_layer(admin()),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/:id", patch(routes::tasks::update_task))
        .route(
            "/tasks/:id/approve",
            post(routes::tasks::approve_task).route_layer(moderator()),
        )
        .route(
            "/warnings",
            get(routes::warnings::list_warnings)
                .merge(post(routes::warnings::create_warning).route_layer(admin())),
        )
        .route(
            "/warnings/:id/approve",
            post(routes::warnings::approve_warning).route_layer(moderator()),
        )
        .route(
            "/bans",
            get(routes::bans::list_bans).merge(post(routes::bans::create_ban).route_layer(admin())),
        )
        .route(
            "/bans/:id/approve",
            post(routes::bans::approve_ban).route_layer(moderator()),
        )
        .route(
            "/tickets",
            get(routes::tickets::list_tickets).post(routes::tickets::create_ticket),
        )
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            session_auth_middleware,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .nest("/api", protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Cookies only cross origins with credentials allowed
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
