/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskmaster_api::{app::{build_router, AppState}, config::Config, notify};
/// use taskmaster_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
///
/// let notifier = notify::from_config(&config.api, &config.mail);
/// let app = build_router(AppState::new(pool, config, notifier));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    error,
    middleware::{auth::require_session, security::SecurityHeadersLayer},
    notify::InvitationNotifier,
    routes,
};

/// Shared application state
///
/// Cloned for each request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Delivers team invitations
    pub notifier: Arc<dyn InvitationNotifier>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, notifier: Arc<dyn InvitationNotifier>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            notifier,
        }
    }

    pub fn production(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/v1/
///     ├── /users        register, login (public); logout, me, profile
///     ├── /teams        create, list, get, members, invitations, accept
///     ├── /tasks        create, list, get, update, delete
///     ├── /comments     create, list by task, update, delete
///     └── /attachments  create, list by task, get, delete
/// ```
///
/// Everything under `/api/v1` except register and login passes the
/// authentication gate first.
pub fn build_router(state: AppState) -> Router {
    error::expose_internal_details(!state.production());

    let public_user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    let user_routes = Router::new()
        .route("/logout", post(routes::users::logout))
        .route("/me", get(routes::users::me))
        .route("/profile", put(routes::users::update_profile));

    let team_routes = Router::new()
        .route("/", post(routes::teams::create_team).get(routes::teams::list_teams))
        .route(
            "/invitations/:token/accept",
            post(routes::teams::accept_invitation),
        )
        .route("/:team_id", get(routes::teams::get_team))
        .route("/:team_id/members", get(routes::teams::list_members))
        .route(
            "/:team_id/invitations",
            post(routes::teams::invite_member).get(routes::teams::list_invitations),
        );

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task).get(routes::tasks::list_tasks))
        .route(
            "/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let comment_routes = Router::new()
        .route("/", post(routes::comments::create_comment))
        .route("/task/:task_id", get(routes::comments::list_task_comments))
        .route(
            "/:comment_id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        );

    let attachment_routes = Router::new()
        .route("/", post(routes::attachments::create_attachment))
        .route(
            "/task/:task_id",
            get(routes::attachments::list_task_attachments),
        )
        .route(
            "/:attachment_id",
            get(routes::attachments::get_attachment).delete(routes::attachments::delete_attachment),
        );

    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/teams", team_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes)
        .nest("/attachments", attachment_routes)
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let v1_routes = Router::new()
        .nest("/users", public_user_routes)
        .merge(protected);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.production()))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Credentials are required for the session cookie to be sent cross-origin
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
