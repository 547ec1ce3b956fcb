use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::mail::MailClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::bookmark_service::BookmarkService;
use crate::services::bookmark_service_impl::SeaOrmBookmarkService;
use crate::services::favicon::FaviconFetcher;
use crate::services::session_service::SessionService;
use crate::services::session_service_impl::SeaOrmSessionService;
use crate::services::user_service::UserService;
use crate::services::user_service_impl::SeaOrmUserService;

pub mod auth;
mod bookmarks;
mod error;
mod types;
mod users;
mod validation;

pub use error::{ApiError, codes};
pub use types::*;

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub users: Arc<dyn UserService>,
    pub sessions: Arc<dyn SessionService>,
    pub bookmarks: Arc<dyn BookmarkService>,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::new(&config.database.url).await?;

    let mail = MailClient::new(config.mail.api_key.clone(), config.mail.from.clone())?;
    let favicon = FaviconFetcher::new()?;

    let users = Arc::new(SeaOrmUserService::new(
        store.clone(),
        mail,
        config.general.app_url.clone(),
    ));
    let sessions = Arc::new(SeaOrmSessionService::new(store.clone()));
    let bookmarks = Arc::new(SeaOrmBookmarkService::new(store.clone(), favicon));

    Ok(Arc::new(AppState {
        config,
        store,
        users,
        sessions,
        bookmarks,
    }))
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let public_routes = Router::new()
        .route("/user/register", post(users::register))
        .route("/user/verify-email", post(users::verify_email))
        .route("/user/verify-email/request", post(users::request_verification))
        .route("/user/login", post(users::login))
        .route(
            "/user/password-reset/request",
            post(users::request_password_reset),
        )
        .route("/user/password-reset/reset", post(users::reset_password));

    let protected_routes = Router::new()
        .route("/user/logout", delete(users::logout))
        .route("/user/change-pass", post(users::change_password))
        .route("/user/verification-status", get(users::verification_status))
        .route("/bookmarks/create", post(bookmarks::create_bookmark))
        .route("/bookmarks/get", get(bookmarks::get_bookmarks))
        .route("/bookmarks/delete", delete(bookmarks::delete_bookmark))
        .route("/bookmarks/update", post(bookmarks::update_bookmark))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(public_routes)
        .nest("/api", protected_routes)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
