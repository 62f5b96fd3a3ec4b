pub mod assets;
pub mod home;
pub mod posts;
pub mod profile;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{handlers, require_session};
use crate::state::AppState;

/// The complete application: public pages, gated mutations, uploads and assets.
pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .merge(profile::router())
        .merge(posts::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(home::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/logout", get(handlers::logout))
        .route("/profile/upload", get(profile::upload_page))
        .route("/assets/{*path}", get(assets::serve))
        .merge(gated)
        .nest_service("/uploads", ServeDir::new(state.config.uploads_path()))
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
