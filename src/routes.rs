// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{auth, feed, likes, pages, posts},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// Largest accepted composer body, image included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Assembles the main application router.
///
/// * `/api/*`: JSON API. Protected routes answer 401 without a session.
/// * `/storage/v1/object/public/{bucket}/{path}`: public object reads.
/// * everything else: static pages, with `/`, `/home` and `/dashboard` behind the page guard.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true);

    let require_session = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let optional_session = middleware::from_fn_with_state(state.clone(), optional_auth_middleware);

    let auth_routes = Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/login", post(auth::sign_in))
        .route("/oauth/{provider}", get(auth::federated_sign_in))
        .merge(
            Router::new()
                .route("/session", get(auth::current_session))
                .layer(optional_session.clone()),
        )
        .merge(
            Router::new()
                .route("/logout", post(auth::sign_out))
                .route("/user", get(auth::current_user))
                .layer(require_session.clone()),
        );

    let post_routes = Router::new()
        .merge(
            Router::new()
                .route("/", get(feed::public_feed))
                .layer(optional_session),
        )
        // Protected post routes
        .merge(
            Router::new()
                .route("/", post(posts::create_post))
                .route("/{id}/like", post(likes::toggle_like))
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
                .layer(require_session.clone()),
        );

    let profile_routes = Router::new()
        .route("/posts", get(feed::own_posts))
        .layer(require_session);

    let pages = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(state.clone(), pages::page_guard))
        .service(ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/profile", profile_routes)
        .nest_service(
            "/storage/v1/object/public",
            ServeDir::new(&state.config.storage_root),
        )
        .fallback_service(pages)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
