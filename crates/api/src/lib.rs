pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{delete, get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let task_routes = Router::new()
        .route("/", post(routes::task::create))
        .route("/{task_id}", get(routes::task::get))
        .route("/{task_id}/assign", post(routes::task::assign));

    let thread_routes = Router::new()
        .route("/", get(routes::thread::list))
        .route("/", post(routes::thread::create))
        .route("/{thread_id}", get(routes::thread::get))
        .route("/{thread_id}/message", get(routes::message::list))
        .route("/{thread_id}/message", post(routes::message::create))
        .route(
            "/{thread_id}/message/{message_id}",
            delete(routes::message::delete),
        )
        .route("/{thread_id}/read", post(routes::message::mark_read));

    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route(
            "/{notification_id}/read",
            post(routes::notification::mark_read),
        )
        .route("/read-all", post(routes::notification::mark_all_read));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/task", task_routes)
        .nest("/thread", thread_routes)
        .nest("/notification", notification_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
