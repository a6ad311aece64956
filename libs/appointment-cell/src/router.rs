// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // Staff operations sit behind the auth middleware; the availability and
    // booking surface takes no token.
    let protected_routes = Router::new()
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/appointments/{appointment_id}",
            patch(handlers::update_appointment_status),
        )
        .route(
            "/ortho-blocks",
            get(handlers::list_ortho_blocks).post(handlers::create_ortho_block),
        )
        .route("/ortho-blocks/{block_id}", delete(handlers::delete_ortho_block))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let public_routes = Router::new()
        .route("/public/availability", get(handlers::get_availability))
        .route("/public/ortho-dates", get(handlers::get_ortho_dates))
        .route("/public/book-ortho", post(handlers::book_ortho));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
}
