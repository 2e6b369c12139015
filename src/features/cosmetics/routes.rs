use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::features::cosmetics::handlers;
use crate::features::cosmetics::services::CosmeticService;

/// Create routes for the cosmetics feature
///
/// The `{id}`-less variants exist so a missing id is handled by the feature
/// (not-found page, or a redirect for delete) instead of the router's 404.
pub fn routes(service: Arc<CosmeticService>) -> Router {
    Router::new()
        .route("/cosmetics", get(handlers::index))
        .route("/cosmetics/details", get(handlers::details))
        .route("/cosmetics/details/{id}", get(handlers::details))
        .route(
            "/cosmetics/create",
            get(handlers::create_form)
                .post(handlers::create)
                // The create reader caps the image and text parts itself
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/cosmetics/edit",
            get(handlers::edit_form).post(handlers::edit),
        )
        .route(
            "/cosmetics/edit/{id}",
            get(handlers::edit_form).post(handlers::edit),
        )
        .route(
            "/cosmetics/delete",
            get(handlers::delete_form).post(handlers::delete_confirmed),
        )
        .route(
            "/cosmetics/delete/{id}",
            get(handlers::delete_form).post(handlers::delete_confirmed),
        )
        .with_state(service)
}
