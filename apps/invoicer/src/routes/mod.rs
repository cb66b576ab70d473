pub mod health;
pub mod invoices;
pub mod render;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Invoice collection
        .route(
            "/api/invoices",
            get(invoices::handle_list).post(invoices::handle_save),
        )
        .route("/api/invoices/:id", delete(invoices::handle_delete))
        .route(
            "/api/invoices/bulk-delete",
            post(invoices::handle_bulk_delete),
        )
        .route("/api/invoices/import", post(invoices::handle_import))
        .route("/api/date", get(invoices::handle_date))
        // Rendering
        .route("/api/invoice", post(render::handle_render))
        .route("/api/debug-grid", get(render::handle_debug_grid))
        .with_state(state)
}
