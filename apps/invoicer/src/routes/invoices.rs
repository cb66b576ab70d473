use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::invoice::Invoice;
use crate::state::AppState;
use crate::store::remote::{DateBody, IdsBody, InvoicesBody};

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn ok() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// GET /api/invoices
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<InvoicesBody>, AppError> {
    let invoices = state.repo.list().await?;
    Ok(Json(InvoicesBody { invoices }))
}

/// POST /api/invoices
pub async fn handle_save(
    State(state): State<AppState>,
    payload: Result<Json<Invoice>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(invoice) = payload?;
    if invoice.id.trim().is_empty() {
        return Err(AppError::Validation("Invalid invoice: id required".to_string()));
    }
    info!("Saving invoice {}", invoice.id);
    state.repo.upsert(invoice).await?;
    Ok(ok())
}

/// DELETE /api/invoices/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    info!("Deleting invoice {id}");
    state.repo.delete(&id).await?;
    Ok(ok())
}

/// POST /api/invoices/bulk-delete
pub async fn handle_bulk_delete(
    State(state): State<AppState>,
    payload: Result<Json<IdsBody>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(body) = payload?;
    info!("Bulk deleting {} invoices", body.ids.len());
    state.repo.delete_many(&body.ids).await?;
    Ok(ok())
}

/// POST /api/invoices/import
/// Replaces the whole collection.
pub async fn handle_import(
    State(state): State<AppState>,
    payload: Result<Json<InvoicesBody>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(body) = payload?;
    info!("Importing {} invoices", body.invoices.len());
    state.repo.replace_all(&body.invoices).await?;
    Ok(ok())
}

/// GET /api/date
pub async fn handle_date(State(state): State<AppState>) -> Result<Json<DateBody>, AppError> {
    let date = state.repo.default_date().await?;
    Ok(Json(DateBody { date: Some(date) }))
}
