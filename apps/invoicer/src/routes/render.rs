use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Local;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::layout::{debug_grid, default_geometry, fill_invoice, RenderOptions};
use crate::models::invoice::InvoiceData;
use crate::state::AppState;

/// Reads the first template candidate that exists and is readable.
async fn load_template(state: &AppState) -> Result<Vec<u8>, AppError> {
    for path in state.config.template_candidates() {
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Using template {}", path.display());
                return Ok(bytes);
            }
            Err(e) => debug!("Template candidate {} unavailable: {e}", path.display()),
        }
    }
    Err(AppError::TemplateNotFound)
}

fn pdf_response(bytes: Vec<u8>, disposition: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(bytes),
    )
        .into_response()
}

/// POST /api/invoice
/// Fills the template with the posted fields and returns the PDF as a download.
pub async fn handle_render(
    State(state): State<AppState>,
    payload: Result<Json<InvoiceData>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(data) = payload?;
    data.validate()?;
    let template = load_template(&state).await?;

    let file_name = data.file_name();
    let pdf = tokio::task::spawn_blocking(move || {
        fill_invoice(&template, &data, &default_geometry(), RenderOptions::default())
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    info!("Rendered {file_name} ({} bytes)", pdf.len());
    Ok(pdf_response(
        pdf,
        format!("attachment; filename=\"{file_name}\""),
    ))
}

/// GET /api/debug-grid
/// Placeholder fields over a labeled coordinate grid, for calibrating positions.
pub async fn handle_debug_grid(State(state): State<AppState>) -> Result<Response, AppError> {
    let template = load_template(&state).await?;
    let today = Local::now().format("%Y-%m-%d").to_string();

    let pdf = tokio::task::spawn_blocking(move || {
        debug_grid(&template, &default_geometry(), today)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    Ok(pdf_response(
        pdf,
        "inline; filename=\"debug-grid.pdf\"".to_string(),
    ))
}
