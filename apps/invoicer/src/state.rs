use std::sync::Arc;

use crate::config::Config;
use crate::repository::FileRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<FileRepository>,
    pub config: Config,
}
