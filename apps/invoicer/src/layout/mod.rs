// Invoice Layout Engine
// Measures and wraps field text, places it at fixed template coordinates and
// serializes the filled page. Rendering is CPU-bound; callers on the async
// runtime run it inside tokio::task::spawn_blocking.

pub mod engine;
pub mod font_metrics;
pub mod geometry;
pub mod pdf;
pub mod wrap;

use thiserror::Error;

// Re-export the public API consumed by the routes.
pub use engine::{DrawablePage, RenderOptions};
pub use font_metrics::{get_metrics, FontFace, TextMetrics};
pub use geometry::{default_geometry, LayoutGeometry};
pub use pdf::{debug_grid, fill_invoice};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Template could not be loaded: {0}")]
    TemplateLoad(String),

    #[error("Filled document could not be written: {0}")]
    Serialize(String),
}
