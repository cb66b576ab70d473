//! Compiled-in placement of every field on the invoice template.
//!
//! Coordinates are PDF user space (origin bottom-left) for a US letter
//! template. Nothing is rescaled if a template with another page size is
//! loaded; use the calibration grid to derive new values instead.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// The wrapped description column. `y` is the baseline of the first line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub line_height: f32,
    /// Lines starting below `y - max_height` are dropped. `None` means unbounded.
    pub max_height: Option<f32>,
}

impl TextBox {
    /// Lowest baseline a line may still be drawn at.
    pub fn floor(&self) -> f32 {
        self.y - self.max_height.unwrap_or(UNBOUNDED_HEIGHT)
    }
}

const UNBOUNDED_HEIGHT: f32 = 9999.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGeometry {
    pub invoice_number: Anchor,
    pub date: Anchor,
    pub client_name: Anchor,
    /// Where the address starts when no "Attn:" line precedes it.
    pub client_address: Anchor,
    pub summary: Anchor,
    pub description: TextBox,
    /// Size for the number, name, summary and description.
    pub font_size: f32,
    /// Size for the client detail lines under the name.
    pub small_size: f32,
}

impl LayoutGeometry {
    /// Drop from the client name to the first detail line.
    pub fn name_gap(&self) -> f32 {
        self.font_size + 4.0
    }

    /// Pitch between successive client detail lines.
    pub fn detail_pitch(&self) -> f32 {
        self.small_size + 2.0
    }
}

/// Placement for the bundled invoice template.
pub fn default_geometry() -> LayoutGeometry {
    LayoutGeometry {
        invoice_number: Anchor { x: 460.0, y: 730.0 },
        date: Anchor { x: 460.0, y: 710.0 },
        client_name: Anchor { x: 70.0, y: 670.0 },
        client_address: Anchor { x: 70.0, y: 650.0 },
        summary: Anchor { x: 70.0, y: 610.0 },
        description: TextBox {
            x: 40.0,
            y: 480.0,
            width: 520.0,
            line_height: 16.0,
            max_height: Some(160.0),
        },
        font_size: 12.0,
        small_size: 10.0,
    }
}
