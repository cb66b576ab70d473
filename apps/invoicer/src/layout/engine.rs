//! Places invoice fields onto a page.
//!
//! The engine only sees two capabilities: a `TextMetrics` for measuring and a
//! `DrawablePage` for output. It never reads or rewrites template content.

use tracing::debug;

use crate::layout::font_metrics::{FontFace, TextMetrics};
use crate::layout::geometry::LayoutGeometry;
use crate::layout::wrap::wrap_text;
use crate::models::invoice::InvoiceData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
}

/// Output surface for draw instructions.
pub trait DrawablePage {
    /// Page width and height in points.
    fn size(&self) -> (f32, f32);
    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);
    fn draw_line(&mut self, start: (f32, f32), end: (f32, f32), thickness: f32, color: Rgb);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Overlay the labeled calibration grid under the fields.
    pub draw_grid: bool,
}

pub const GRID_STEP: f32 = 50.0;
const GRID_LINE_COLOR: Rgb = Rgb(0.85, 0.85, 0.85);
const GRID_LABEL_COLOR: Rgb = Rgb(0.5, 0.5, 0.5);
const GRID_LINE_THICKNESS: f32 = 0.5;
const GRID_LABEL_SIZE: f32 = 6.0;

/// Draws every present field of `data` at its configured position.
pub fn render_invoice(
    page: &mut dyn DrawablePage,
    metrics: &dyn TextMetrics,
    geometry: &LayoutGeometry,
    data: &InvoiceData,
    options: RenderOptions,
) {
    if options.draw_grid {
        draw_calibration_grid(page);
    }

    let regular = TextStyle {
        face: FontFace::Regular,
        size: geometry.font_size,
        color: Rgb::BLACK,
    };
    let bold = TextStyle {
        face: FontFace::Bold,
        ..regular
    };
    let small = TextStyle {
        size: geometry.small_size,
        ..regular
    };

    // Invoice number and date
    let number = geometry.invoice_number;
    draw(page, &data.invoice_number, number.x, number.y, bold);
    if let Some(date) = data.date.as_deref() {
        draw(page, date, geometry.date.x, geometry.date.y, regular);
    }

    // Client block
    let x = geometry.client_name.x;
    draw(page, &data.client.name, x, geometry.client_name.y, bold);
    let mut y = geometry.client_name.y - geometry.name_gap();

    let contact = present(data.client.contact.as_deref());
    if let Some(contact) = contact {
        draw(page, &format!("Attn: {contact}"), x, y, small);
        y -= geometry.detail_pitch();
    }

    let address_lines: Vec<&str> = data
        .client
        .address
        .as_deref()
        .unwrap_or("")
        .lines()
        .filter(|line| !line.is_empty())
        .collect();
    // Without an Attn line the address drops to its own anchor.
    if contact.is_none() && !address_lines.is_empty() {
        y = geometry.client_address.y;
    }
    for line in &address_lines {
        draw(page, line, x, y, small);
        y -= geometry.detail_pitch();
    }

    if let Some(email) = present(data.client.email.as_deref()) {
        draw(page, email, x, y, small);
        y -= geometry.detail_pitch();
    }
    if let Some(phone) = present(data.client.phone.as_deref()) {
        draw(page, phone, x, y, small);
    }

    // Summary
    draw(page, &data.summary, geometry.summary.x, geometry.summary.y, regular);

    // Description column
    let column = geometry.description;
    let lines = wrap_text(metrics, &data.description, geometry.font_size, column.width);
    let mut desc_y = column.y;
    let mut drawn = 0usize;
    for line in &lines {
        if desc_y < column.floor() {
            break;
        }
        draw(page, line, column.x, desc_y, regular);
        desc_y -= column.line_height;
        drawn += 1;
    }

    debug!(
        "Rendered invoice {} ({} of {} description lines)",
        data.invoice_number,
        drawn,
        lines.len()
    );
}

/// Light grid every `GRID_STEP` points with each line labeled by its coordinate.
pub fn draw_calibration_grid(page: &mut dyn DrawablePage) {
    let (width, height) = page.size();
    let label = TextStyle {
        face: FontFace::Regular,
        size: GRID_LABEL_SIZE,
        color: GRID_LABEL_COLOR,
    };

    let mut x = 0.0_f32;
    while x <= width {
        page.draw_line((x, 0.0), (x, height), GRID_LINE_THICKNESS, GRID_LINE_COLOR);
        page.draw_text(&format!("{}", x as i64), x + 2.0, 4.0, label);
        x += GRID_STEP;
    }

    let mut y = 0.0_f32;
    while y <= height {
        page.draw_line((0.0, y), (width, y), GRID_LINE_THICKNESS, GRID_LINE_COLOR);
        page.draw_text(&format!("{}", y as i64), 2.0, y + 2.0, label);
        y += GRID_STEP;
    }
}

fn draw(page: &mut dyn DrawablePage, text: &str, x: f32, y: f32, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    page.draw_text(text, x, y, style);
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{get_metrics, FontFace};
    use crate::layout::geometry::default_geometry;
    use crate::models::invoice::ClientInfo;

    #[derive(Debug, Clone, PartialEq)]
    pub struct TextRun {
        pub text: String,
        pub x: f32,
        pub y: f32,
        pub style: TextStyle,
    }

    /// Page double that records what was drawn.
    pub struct RecordingPage {
        pub width: f32,
        pub height: f32,
        pub texts: Vec<TextRun>,
        pub lines: Vec<((f32, f32), (f32, f32))>,
    }

    impl RecordingPage {
        pub fn letter() -> Self {
            RecordingPage {
                width: 612.0,
                height: 792.0,
                texts: Vec::new(),
                lines: Vec::new(),
            }
        }

        pub fn find(&self, text: &str) -> Option<&TextRun> {
            self.texts.iter().find(|t| t.text == text)
        }
    }

    impl DrawablePage for RecordingPage {
        fn size(&self) -> (f32, f32) {
            (self.width, self.height)
        }

        fn draw_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
            self.texts.push(TextRun {
                text: text.to_string(),
                x,
                y,
                style,
            });
        }

        fn draw_line(&mut self, start: (f32, f32), end: (f32, f32), _thickness: f32, _color: Rgb) {
            self.lines.push((start, end));
        }
    }

    fn sample() -> InvoiceData {
        InvoiceData {
            invoice_number: "1001".to_string(),
            client: ClientInfo {
                name: "Acme Co".to_string(),
                ..ClientInfo::default()
            },
            summary: "Consulting".to_string(),
            description: "Line one\n\nLine two".to_string(),
            date: Some("2024-01-05".to_string()),
        }
    }

    fn render(data: &InvoiceData) -> RecordingPage {
        let mut page = RecordingPage::letter();
        render_invoice(
            &mut page,
            get_metrics(FontFace::Regular),
            &default_geometry(),
            data,
            RenderOptions::default(),
        );
        page
    }

    #[test]
    fn test_fixed_fields_land_on_anchors() {
        let page = render(&sample());

        let number = page.find("1001").unwrap();
        assert_eq!((number.x, number.y), (460.0, 730.0));
        assert_eq!(number.style.face, FontFace::Bold);

        let date = page.find("2024-01-05").unwrap();
        assert_eq!((date.x, date.y), (460.0, 710.0));
        assert_eq!(date.style.face, FontFace::Regular);

        let name = page.find("Acme Co").unwrap();
        assert_eq!((name.x, name.y), (70.0, 670.0));
        assert_eq!(name.style.face, FontFace::Bold);

        let summary = page.find("Consulting").unwrap();
        assert_eq!((summary.x, summary.y), (70.0, 610.0));
    }

    #[test]
    fn test_blank_description_line_consumes_a_line_slot() {
        let page = render(&sample());
        assert_eq!(page.find("Line one").map(|t| t.y), Some(480.0));
        // blank line at 464 is skipped but still advances the cursor
        assert_eq!(page.find("Line two").map(|t| t.y), Some(448.0));
    }

    #[test]
    fn test_missing_date_is_omitted() {
        let mut data = sample();
        data.date = None;
        let page = render(&data);
        assert!(page.texts.iter().all(|t| t.y != 710.0));
    }

    #[test]
    fn test_contact_block_flows_under_name() {
        let mut data = sample();
        data.client = ClientInfo {
            name: "Acme Co".to_string(),
            contact: Some("Jane Roe".to_string()),
            address: Some("1 Main St\n\nSpringfield".to_string()),
            email: Some("ap@acme.test".to_string()),
            phone: Some("555-0100".to_string()),
            extra: Default::default(),
        };
        let page = render(&data);

        let labels = ["Attn: Jane Roe", "1 Main St", "Springfield", "ap@acme.test", "555-0100"];
        let ys: Vec<(String, f32)> = labels
            .iter()
            .map(|t| (t.to_string(), page.find(t).unwrap().y))
            .collect();
        assert_eq!(
            ys,
            vec![
                ("Attn: Jane Roe".to_string(), 654.0),
                ("1 Main St".to_string(), 642.0),
                ("Springfield".to_string(), 630.0),
                ("ap@acme.test".to_string(), 618.0),
                ("555-0100".to_string(), 606.0),
            ]
        );
        assert_eq!(page.find("1 Main St").map(|t| t.style.size), Some(10.0));
        assert_eq!(page.find("Acme Co").map(|t| t.style.size), Some(12.0));
    }

    #[test]
    fn test_address_without_contact_starts_at_address_anchor() {
        let mut data = sample();
        data.client.address = Some("1 Main St\r\nSpringfield".to_string());
        data.client.email = Some("ap@acme.test".to_string());
        let page = render(&data);

        assert_eq!(page.find("1 Main St").map(|t| t.y), Some(650.0));
        assert_eq!(page.find("Springfield").map(|t| t.y), Some(638.0));
        assert_eq!(page.find("ap@acme.test").map(|t| t.y), Some(626.0));
    }

    #[test]
    fn test_email_without_address_or_contact_follows_name() {
        let mut data = sample();
        data.client.email = Some("ap@acme.test".to_string());
        let page = render(&data);
        assert_eq!(page.find("ap@acme.test").map(|t| t.y), Some(654.0));
    }

    #[test]
    fn test_description_truncates_at_box_floor() {
        let mut data = sample();
        data.description = (1..=20)
            .map(|i| format!("row {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let page = render(&data);

        let rows: Vec<&TextRun> = page
            .texts
            .iter()
            .filter(|t| t.text.starts_with("row "))
            .collect();
        // 480 down to 320 inclusive in steps of 16 = 11 lines
        assert_eq!(rows.len(), 11);
        assert_eq!(rows.last().map(|t| t.y), Some(320.0));
        assert!(page.find("row 12").is_none());
    }

    #[test]
    fn test_grid_covers_page_and_is_labeled() {
        let mut page = RecordingPage::letter();
        draw_calibration_grid(&mut page);

        // 0..=600 vertical (13), 0..=750 horizontal (16)
        assert_eq!(page.lines.len(), 13 + 16);
        assert!(page.find("600").is_some());
        assert!(page.find("750").is_some());
        assert!(page.texts.iter().all(|t| t.style.size == GRID_LABEL_SIZE));
    }

    #[test]
    fn test_grid_is_deterministic_for_odd_page_sizes() {
        let odd = || RecordingPage {
            width: 101.0,
            height: 49.0,
            ..RecordingPage::letter()
        };
        let (mut a, mut b) = (odd(), odd());
        draw_calibration_grid(&mut a);
        draw_calibration_grid(&mut b);
        assert_eq!(a.texts, b.texts);
        assert_eq!(a.lines.len(), 3 + 1);
    }

    #[test]
    fn test_grid_option_draws_before_fields() {
        let mut page = RecordingPage::letter();
        render_invoice(
            &mut page,
            get_metrics(FontFace::Regular),
            &default_geometry(),
            &sample(),
            RenderOptions { draw_grid: true },
        );
        assert!(!page.lines.is_empty());
        assert_eq!(page.texts.first().map(|t| t.text.as_str()), Some("0"));
        assert!(page.find("1001").is_some());
    }
}
