//! lopdf-backed `DrawablePage` over the first page of a template.
//!
//! Draw calls are buffered as content operations and written out on
//! `into_bytes`: the existing page content is wrapped in `q`/`Q` so our
//! graphics state starts clean, and the overlay is appended as a new stream.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::layout::engine::{render_invoice, DrawablePage, RenderOptions, Rgb, TextStyle};
use crate::layout::font_metrics::{encode_win_ansi, get_metrics, FontFace};
use crate::layout::geometry::LayoutGeometry;
use crate::layout::LayoutError;
use crate::models::invoice::InvoiceData;

pub struct TemplatePage {
    doc: Document,
    page_id: ObjectId,
    size: (f32, f32),
    operations: Vec<Operation>,
    faces_used: Vec<FontFace>,
}

impl TemplatePage {
    /// Parses template bytes and selects the first page.
    pub fn load(bytes: &[u8]) -> Result<Self, LayoutError> {
        let doc = Document::load_mem(bytes).map_err(|e| LayoutError::TemplateLoad(e.to_string()))?;
        let page_id = doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| LayoutError::TemplateLoad("template has no pages".to_string()))?;
        let size = media_box_size(&doc, page_id)?;

        Ok(TemplatePage {
            doc,
            page_id,
            size,
            operations: Vec::new(),
            faces_used: Vec::new(),
        })
    }

    /// Applies the buffered overlay and serializes the whole document.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, LayoutError> {
        if !self.operations.is_empty() {
            self.apply_overlay()?;
        }
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| LayoutError::Serialize(e.to_string()))?;
        Ok(out)
    }

    fn apply_overlay(&mut self) -> Result<(), LayoutError> {
        let mut fonts = Dictionary::new();
        for face in &self.faces_used {
            let font_id = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(face.resource_name(), Object::Reference(font_id));
        }

        let mut resources = inherited_dict(&self.doc, self.page_id, b"Resources").unwrap_or_default();
        let mut font_dict = resources
            .get(b"Font")
            .ok()
            .and_then(|obj| resolve(&self.doc, obj).as_dict().ok())
            .cloned()
            .unwrap_or_default();
        for (name, font) in fonts.iter() {
            font_dict.set(name.clone(), font.clone());
        }
        resources.set("Font", Object::Dictionary(font_dict));

        let overlay = Content {
            operations: std::mem::take(&mut self.operations),
        }
        .encode()
        .map_err(|e| LayoutError::Serialize(e.to_string()))?;
        // Leading newline keeps Q from fusing with the template's last token.
        let mut closing = b"\nQ\n".to_vec();
        closing.extend(overlay);

        let existing = self.existing_contents();
        let open_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let close_id = self.doc.add_object(Stream::new(dictionary! {}, closing));

        let mut contents = vec![Object::Reference(open_id)];
        contents.extend(existing);
        contents.push(Object::Reference(close_id));

        let page = self
            .doc
            .get_object_mut(self.page_id)
            .and_then(|obj| obj.as_dict_mut())
            .map_err(|e| LayoutError::Serialize(e.to_string()))?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
        Ok(())
    }

    /// The page's current content stream references, flattened to a list.
    fn existing_contents(&self) -> Vec<Object> {
        let Ok(page) = self.doc.get_dictionary(self.page_id) else {
            return Vec::new();
        };
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn use_face(&mut self, face: FontFace) {
        if !self.faces_used.contains(&face) {
            self.faces_used.push(face);
        }
    }
}

impl DrawablePage for TemplatePage {
    fn size(&self) -> (f32, f32) {
        self.size
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        self.use_face(style.face);
        let Rgb(r, g, b) = style.color;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(style.face.resource_name().as_bytes().to_vec()),
                    Object::Real(style.size),
                ],
            ),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn draw_line(&mut self, start: (f32, f32), end: (f32, f32), thickness: f32, color: Rgb) {
        let Rgb(r, g, b) = color;
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("w", vec![Object::Real(thickness)]),
            Operation::new("m", vec![Object::Real(start.0), Object::Real(start.1)]),
            Operation::new("l", vec![Object::Real(end.0), Object::Real(end.1)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }
}

/// Loads the template, draws the invoice onto its first page and returns the
/// new document bytes. Unparseable templates fail before anything is drawn.
pub fn fill_invoice(
    template: &[u8],
    data: &InvoiceData,
    geometry: &LayoutGeometry,
    options: RenderOptions,
) -> Result<Vec<u8>, LayoutError> {
    let mut page = TemplatePage::load(template)?;
    render_invoice(
        &mut page,
        get_metrics(FontFace::Regular),
        geometry,
        data,
        options,
    );
    let bytes = page.into_bytes()?;
    debug!("Filled invoice {} ({} bytes)", data.invoice_number, bytes.len());
    Ok(bytes)
}

/// Calibration render: placeholder fields with the grid always on.
pub fn debug_grid(
    template: &[u8],
    geometry: &LayoutGeometry,
    today: String,
) -> Result<Vec<u8>, LayoutError> {
    fill_invoice(
        template,
        &InvoiceData::placeholder(today),
        geometry,
        RenderOptions { draw_grid: true },
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match resolve(doc, obj) {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Looks `key` up on the page, then up the `Parent` chain.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    loop {
        if let Ok(obj) = node.get(key) {
            return Some(resolve(doc, obj));
        }
        let parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
}

fn inherited_dict(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Dictionary> {
    inherited(doc, page_id, key)?.as_dict().ok().cloned()
}

fn media_box_size(doc: &Document, page_id: ObjectId) -> Result<(f32, f32), LayoutError> {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .ok_or_else(|| LayoutError::TemplateLoad("page has no MediaBox".to_string()))?;
    let coords: Vec<f32> = media_box.iter().filter_map(|o| number(doc, o)).collect();
    match coords.as_slice() {
        [llx, lly, urx, ury] => Ok(((urx - llx).abs(), (ury - lly).abs())),
        _ => Err(LayoutError::TemplateLoad("malformed MediaBox".to_string())),
    }
}
