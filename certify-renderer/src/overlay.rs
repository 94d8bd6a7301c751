//! Overlay renderer — one page of record text on a blank, template-sized page.
//!
//! Geometry is computed first ([`OverlayRenderer::place`]) and is pure; the
//! PDF is then a straight transcription of the placed text into a content
//! stream using the standard-14 Helvetica faces.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tera::Tera;

use certify_core::types::{ColumnMap, RosterRecord, TraceId};

use crate::context::RenderContext;
use crate::error::{render_io, RenderError};
use crate::layout::{FontFace, LayoutSpec, Placement, Rgb};
use crate::metrics::{encode_win_ansi, text_width};

const SUBJECT_TEMPLATE: &str = "message/subject";
const BODY_TEMPLATE: &str = "message/body";

fn line_template(idx: usize) -> String {
    format!("line/{idx}")
}

/// Left edge that centers `text_width` on the page, plus a fixed offset.
pub fn centered_x(page_width: f32, text_width: f32, x_offset: f32) -> f32 {
    (page_width - text_width) / 2.0 + x_offset
}

/// A line of text with its final position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub font: FontFace,
    pub size: f32,
    pub color: Rgb,
    pub x: f32,
    /// Baseline.
    pub y: f32,
}

/// Renders overlays for one [`LayoutSpec`].
///
/// Create once per batch with [`OverlayRenderer::new`] and reuse; line and
/// message templates are compiled up front.
pub struct OverlayRenderer {
    layout: LayoutSpec,
    tera: Tera,
}

impl OverlayRenderer {
    pub fn new(layout: LayoutSpec) -> Result<Self, RenderError> {
        let mut templates: Vec<(String, String)> = layout
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (line_template(idx), line.content.clone()))
            .collect();
        templates.push((SUBJECT_TEMPLATE.to_string(), layout.message.subject.clone()));
        templates.push((BODY_TEMPLATE.to_string(), layout.message.body.clone()));

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        Ok(OverlayRenderer { layout, tera })
    }

    pub fn layout(&self) -> &LayoutSpec {
        &self.layout
    }

    /// Build the render context for `record` and check the layout's required fields.
    pub fn context(
        &self,
        record: &RosterRecord,
        columns: &ColumnMap,
        trace_id: TraceId,
    ) -> Result<RenderContext, RenderError> {
        let ctx = RenderContext::from_record(record, columns, trace_id)?;
        ctx.require(&self.layout.required)?;
        Ok(ctx)
    }

    /// Resolve every line's text and position, top to bottom, followed by the stamp.
    pub fn place(&self, ctx: &RenderContext) -> Result<Vec<PlacedText>, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let page = self.layout.page;
        let start_y = self.layout.start_y();

        let mut placed = Vec::with_capacity(self.layout.lines.len() + 1);
        let mut previous_y = start_y;
        for (idx, line) in self.layout.lines.iter().enumerate() {
            let text = self.tera.render(&line_template(idx), &tera_ctx)?;
            let y = match line.placement {
                Placement::Start => start_y,
                Placement::BelowStart { offset } => start_y - offset,
                Placement::Stacked { padding } => previous_y - line.size - padding,
            };
            let width = text_width(line.font, &text, line.size);
            placed.push(PlacedText {
                x: centered_x(page.width, width, line.x_offset),
                y,
                text,
                font: line.font,
                size: line.size,
                color: line.color,
            });
            previous_y = y;
        }

        let stamp = &self.layout.stamp;
        let (x, y) = stamp.origin(page);
        placed.push(PlacedText {
            text: ctx.trace_id.clone(),
            font: FontFace::Helvetica,
            size: stamp.size,
            color: stamp.color,
            x,
            y,
        });
        Ok(placed)
    }

    /// Render the single-page overlay document.
    pub fn render(&self, ctx: &RenderContext) -> Result<Document, RenderError> {
        let placed = self.place(ctx)?;
        build_document(self.layout.page.width, self.layout.page.height, &placed)
    }

    /// Render and write the overlay to `path`.
    pub fn render_to_file(&self, ctx: &RenderContext, path: &Path) -> Result<(), RenderError> {
        let mut doc = self.render(ctx)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| render_io(parent, e))?;
        }
        doc.save(path).map_err(|e| render_io(path, e))?;
        tracing::debug!(path = %path.display(), "wrote overlay");
        Ok(())
    }

    /// Subject and body of the notification email for `ctx`.
    pub fn message(&self, ctx: &RenderContext) -> Result<(String, String), RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let subject = self.tera.render(SUBJECT_TEMPLATE, &tera_ctx)?;
        let body = self.tera.render(BODY_TEMPLATE, &tera_ctx)?;
        Ok((subject, body))
    }
}

fn text_operations(item: &PlacedText) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "rg",
            vec![item.color.r.into(), item.color.g.into(), item.color.b.into()],
        ),
        Operation::new("Tf", vec![item.font.resource_name().into(), item.size.into()]),
        Operation::new("Td", vec![item.x.into(), item.y.into()]),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(&item.text))]),
        Operation::new("ET", vec![]),
    ]
}

fn build_document(width: f32, height: f32, placed: &[PlacedText]) -> Result<Document, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in FontFace::all() {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let operations: Vec<Operation> = placed.iter().flat_map(text_operations).collect();
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(concat!("certify ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutVariant;
    use certify_core::types::{CellValue, Field};
    use chrono::NaiveDate;
    use rstest::rstest;

    fn record(name: &str) -> RosterRecord {
        let date = |y, m, d| {
            CellValue::DateTime(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
        };
        RosterRecord::new(2)
            .with("Full Name", CellValue::Text(name.into()))
            .with("Specialization", CellValue::Text("Bioinformatics".into()))
            .with("Start Date", date(2024, 1, 10))
            .with("End Date", date(2024, 3, 20))
    }

    fn renderer(variant: LayoutVariant) -> OverlayRenderer {
        OverlayRenderer::new(variant.spec()).expect("renderer")
    }

    #[rstest]
    #[case("A")]
    #[case("Jane Doe")]
    #[case("Maximiliana Wilhelmina Featherstonehaugh-Cholmondeley")]
    fn lines_stay_centered_for_any_length(#[case] name: &str) {
        for variant in LayoutVariant::all() {
            let r = renderer(*variant);
            let ctx = r.context(&record(name), &ColumnMap::default(), TraceId::generate()).unwrap();
            let placed = r.place(&ctx).unwrap();
            let layout = r.layout();
            for (item, line) in placed.iter().zip(&layout.lines) {
                let center = item.x + text_width(item.font, &item.text, item.size) / 2.0;
                let expected = layout.page.width / 2.0 + line.x_offset;
                assert!((center - expected).abs() < 0.01, "{variant}: {} off center", item.text);
            }
        }
    }

    #[test]
    fn narrow_layout_stacks_lines_downward() {
        let r = renderer(LayoutVariant::NarrowLandscape);
        let ctx = r.context(&record("Jane Doe"), &ColumnMap::default(), TraceId::generate()).unwrap();
        let placed = r.place(&ctx).unwrap();
        let start = r.layout().start_y();
        assert!((placed[0].y - start).abs() < 1e-3);
        // 25pt name + 0.25in before the paragraph, then 14pt + 0.125in per line.
        assert!((placed[1].y - (start - 43.0)).abs() < 1e-3);
        assert!((placed[2].y - (placed[1].y - 23.0)).abs() < 1e-3);
        assert_eq!(
            placed[2].text,
            "Program by delivering Bioinformatics courses, from January 10 to March 20 2024."
        );
    }

    #[test]
    fn wide_layout_upper_cases_name_and_program() {
        let r = renderer(LayoutVariant::WideLandscape);
        let ctx = r.context(&record("Jane Doe"), &ColumnMap::default(), TraceId::generate()).unwrap();
        let placed = r.place(&ctx).unwrap();
        assert_eq!(placed[0].text, "JANE DOE");
        assert_eq!(placed[2].text, "BIOINFORMATICS");
        assert!((placed[3].y - (r.layout().start_y() - 100.8)).abs() < 1e-3);
    }

    #[test]
    fn stamp_is_small_gray_and_last() {
        let r = renderer(LayoutVariant::PortraitBadge);
        let id = TraceId::generate();
        let ctx = r.context(&record("Jane Doe"), &ColumnMap::default(), id).unwrap();
        let placed = r.place(&ctx).unwrap();
        let stamp = placed.last().unwrap();
        assert_eq!(stamp.text, id.to_string());
        assert_eq!(stamp.color, Rgb::GRAY);
        assert!(placed.iter().take(placed.len() - 1).all(|p| p.size > stamp.size));
        assert_eq!((stamp.x, stamp.y), (18.0, 18.0));
    }

    #[test]
    fn missing_name_is_render_error() {
        let r = renderer(LayoutVariant::PortraitBadge);
        let err = r
            .context(&record("   "), &ColumnMap::default(), TraceId::generate())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingField { field: Field::FullName }));
    }

    #[test]
    fn rendered_document_has_one_page_with_layout_media_box() {
        let r = renderer(LayoutVariant::NarrowLandscape);
        let ctx = r.context(&record("Jane Doe"), &ColumnMap::default(), TraceId::generate()).unwrap();
        let doc = r.render(&ctx).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box.len(), 4);
        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("(Jane Doe) Tj"), "content: {text}");
        assert!(text.contains(&ctx.trace_id));
    }

    #[test]
    fn render_to_file_writes_loadable_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/overlay.pdf");
        let r = renderer(LayoutVariant::WideLandscape);
        let ctx = r.context(&record("Jane Doe"), &ColumnMap::default(), TraceId::generate()).unwrap();
        r.render_to_file(&ctx, &path).unwrap();
        let doc = Document::load(&path).expect("reload overlay");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn message_templates_render() {
        let r = renderer(LayoutVariant::NarrowLandscape);
        let ctx = r.context(&record("Jane Doe"), &ColumnMap::default(), TraceId::generate()).unwrap();
        let (subject, body) = r.message(&ctx).unwrap();
        assert!(subject.contains("Certificate of Contribution"));
        assert!(body.starts_with("Dear Jane Doe,"));
        assert!(body.contains("courses from January 10 to March 20 2024 has been"));
    }
}
