//! Compositing an overlay onto the template's first page.
//!
//! The overlay page becomes a Form XObject drawn after the template's own
//! content, so template graphics sit underneath and the overlay text on
//! top. Template pages after the first are dropped.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{merge_io, MergeError};

/// Resource name the overlay form is registered under (suffixed on collision).
const OVERLAY_XOBJECT: &str = "CertifyOverlay";

/// Guard against cyclic `Parent` chains or reference loops.
const MAX_DEPTH: usize = 32;

/// Merges overlays onto one template PDF.
#[derive(Debug, Clone)]
pub struct DocumentMerger {
    template: PathBuf,
}

impl DocumentMerger {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &Path {
        &self.template
    }

    /// Load and validate the template without merging anything.
    pub fn load_template(&self) -> Result<Document, MergeError> {
        if !self.template.exists() {
            return Err(MergeError::MissingTemplate {
                path: self.template.clone(),
            });
        }
        let doc = Document::load(&self.template).map_err(|source| MergeError::UnreadableTemplate {
            path: self.template.clone(),
            source,
        })?;
        if doc.get_pages().is_empty() {
            return Err(MergeError::EmptyTemplate);
        }
        Ok(doc)
    }

    /// Merge the overlay PDF at `overlay` and write the result to `output`.
    pub fn merge(&self, overlay: &Path, output: &Path) -> Result<(), MergeError> {
        let template = self.load_template()?;
        let overlay_doc = Document::load(overlay).map_err(|e| MergeError::MalformedOverlay {
            reason: format!("{}: {e}", overlay.display()),
        })?;
        self.write(composite(template, overlay_doc)?, output)
    }

    /// Merge an in-memory overlay document and write the result to `output`.
    pub fn merge_document(&self, overlay: Document, output: &Path) -> Result<(), MergeError> {
        let template = self.load_template()?;
        self.write(composite(template, overlay)?, output)
    }

    fn write(&self, mut doc: Document, output: &Path) -> Result<(), MergeError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| merge_io(parent, e))?;
        }
        doc.save(output).map_err(|e| merge_io(output, e))?;
        tracing::debug!(
            template = %self.template.display(),
            output = %output.display(),
            "merged certificate"
        );
        Ok(())
    }
}

/// Composite the single page of `overlay` onto the first page of `template`.
///
/// The result has exactly one page: the template's first page, with the
/// template content wrapped in `q … Q` followed by the overlay form.
pub fn composite(mut template: Document, mut overlay: Document) -> Result<Document, MergeError> {
    let pages = template.get_pages();
    let first = *pages.keys().next().ok_or(MergeError::EmptyTemplate)?;
    let extra: Vec<u32> = pages.keys().copied().filter(|n| *n != first).collect();
    if !extra.is_empty() {
        template.delete_pages(&extra);
    }
    let page_id = *template
        .get_pages()
        .values()
        .next()
        .ok_or(MergeError::EmptyTemplate)?;

    let overlay_pages = overlay.get_pages().len();
    if overlay_pages != 1 {
        return Err(MergeError::MalformedOverlay {
            reason: format!("expected exactly one page, found {overlay_pages}"),
        });
    }

    // Move overlay objects above the template's id range.
    overlay.renumber_objects_with(template.max_id + 1);
    let overlay_page = *overlay
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| MergeError::MalformedOverlay {
            reason: "overlay page vanished after renumbering".to_string(),
        })?;
    let form = overlay_form(&overlay, overlay_page)?;
    template.max_id = template.max_id.max(overlay.max_id);
    template.objects.extend(std::mem::take(&mut overlay.objects));
    let form_id = template.add_object(form);

    let mut resources = inherited(&template, page_id, b"Resources")
        .and_then(|obj| obj.as_dict().ok().cloned())
        .unwrap_or_default();
    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .map(|obj| resolve(&template, obj))
        .and_then(|obj| obj.as_dict().ok().cloned())
        .unwrap_or_default();
    let name = unique_name(&xobjects);
    xobjects.set(name.clone(), form_id);
    resources.set("XObject", xobjects);

    let mut contents = existing_contents(&template, page_id);
    let open = template.add_object(Stream::new(dictionary! {}, encode(vec![op("q", vec![])])?));
    let close = template.add_object(Stream::new(
        dictionary! {},
        encode(vec![
            op("Q", vec![]),
            op("q", vec![]),
            op("Do", vec![Object::Name(name.into_bytes())]),
            op("Q", vec![]),
        ])?,
    ));
    contents.insert(0, Object::Reference(open));
    contents.push(Object::Reference(close));

    let media_box = inherited(&template, page_id, b"MediaBox");
    let page = template.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", resources);
    page.set("Contents", contents);
    if let Some(media_box) = media_box {
        page.set("MediaBox", media_box);
    }

    template.prune_objects();
    Ok(template)
}

fn overlay_form(overlay: &Document, page_id: ObjectId) -> Result<Stream, MergeError> {
    let content = overlay.get_page_content(page_id)?;
    let bbox = inherited(overlay, page_id, b"MediaBox").ok_or_else(|| {
        MergeError::MalformedOverlay {
            reason: "overlay page has no MediaBox".to_string(),
        }
    })?;
    let resources = inherited(overlay, page_id, b"Resources")
        .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => bbox,
            "Resources" => resources,
        },
        content,
    ))
}

/// Page attribute looked up through the `Parent` chain, references resolved.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value).clone());
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> &'a Object {
    for _ in 0..MAX_DEPTH {
        match object {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => object = target,
                Err(_) => break,
            },
            _ => break,
        }
    }
    object
}

fn existing_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn unique_name(xobjects: &Dictionary) -> String {
    let mut name = OVERLAY_XOBJECT.to_string();
    let mut n = 1;
    while xobjects.has(name.as_bytes()) {
        name = format!("{OVERLAY_XOBJECT}{n}");
        n += 1;
    }
    name
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn encode(operations: Vec<Operation>) -> Result<Vec<u8>, MergeError> {
    Ok(Content { operations }.encode()?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A template with `pages` pages; MediaBox and fonts live on the page tree
    /// root so they must be inherited.
    fn template(pages: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "T1" => font_id },
        });

        let mut kids = Vec::new();
        for n in 1..=pages {
            let text = format!("Template page {n}");
            let content = encode(vec![
                op("BT", vec![]),
                op("Tf", vec!["T1".into(), 12.into()]),
                op("Td", vec![72.into(), 500.into()]),
                op("Tj", vec![Object::string_literal(text)]),
                op("ET", vec![]),
            ])
            .unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn overlay(text: &str) -> Document {
        let mut doc = template(1);
        let page_id = *doc.get_pages().values().next().unwrap();
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            encode(vec![
                op("BT", vec![]),
                op("Tf", vec!["T1".into(), 20.into()]),
                op("Tj", vec![Object::string_literal(text)]),
                op("ET", vec![]),
            ])
            .unwrap(),
        ));
        doc.get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("Contents", content_id);
        doc
    }

    fn form_content(doc: &Document, page_id: ObjectId) -> Vec<u8> {
        let resources = inherited(doc, page_id, b"Resources").unwrap();
        let xobjects = resources.as_dict().unwrap().get(b"XObject").unwrap();
        let form_id = xobjects
            .as_dict()
            .unwrap()
            .get(OVERLAY_XOBJECT.as_bytes())
            .and_then(Object::as_reference)
            .unwrap();
        doc.get_object(form_id)
            .and_then(Object::as_stream)
            .unwrap()
            .content
            .clone()
    }

    #[test]
    fn multi_page_template_yields_single_page() {
        let merged = composite(template(3), overlay("Jane Doe")).expect("composite");
        let pages = merged.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let content = String::from_utf8_lossy(&merged.get_page_content(page_id).unwrap()).into_owned();
        assert!(content.contains("Template page 1"), "content: {content}");
        assert!(!content.contains("Template page 2"));
        assert!(content.contains(&format!("/{OVERLAY_XOBJECT} Do")));
        // Template drawn first, overlay last.
        assert!(content.find("Template page 1") < content.find(" Do"));

        let form = String::from_utf8_lossy(&form_content(&merged, page_id)).into_owned();
        assert!(form.contains("(Jane Doe) Tj"), "form: {form}");
    }

    #[test]
    fn inherited_attributes_are_materialized_on_page() {
        let merged = composite(template(2), overlay("x")).unwrap();
        let page_id = *merged.get_pages().values().next().unwrap();
        let page = merged.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.has(b"Font"));
        assert!(resources.has(b"XObject"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn overlay_with_two_pages_is_malformed() {
        let err = composite(template(1), template(2)).unwrap_err();
        assert!(matches!(err, MergeError::MalformedOverlay { .. }), "got: {err}");
    }

    #[test]
    fn template_without_pages_is_empty() {
        let err = composite(template(0), overlay("x")).unwrap_err();
        assert!(matches!(err, MergeError::EmptyTemplate));
        assert!(err.is_template_problem());
    }

    #[test]
    fn missing_and_unreadable_templates() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = DocumentMerger::new(dir.path().join("absent.pdf"));
        assert!(matches!(
            missing.load_template().unwrap_err(),
            MergeError::MissingTemplate { .. }
        ));

        let garbage = dir.path().join("garbage.pdf");
        std::fs::write(&garbage, b"not a pdf at all").unwrap();
        let err = DocumentMerger::new(&garbage).load_template().unwrap_err();
        assert!(matches!(err, MergeError::UnreadableTemplate { .. }), "got: {err}");
        assert!(err.is_template_problem());
    }

    #[test]
    fn merge_document_writes_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let template_path = dir.path().join("template.pdf");
        template(2).save(&template_path).unwrap();

        let output = dir.path().join("out/certificate.pdf");
        DocumentMerger::new(&template_path)
            .merge_document(overlay("Jane Doe"), &output)
            .expect("merge");
        let reloaded = Document::load(&output).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }
}
