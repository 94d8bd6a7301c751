//! # certify-renderer
//!
//! Draws one record's certificate text onto a blank page sized to a template
//! ([`OverlayRenderer`]), then composites that overlay onto the template's
//! first page ([`DocumentMerger`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use certify_core::types::{ColumnMap, RosterRecord, TraceId};
//! use certify_renderer::{DocumentMerger, LayoutVariant, OverlayRenderer};
//!
//! fn certify(record: &RosterRecord) -> Result<(), Box<dyn std::error::Error>> {
//!     let renderer = OverlayRenderer::new(LayoutVariant::NarrowLandscape.spec())?;
//!     let ctx = renderer.context(record, &ColumnMap::default(), TraceId::generate())?;
//!     renderer.render_to_file(&ctx, Path::new("overlay.pdf"))?;
//!     DocumentMerger::new("template.pdf")
//!         .merge(Path::new("overlay.pdf"), Path::new("output/certificate.pdf"))?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod error;
pub mod layout;
pub mod merge;
pub mod metrics;
pub mod overlay;

pub use context::RenderContext;
pub use error::{MergeError, RenderError};
pub use layout::{FontFace, LayoutSpec, LayoutVariant, Placement, Rgb};
pub use merge::DocumentMerger;
pub use overlay::{OverlayRenderer, PlacedText};
