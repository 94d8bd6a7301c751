//! Subcommand implementations, one module per command.

pub mod generate;
pub mod layouts;
pub mod preview;
pub mod xref;

use std::path::Path;

use anyhow::{Context, Result};

use certify_renderer::{LayoutSpec, LayoutVariant};

/// Resolve the layout from a variant name or a custom YAML file.
///
/// Falls back to `narrow-landscape` when neither is given.
pub(crate) fn resolve_layout(name: Option<&str>, file: Option<&Path>) -> Result<LayoutSpec> {
    match (name, file) {
        (Some(_), Some(_)) => anyhow::bail!("use either --layout or --layout-file, not both"),
        (_, Some(path)) => LayoutSpec::from_yaml_file(path)
            .with_context(|| format!("failed to load layout file {}", path.display())),
        (Some(name), None) => {
            let variant: LayoutVariant = name.parse().map_err(anyhow::Error::msg)?;
            Ok(variant.spec())
        }
        (None, None) => Ok(LayoutVariant::NarrowLandscape.spec()),
    }
}
