//! YAML job configuration.
//!
//! ```yaml
//! roster: input.xlsx
//! template: KAUST_Academy_Certificate.pdf
//! output_dir: output
//! layout: narrow-landscape
//! columns:
//!   full_name: Name
//! notify: false
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.
//! SMTP credentials never live here; see the pipeline's `SmtpConfig`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ColumnMap;

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// One certificate batch, as described by a job file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// Built-in layout name (`wide-landscape`, `narrow-landscape`, `portrait-badge`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Custom layout YAML; mutually exclusive with `layout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_file: Option<PathBuf>,
    #[serde(default)]
    pub columns: ColumnMap,
    /// Email each certificate after it is written.
    #[serde(default = "default_true")]
    pub notify: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            roster: None,
            template: None,
            output_dir: default_output_dir(),
            export_dir: default_export_dir(),
            layout: None,
            layout_file: None,
            columns: ColumnMap::default(),
            notify: true,
        }
    }
}

impl JobConfig {
    /// Parse a job file and resolve its relative paths.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolved_against(base))
    }

    /// Parse without touching the filesystem.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Reject configurations that select a layout twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.is_some() && self.layout_file.is_some() {
            return Err(ConfigError::Invalid(
                "set either `layout` or `layout_file`, not both".to_string(),
            ));
        }
        Ok(())
    }

    /// Rebase every relative path onto `base`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        let rebase = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.roster = self.roster.map(rebase);
        self.template = self.template.map(rebase);
        self.layout_file = self.layout_file.map(rebase);
        self.output_dir = rebase(self.output_dir);
        self.export_dir = rebase(self.export_dir);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = JobConfig::from_yaml("{}").expect("parse");
        assert_eq!(config, JobConfig::default());
        assert!(config.notify);
        assert_eq!(config.columns.full_name, "Full Name");
    }

    #[test]
    fn partial_column_map_keeps_other_defaults() {
        let config = JobConfig::from_yaml("columns:\n  full_name: Name\n").expect("parse");
        assert_eq!(config.columns.full_name, "Name");
        assert_eq!(config.columns.email, "Email");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(JobConfig::from_yaml("rooster: input.xlsx\n").is_err());
    }

    #[test]
    fn both_layouts_is_invalid() {
        let config = JobConfig {
            layout: Some("portrait-badge".into()),
            layout_file: Some("custom.yaml".into()),
            ..JobConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn relative_paths_rebase() {
        let config = JobConfig {
            roster: Some("input.xlsx".into()),
            template: Some("/abs/template.pdf".into()),
            ..JobConfig::default()
        }
        .resolved_against(Path::new("/jobs/summer"));
        assert_eq!(config.roster, Some(PathBuf::from("/jobs/summer/input.xlsx")));
        assert_eq!(config.template, Some(PathBuf::from("/abs/template.pdf")));
        assert_eq!(config.output_dir, PathBuf::from("/jobs/summer/output"));
    }
}
