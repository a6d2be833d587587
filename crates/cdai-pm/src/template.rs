//! Template sources known to the prompt manager.
//!
//! Built-in templates are compiled into the binary. A template file found in
//! an override directory replaces the built-in template with the same name.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PmError;

/// Instruction sent with the product and model images to obtain a scene prompt.
///
/// Context: `direction` (creative direction label).
pub const DESCRIBE_SCENE: &str = "describe_scene";

/// Final instruction sent to the image model.
///
/// Context: `prompt` (active prompt text), `shot_type` (shot style label).
pub const RENDER: &str = "render";

/// File extensions recognized when loading an override directory.
pub(crate) const TEMPLATE_EXTENSIONS: [&str; 2] = ["j2", "jinja"];

/// A named template and its raw Jinja2 source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Template name used for lookup (e.g., `render`).
    pub name: String,

    /// Raw Jinja2 template source.
    pub source: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Read a template file, naming it after the file stem.
    ///
    /// Returns `Ok(None)` when the path does not carry a template extension.
    pub fn from_file(path: &Path) -> Result<Option<Self>, PmError> {
        let is_template = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(None);
        };
        if !is_template {
            return Ok(None);
        }

        let source = std::fs::read_to_string(path)?;
        Ok(Some(Self::new(stem, source)))
    }

    /// Templates shipped with the crate.
    pub(crate) fn builtin() -> [Self; 2] {
        [
            Self::new(DESCRIBE_SCENE, include_str!("../templates/describe_scene.j2")),
            Self::new(RENDER, include_str!("../templates/render.j2")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_read_template_from_file() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let path = dir.path().join("render.j2");
        std::fs::write(&path, "{{ prompt }}!").expect("should write template");

        let template = PromptTemplate::from_file(&path)
            .expect("should read")
            .expect("should be a template");
        assert_eq!(template.name, "render");
        assert_eq!(template.source, "{{ prompt }}!");
    }

    #[test]
    fn test_should_skip_non_template_files() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").expect("should write file");

        let template = PromptTemplate::from_file(&path).expect("should not fail");
        assert!(template.is_none());
    }

    #[test]
    fn test_should_ship_builtin_templates() {
        let names: Vec<_> = PromptTemplate::builtin()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec![DESCRIBE_SCENE, RENDER]);
    }
}
