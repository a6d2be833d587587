use std::collections::BTreeSet;
use std::path::Path;

use minijinja::{Environment, UndefinedBehavior};
use tracing::debug;

use crate::error::PmError;
use crate::template::PromptTemplate;

/// Manages prompt templates and renders them with context variables.
///
/// Starts with the built-in templates; [`load_dir`](Self::load_dir) and
/// [`add_template`](Self::add_template) replace them by name.
#[derive(Debug)]
pub struct PromptManager {
    env: Environment<'static>,
    names: BTreeSet<String>,
}

impl PromptManager {
    /// Create a manager holding the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns `PmError::InvalidTemplate` if a built-in template fails to parse.
    pub fn new() -> Result<Self, PmError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let mut pm = Self {
            env,
            names: BTreeSet::new(),
        };
        for template in PromptTemplate::builtin() {
            pm.add_template(template)?;
        }
        Ok(pm)
    }

    /// Load all `.j2` / `.jinja` templates from a directory.
    ///
    /// Subdirectories are not searched.
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), PmError> {
        let mut paths = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.sort();

        for path in paths.iter().filter(|p| p.is_file()) {
            if let Some(template) = PromptTemplate::from_file(path)? {
                debug!(name = %template.name, path = %path.display(), "loaded template override");
                self.add_template(template)?;
            }
        }
        Ok(())
    }

    /// Register a single template, replacing any template with the same name.
    pub fn add_template(&mut self, template: PromptTemplate) -> Result<(), PmError> {
        let PromptTemplate { name, source } = template;
        self.env
            .add_template_owned(name.clone(), source)
            .map_err(|source| PmError::InvalidTemplate {
                name: name.clone(),
                source,
            })?;
        self.names.insert(name);
        Ok(())
    }

    /// Render a template by name with the given context.
    pub fn render(&self, name: &str, ctx: &serde_json::Value) -> Result<String, PmError> {
        if !self.names.contains(name) {
            return Err(PmError::TemplateNotFound(name.to_owned()));
        }
        let template = self
            .env
            .get_template(name)
            .map_err(|_| PmError::TemplateNotFound(name.to_owned()))?;
        let rendered = template.render(ctx).map_err(|source| PmError::Render {
            name: name.to_owned(),
            source,
        })?;
        Ok(rendered.trim().to_owned())
    }

    /// Names of all registered templates, sorted.
    pub fn list_templates(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }
}
