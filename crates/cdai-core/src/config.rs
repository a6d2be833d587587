//! Configuration types for cdai-core.
//!
//! This module defines [`StudioConfig`] (CLI-level overrides) and
//! [`ProjectConfig`] (from `.cdai/config.yaml` in the working directory).
//! When a studio is built, values in `StudioConfig` take precedence over the
//! ones read from `ProjectConfig`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

// ── Studio Configuration (CLI-level) ─────────────────────────

/// Studio configuration provided by the CLI layer.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use cdai_core::StudioConfig;
///
/// let config = StudioConfig::builder()
///     .workdir(PathBuf::from("/tmp/campaign"))
///     .image_model("gemini-2.5-flash-image")
///     .build();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct StudioConfig {
    /// Directory holding `.cdai/` and, by default, saved assets.
    workdir: PathBuf,

    /// Generation service API key.
    #[builder(default, setter(strip_option(fallback = api_key_opt), into))]
    #[serde(skip_serializing)]
    api_key: Option<String>,

    /// Override the scene-analysis model.
    #[builder(default, setter(strip_option(fallback = analysis_model_opt), into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis_model: Option<String>,

    /// Override the image model.
    #[builder(default, setter(strip_option(fallback = image_model_opt), into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    image_model: Option<String>,
}

impl StudioConfig {
    pub fn workdir(&self) -> &PathBuf {
        &self.workdir
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn analysis_model(&self) -> Option<&str> {
        self.analysis_model.as_deref()
    }

    pub fn image_model(&self) -> Option<&str> {
        self.image_model.as_deref()
    }

    /// Returns the `.cdai` directory path for this working directory.
    pub fn cdai_dir(&self) -> PathBuf {
        self.workdir.join(".cdai")
    }

    /// Returns the path to `config.yaml` inside the `.cdai` directory.
    pub fn config_path(&self) -> PathBuf {
        self.cdai_dir().join("config.yaml")
    }

    /// Returns the directory the CLI writes its log files to.
    pub fn logs_dir(&self) -> PathBuf {
        self.cdai_dir().join("logs")
    }

    /// Resolve a configured path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}

// ── Project Configuration (.cdai/config.yaml) ───────────────

/// Project-level configuration, deserialized from `.cdai/config.yaml`.
///
/// Every key has a serde default, so a partial or empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Generation service settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Prompt template search paths.
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Where generated images are saved.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL of the Generative Language API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model that writes the system prompt from the images.
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,

    /// Model that renders the final image.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Sampling temperature for scene analysis.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout. Absent means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            analysis_model: default_analysis_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

/// Prompt template configuration.
///
/// Templates found in these directories replace built-in templates with the
/// same name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsConfig {
    /// Additional template directories to search (in order).
    #[serde(default)]
    pub include: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Directory for saved images, relative to the working directory unless absolute.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

// ── Default value functions for serde ────────────────────────

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_owned()
}

fn default_analysis_model() -> String {
    "gemini-3-flash-preview".to_owned()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_owned()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("creative-assets")
}

// ── Config loading ───────────────────────────────────────────

/// Load [`ProjectConfig`] from a `config.yaml` file.
///
/// If the file does not exist, returns the default configuration.
///
/// # Errors
///
/// Returns `CoreError::Io` if the file exists but cannot be read.
/// Returns `CoreError::Config` if the file contains invalid YAML.
pub fn load_project_config(config_path: &Path) -> Result<ProjectConfig, crate::CoreError> {
    if !config_path.exists() {
        return Ok(ProjectConfig::default());
    }
    let content = std::fs::read_to_string(config_path)?;
    if content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_build_studio_config_with_defaults() {
        let config = StudioConfig::builder()
            .workdir(PathBuf::from("/tmp/campaign"))
            .build();

        assert_eq!(config.workdir(), &PathBuf::from("/tmp/campaign"));
        assert!(config.api_key().is_none());
        assert!(config.analysis_model().is_none());
        assert!(config.image_model().is_none());
    }

    #[test]
    fn test_should_compute_cdai_paths() {
        let config = StudioConfig::builder()
            .workdir(PathBuf::from("/home/user/campaign"))
            .build();

        assert_eq!(config.cdai_dir(), PathBuf::from("/home/user/campaign/.cdai"));
        assert_eq!(
            config.config_path(),
            PathBuf::from("/home/user/campaign/.cdai/config.yaml")
        );
        assert_eq!(
            config.logs_dir(),
            PathBuf::from("/home/user/campaign/.cdai/logs")
        );
        assert_eq!(
            config.resolve(Path::new("out")),
            PathBuf::from("/home/user/campaign/out")
        );
        assert_eq!(config.resolve(Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[test]
    fn test_should_deserialize_default_project_config() {
        let config: ProjectConfig = serde_yaml::from_str("{}").expect("should parse");

        assert_eq!(
            config.backend.api_base,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.backend.analysis_model, "gemini-3-flash-preview");
        assert_eq!(config.backend.image_model, "gemini-2.5-flash-image");
        assert!((config.backend.temperature - 0.8).abs() < f32::EPSILON);
        assert!(config.backend.timeout_secs.is_none());
        assert!(config.prompts.include.is_empty());
        assert_eq!(config.output.dir, PathBuf::from("creative-assets"));
    }

    #[test]
    fn test_should_deserialize_full_project_config() {
        let yaml = r#"
backend:
  apiBase: http://localhost:8080/v1beta
  analysisModel: gemini-2.0-flash
  imageModel: gemini-3-pro-image-preview
  temperature: 0.4
  timeoutSecs: 90
prompts:
  include:
    - prompts
output:
  dir: /srv/assets
"#;

        let config: ProjectConfig = serde_yaml::from_str(yaml).expect("should parse YAML");

        assert_eq!(config.backend.api_base, "http://localhost:8080/v1beta");
        assert_eq!(config.backend.analysis_model, "gemini-2.0-flash");
        assert_eq!(config.backend.image_model, "gemini-3-pro-image-preview");
        assert_eq!(config.backend.timeout_secs, Some(90));
        assert_eq!(config.prompts.include, vec![PathBuf::from("prompts")]);
        assert_eq!(config.output.dir, PathBuf::from("/srv/assets"));
    }

    #[test]
    fn test_should_not_serialize_api_key() {
        let config = StudioConfig::builder()
            .workdir(PathBuf::from("/tmp/campaign"))
            .api_key("secret")
            .image_model("img")
            .build();

        let value = serde_json::to_value(&config).expect("should serialize");
        assert_eq!(value["workdir"], json!("/tmp/campaign"));
        assert_eq!(value["image_model"], json!("img"));
        assert!(value.get("api_key").is_none());
        assert!(value.get("analysis_model").is_none());
    }

    #[test]
    fn test_should_load_default_when_config_file_missing() {
        let path = PathBuf::from("/nonexistent/config.yaml");
        let config = load_project_config(&path).expect("should return default");
        assert_eq!(config.backend.image_model, "gemini-2.5-flash-image");
    }

    #[test]
    fn test_should_load_config_from_tempfile() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "backend:\n  imageModel: test-model\n")
            .expect("should write config");

        let config = load_project_config(&config_path).expect("should load config");
        assert_eq!(config.backend.image_model, "test-model");
        // Defaults should still apply for unspecified fields
        assert_eq!(config.backend.analysis_model, "gemini-3-flash-preview");
        assert_eq!(config.output.dir, PathBuf::from("creative-assets"));
    }

    #[test]
    fn test_should_reject_invalid_yaml() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "backend: [unclosed").expect("should write config");

        let result = load_project_config(&config_path);
        assert!(matches!(result, Err(crate::CoreError::Config(_))));
    }
}
