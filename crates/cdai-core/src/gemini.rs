//! Gemini implementation of [`CreativeBackend`].
//!
//! Both calls go to `{api_base}/models/{model}:generateContent`. Scene
//! analysis sends the two images followed by the rendered `describe_scene`
//! instruction and reads back text parts; rendering sends the enriched
//! instruction followed by the optional images and reads back the first
//! inline image part.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdai_pm::PromptManager;
use serde_json::{Value, json};
use tracing::{debug, error, instrument};
use typed_builder::TypedBuilder;

use crate::backend::{BackendError, CreativeBackend, RenderRequest, SceneRequest};
use crate::config::{BackendConfig, StudioConfig};
use crate::session::ImageHandle;

/// Description used when the analysis model answers with no text.
pub const DEFAULT_SCENE_DESCRIPTION: &str =
    "A high-end commercial photo of the product with the model.";

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Resolved connection settings for [`GeminiBackend`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct GeminiSettings {
    #[builder(default, setter(strip_option, into))]
    pub api_key: Option<String>,
    #[builder(setter(into))]
    pub api_base: String,
    #[builder(setter(into))]
    pub analysis_model: String,
    #[builder(setter(into))]
    pub image_model: String,
    #[builder(default = 0.8)]
    pub temperature: f32,
    #[builder(default)]
    pub timeout: Option<Duration>,
}

impl GeminiSettings {
    /// Merge CLI overrides over the project file.
    pub fn resolve(config: &StudioConfig, backend: &BackendConfig) -> Self {
        Self {
            api_key: config.api_key().map(String::from),
            api_base: backend.api_base.trim().trim_end_matches('/').to_owned(),
            analysis_model: config
                .analysis_model()
                .map_or_else(|| backend.analysis_model.clone(), String::from),
            image_model: config
                .image_model()
                .map_or_else(|| backend.image_model.clone(), String::from),
            temperature: backend.temperature,
            timeout: backend.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Talks to the Generative Language REST API.
#[derive(Debug)]
pub struct GeminiBackend {
    settings: GeminiSettings,
    prompts: Arc<PromptManager>,
    http: reqwest::Client,
}

impl GeminiBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(settings: GeminiSettings, prompts: Arc<PromptManager>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            settings,
            prompts,
            http: builder.build()?,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_owned()
        } else {
            format!("models/{model}")
        };
        format!("{}/{model_path}:generateContent", self.settings.api_base)
    }

    async fn generate_content(&self, model: &str, payload: &Value) -> Result<Value, BackendError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BackendError::MissingApiKey)?;

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model, status = status.as_u16(), "generateContent failed");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl CreativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip_all, fields(model = %self.settings.analysis_model, direction = %request.direction))]
    async fn describe_scene(&self, request: &SceneRequest) -> Result<String, BackendError> {
        let instruction = self.prompts.render(
            cdai_pm::DESCRIBE_SCENE,
            &json!({ "direction": request.direction.label() }),
        )?;
        let payload = scene_payload(request, &instruction, self.settings.temperature);
        let response = self
            .generate_content(&self.settings.analysis_model, &payload)
            .await?;

        let text = extract_text(&response);
        if text.trim().is_empty() {
            debug!("analysis returned no text, using default description");
            return Ok(DEFAULT_SCENE_DESCRIPTION.to_owned());
        }
        Ok(text)
    }

    #[instrument(skip_all, fields(model = %self.settings.image_model, aspect_ratio = request.aspect_ratio.as_str()))]
    async fn render_image(&self, request: &RenderRequest) -> Result<ImageHandle, BackendError> {
        let payload = render_payload(request);
        let response = self
            .generate_content(&self.settings.image_model, &payload)
            .await?;
        extract_image(&response).ok_or(BackendError::NoImage)
    }
}

// ── Wire format ──────────────────────────────────────────────

fn image_part(image: &ImageHandle) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type().unwrap_or(DEFAULT_MIME_TYPE),
            "data": image.base64_payload(),
        }
    })
}

pub(crate) fn scene_payload(request: &SceneRequest, instruction: &str, temperature: f32) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                image_part(&request.product_image),
                image_part(&request.model_image),
                { "text": instruction },
            ],
        }],
        "generationConfig": { "temperature": temperature },
    })
}

pub(crate) fn render_payload(request: &RenderRequest) -> Value {
    let mut parts = vec![json!({ "text": request.instruction })];
    parts.extend(
        [&request.product_image, &request.model_image]
            .into_iter()
            .flatten()
            .map(image_part),
    );

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "imageConfig": { "aspectRatio": request.aspect_ratio.as_str() },
        },
    })
}

fn response_parts(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.pointer("/content/parts").and_then(Value::as_array))
        .flatten()
}

/// Concatenated text parts of all candidates.
pub(crate) fn extract_text(response: &Value) -> String {
    response_parts(response)
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<String>()
        .trim()
        .to_owned()
}

/// First inline image of any candidate.
pub(crate) fn extract_image(response: &Value) -> Option<ImageHandle> {
    response_parts(response).find_map(|part| {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
        let data = inline.get("data").and_then(Value::as_str)?;
        if data.is_empty() {
            return None;
        }
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE);
        Some(ImageHandle::from_base64(mime_type, data))
    })
}
