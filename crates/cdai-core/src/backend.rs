//! Contract with the generation collaborator.
//!
//! The wizard never talks to a model directly. It produces a
//! [`SceneRequest`] or a [`RenderRequest`] and hands it to a
//! [`CreativeBackend`]; [`GeminiBackend`](crate::GeminiBackend) is the
//! shipped implementation.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::session::{AspectRatio, CreativeDirection, ImageHandle, ShotType};

/// Input for the "analyze + describe" call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneRequest {
    pub product_image: ImageHandle,
    pub model_image: ImageHandle,
    pub direction: CreativeDirection,
}

/// Input for the image rendering call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRequest {
    /// Active prompt enriched with the shot and quality qualifiers.
    pub instruction: String,
    pub aspect_ratio: AspectRatio,
    pub shot_type: ShotType,
    pub product_image: Option<ImageHandle>,
    pub model_image: Option<ImageHandle>,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no API key configured; set GEMINI_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no image")]
    NoImage,

    #[error("service returned no text")]
    EmptyText,

    #[error("prompt error: {0}")]
    Prompt(#[from] cdai_pm::PmError),

    #[error("{0}")]
    Other(String),
}

/// Generation collaborator used by the wizard's asynchronous transitions.
///
/// Calls are single-flight per session; implementations need not handle
/// concurrent requests for the same session.
#[async_trait]
pub trait CreativeBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Write a descriptive prompt from the two images and a creative direction.
    async fn describe_scene(&self, request: &SceneRequest) -> Result<String, BackendError>;

    /// Render one image from an enriched instruction.
    async fn render_image(&self, request: &RenderRequest) -> Result<ImageHandle, BackendError>;
}
