//! Generation invoker.
//!
//! Turns the session's active prompt, aspect ratio and shot type into a
//! [`RenderRequest`] and hands it to the backend. The quality and exclusion
//! qualifiers come from the `render` template and are not user-configurable
//! per request.

use serde_json::json;
use tracing::{debug, warn};

use crate::backend::{CreativeBackend, RenderRequest};
use crate::error::CoreError;
use crate::session::{AspectRatio, ImageHandle, ShotType};

/// Session values captured when a generation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPlan {
    /// Active prompt, already trimmed.
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub shot_type: ShotType,
    pub product_image: Option<ImageHandle>,
    pub model_image: Option<ImageHandle>,
}

/// Render the enriched instruction and assemble the backend request.
///
/// # Errors
///
/// Returns `CoreError::Prompt` if the `render` template fails.
pub fn build_request(
    prompts: &cdai_pm::PromptManager,
    plan: GenerationPlan,
) -> Result<RenderRequest, CoreError> {
    let instruction = prompts.render(
        cdai_pm::RENDER,
        &json!({
            "prompt": plan.prompt,
            "shot_type": plan.shot_type.label(),
        }),
    )?;

    Ok(RenderRequest {
        instruction,
        aspect_ratio: plan.aspect_ratio,
        shot_type: plan.shot_type,
        product_image: plan.product_image,
        model_image: plan.model_image,
    })
}

/// Call the backend for one image.
///
/// # Errors
///
/// Returns `CoreError::Generation` when the backend fails or returns no image.
pub async fn invoke(
    backend: &dyn CreativeBackend,
    request: &RenderRequest,
) -> Result<ImageHandle, CoreError> {
    debug!(
        backend = backend.name(),
        aspect_ratio = request.aspect_ratio.as_str(),
        shot_type = %request.shot_type,
        "rendering image"
    );

    backend.render_image(request).await.map_err(|e| {
        warn!(backend = backend.name(), error = %e, "image generation failed");
        CoreError::Generation(e)
    })
}
