//! Prompt acquisition.
//!
//! The prompt mode picks one of two strategies for the rest of the creative
//! cycle: the user's own text, or a description the backend writes from the
//! uploaded images. The system variant can be re-run any number of times;
//! every run fully replaces the previous prompt.

use tracing::{debug, warn};

use crate::backend::{BackendError, CreativeBackend, SceneRequest};
use crate::error::CoreError;
use crate::session::{PromptMode, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStrategy {
    /// `user_prompt` is used verbatim after trimming.
    UserAuthored,
    /// `system_prompt` comes from [`acquire`].
    SystemGenerated,
}

impl From<PromptMode> for PromptStrategy {
    fn from(mode: PromptMode) -> Self {
        match mode {
            PromptMode::User => Self::UserAuthored,
            PromptMode::System => Self::SystemGenerated,
        }
    }
}

impl PromptStrategy {
    /// The authoritative prompt for the next generation, trimmed.
    ///
    /// `None` when the field this strategy reads is absent or blank.
    pub fn active_prompt(self, session: &Session) -> Option<&str> {
        let field = match self {
            Self::UserAuthored => session.user_prompt.as_deref(),
            Self::SystemGenerated => session.system_prompt.as_deref(),
        };
        field.map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Ask the backend to describe the scene for the given images and direction.
///
/// # Errors
///
/// Returns `CoreError::Analysis` when the backend fails or answers with blank text.
pub async fn acquire(
    backend: &dyn CreativeBackend,
    request: &SceneRequest,
) -> Result<String, CoreError> {
    debug!(backend = backend.name(), direction = %request.direction, "describing scene");

    let text = backend.describe_scene(request).await.map_err(|e| {
        warn!(backend = backend.name(), error = %e, "scene analysis failed");
        CoreError::Analysis(e)
    })?;

    let text = text.trim();
    if text.is_empty() {
        warn!(backend = backend.name(), "scene analysis returned blank text");
        return Err(CoreError::Analysis(BackendError::EmptyText));
    }
    Ok(text.to_owned())
}
