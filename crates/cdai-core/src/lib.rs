mod backend;
mod config;
mod engine;
mod error;
mod events;
mod gemini;
mod generation;
mod prompt;
mod session;
mod step;
mod wizard;

#[cfg(test)]
mod testing;

pub use backend::{BackendError, CreativeBackend, RenderRequest, SceneRequest};
pub use config::{
    BackendConfig, OutputConfig, ProjectConfig, PromptsConfig, StudioConfig, load_project_config,
};
pub use engine::Studio;
pub use error::{ANALYSIS_FAILED_MESSAGE, CoreError, GENERATION_FAILED_MESSAGE};
pub use events::{Call, Completion};
pub use gemini::{GeminiBackend, GeminiSettings};
pub use generation::GenerationPlan;
pub use prompt::PromptStrategy;
pub use session::{AspectRatio, CreativeDirection, ImageHandle, PromptMode, Session, ShotType};
pub use step::{Activity, Pending, Phase, Step, Ticket};
pub use wizard::Wizard;
