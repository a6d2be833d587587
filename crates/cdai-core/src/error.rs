use thiserror::Error;

use crate::backend::BackendError;
use crate::step::{Step, Ticket};

/// Message shown when the system prompt could not be produced.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze images. Please try again.";

/// Message shown when no image came back from the generation backend.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate image. Please try again.";

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot {action} from step {step}")]
    InvalidTransition { step: Step, action: &'static str },

    #[error("both a product image and a model image are required")]
    MissingImages,

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("a request is already in flight")]
    Busy,

    #[error("no {0} request is in flight")]
    NotAwaiting(&'static str),

    #[error("request {0} was abandoned")]
    StaleCompletion(Ticket),

    #[error("session is missing {0}")]
    IncompleteSession(&'static str),

    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("image analysis failed: {0}")]
    Analysis(#[source] BackendError),

    #[error("image generation failed: {0}")]
    Generation(#[source] BackendError),

    #[error("backend setup failed: {0}")]
    Backend(#[source] BackendError),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] cdai_pm::PmError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
