//! Backend calls handed to the presentation layer.
//!
//! A front end that must keep rendering while a call is in flight takes the
//! [`Call`] returned by a `Studio::begin_*` method, runs it on a background
//! task with [`Call::execute`], and feeds the resulting [`Completion`] back
//! through `Studio::complete`. Both carry the [`Ticket`] the wizard issued
//! when the call started, so a completion that outlived a reset is told apart
//! from the one the wizard is waiting on.

use crate::backend::{CreativeBackend, RenderRequest, SceneRequest};
use crate::error::CoreError;
use crate::session::ImageHandle;
use crate::step::Ticket;
use crate::{generation, prompt};

/// A collaborator call the wizard is waiting on.
#[derive(Debug, Clone)]
pub enum Call {
    /// Write the system prompt.
    Analysis {
        ticket: Ticket,
        request: SceneRequest,
    },
    /// Render an image.
    Generation {
        ticket: Ticket,
        request: RenderRequest,
    },
}

/// Outcome of a [`Call`].
#[derive(Debug)]
pub enum Completion {
    Analysis {
        ticket: Ticket,
        outcome: Result<String, CoreError>,
    },
    Generation {
        ticket: Ticket,
        outcome: Result<ImageHandle, CoreError>,
    },
}

impl Call {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Analysis { ticket, .. } | Self::Generation { ticket, .. } => *ticket,
        }
    }

    /// Run the call to completion. Never cancels, never retries.
    pub async fn execute(self, backend: &dyn CreativeBackend) -> Completion {
        match self {
            Self::Analysis { ticket, request } => Completion::Analysis {
                ticket,
                outcome: prompt::acquire(backend, &request).await,
            },
            Self::Generation { ticket, request } => Completion::Generation {
                ticket,
                outcome: generation::invoke(backend, &request).await,
            },
        }
    }
}

impl Completion {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Analysis { ticket, .. } | Self::Generation { ticket, .. } => *ticket,
        }
    }
}
