//! Wizard steps and the busy/idle activity of the machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current position in the wizard. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    #[default]
    Upload,
    SizeSelection,
    ModeSelection,
    UserPromptInput,
    SystemDirection,
    PromptPreview,
    ShotType,
    /// A render request is in flight.
    Generating,
    /// Shows either the generated image or the generation error.
    Result,
    /// Terminal; only `restart` leaves it.
    SessionEnd,
}

impl Step {
    /// Progress phase shown in the breadcrumb. `SessionEnd` has none.
    pub fn phase(self) -> Option<Phase> {
        match self {
            Self::Upload => Some(Phase::Upload),
            Self::SizeSelection => Some(Phase::Size),
            Self::ModeSelection
            | Self::UserPromptInput
            | Self::SystemDirection
            | Self::PromptPreview => Some(Phase::Creative),
            Self::ShotType => Some(Phase::Shot),
            Self::Generating | Self::Result => Some(Phase::Production),
            Self::SessionEnd => None,
        }
    }

    /// Whether the global reset is offered on this step.
    pub fn allows_reset(self) -> bool {
        !matches!(self, Self::Upload | Self::SessionEnd)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Upload => "Upload product and model images",
            Self::SizeSelection => "Select output image size",
            Self::ModeSelection => "How would you like to generate images?",
            Self::UserPromptInput => "Paste your prompt here",
            Self::SystemDirection => "Select creative direction",
            Self::PromptPreview => "Creative prompt ready.",
            Self::ShotType => "Select shot type",
            Self::Generating => "Composing Commercial Masterpiece",
            Self::Result => "Generate next image?",
            Self::SessionEnd => "Session completed.",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Coarse progress grouping of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Upload,
    Size,
    Creative,
    Shot,
    Production,
}

impl Phase {
    pub const ALL: [Self; 5] = [
        Self::Upload,
        Self::Size,
        Self::Creative,
        Self::Shot,
        Self::Production,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Size => "Size",
            Self::Creative => "Creative",
            Self::Shot => "Shot",
            Self::Production => "Production",
        }
    }
}

/// Which collaborator call the machine is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pending {
    Analysis,
    Generation,
}

impl Pending {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Generation => "generation",
        }
    }
}

/// Identifies one started backend call. Issued in increasing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket(u64);

impl Ticket {
    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Busy/idle state. While busy, only the matching completion and a reset
/// are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    #[default]
    Idle,
    Busy(Pending),
}
