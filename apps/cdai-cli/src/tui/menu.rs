//! Menu choices offered on each wizard step.

use std::borrow::Cow;

use cdai_core::{AspectRatio, CreativeDirection, PromptMode, ShotType, Step};

/// A menu entry and the transition it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Size(AspectRatio),
    Mode(PromptMode),
    Direction(CreativeDirection),
    RegeneratePrompt,
    CancelPreview,
    UsePrompt,
    Shot(ShotType),
    RegenerateSame,
    NewShotType,
    NewCreativePrompt,
    EndSession,
    Retry,
    Restart,
    Quit,
}

impl Action {
    pub fn label(self) -> Cow<'static, str> {
        match self {
            Self::Size(size) => Cow::Owned(format!("{:<20} {}", size.label(), size.as_str())),
            Self::Mode(mode) => Cow::Borrowed(mode.label()),
            Self::Direction(direction) => Cow::Borrowed(direction.label()),
            Self::RegeneratePrompt => Cow::Borrowed("Regenerate Prompt"),
            Self::CancelPreview => Cow::Borrowed("Cancel"),
            Self::UsePrompt => Cow::Borrowed("Next: Shot Type Selection"),
            Self::Shot(shot) => Cow::Borrowed(shot.label()),
            Self::RegenerateSame => Cow::Borrowed("Yes - Same Prompt"),
            Self::NewShotType => Cow::Borrowed("Yes - New Shot Type"),
            Self::NewCreativePrompt => Cow::Borrowed("Yes - New Creative Prompt"),
            Self::EndSession => Cow::Borrowed("No - End Session"),
            Self::Retry => Cow::Borrowed("Retry Shot Selection"),
            Self::Restart => Cow::Borrowed("Start New Project"),
            Self::Quit => Cow::Borrowed("Quit"),
        }
    }
}

/// Entries for `step`. `failed` selects the failure menu on `Result`.
pub fn actions(step: Step, failed: bool) -> Vec<Action> {
    match step {
        Step::SizeSelection => AspectRatio::ALL.into_iter().map(Action::Size).collect(),
        Step::ModeSelection => PromptMode::ALL.into_iter().map(Action::Mode).collect(),
        Step::SystemDirection => CreativeDirection::ALL
            .into_iter()
            .map(Action::Direction)
            .collect(),
        Step::PromptPreview => vec![
            Action::UsePrompt,
            Action::RegeneratePrompt,
            Action::CancelPreview,
        ],
        Step::ShotType => ShotType::ALL.into_iter().map(Action::Shot).collect(),
        Step::Result if failed => vec![Action::Retry],
        Step::Result => vec![
            Action::RegenerateSame,
            Action::NewShotType,
            Action::NewCreativePrompt,
            Action::EndSession,
        ],
        Step::SessionEnd => vec![Action::Restart, Action::Quit],
        Step::Upload | Step::UserPromptInput | Step::Generating => Vec::new(),
    }
}
