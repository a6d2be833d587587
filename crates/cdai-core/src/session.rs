//! Session record and the value types it is made of.
//!
//! [`Session`] is pure data: every field starts absent and is filled in by
//! the wizard's transitions. The enumerations carry the labels shown to the
//! user and sent to the generation backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ── Image handle ─────────────────────────────────────────────

/// Opaque reference to an uploaded or generated image.
///
/// Stored as a `data:<mime>;base64,<payload>` URL. The wizard never looks
/// inside; backends and the presentation layer use the accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(String);

impl ImageHandle {
    /// Wrap an already-encoded base64 payload.
    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self(format!("data:{mime_type};base64,{payload}"))
    }

    /// Wrap a data URL as-is.
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mime type from the data URL header, if present.
    pub fn mime_type(&self) -> Option<&str> {
        let header = self.0.strip_prefix("data:")?.split_once(',')?.0;
        header.split(';').next().filter(|m| !m.is_empty())
    }

    /// Base64 payload after the first comma; the whole string when there is no header.
    pub fn base64_payload(&self) -> &str {
        self.0.split_once(',').map_or(self.0.as_str(), |(_, data)| data)
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mime_type() {
            Some(mime) => write!(f, "{mime} image ({} base64 chars)", self.base64_payload().len()),
            None => write!(f, "image ({} chars)", self.0.len()),
        }
    }
}

// ── Enumerations ─────────────────────────────────────────────

/// Output aspect ratio, chosen once per creative cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "9:16")]
    Reel,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [Self; 4] = [Self::Square, Self::Portrait, Self::Reel, Self::Landscape];

    /// Ratio string understood by the image model.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "4:5",
            Self::Reel => "9:16",
            Self::Landscape => "16:9",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Portrait => "Portrait (4:5)",
            Self::Reel => "Reel / Story (9:16)",
            Self::Landscape => "Landscape (16:9)",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Portrait => "portrait",
            Self::Reel => "reel",
            Self::Landscape => "landscape",
        }
    }
}

/// How the prompt for a generation is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptMode {
    /// The user types the prompt.
    User,
    /// The prompt is written by the backend from the uploaded images.
    System,
}

impl PromptMode {
    pub const ALL: [Self; 2] = [Self::User, Self::System];

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "I will provide my own prompt",
            Self::System => "System generates creative prompts for me",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }
}

/// Creative brief used when the system writes the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreativeDirection {
    #[serde(rename = "Safe / Clean Commercial")]
    SafeClean,
    #[serde(rename = "Bold / High-Impact Ad")]
    BoldImpact,
    #[serde(rename = "Lifestyle / Natural")]
    Lifestyle,
    #[serde(rename = "Experimental / Creative")]
    Experimental,
}

impl CreativeDirection {
    pub const ALL: [Self; 4] = [
        Self::SafeClean,
        Self::BoldImpact,
        Self::Lifestyle,
        Self::Experimental,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::SafeClean => "Safe / Clean Commercial",
            Self::BoldImpact => "Bold / High-Impact Ad",
            Self::Lifestyle => "Lifestyle / Natural",
            Self::Experimental => "Experimental / Creative",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::SafeClean => "safe",
            Self::BoldImpact => "bold",
            Self::Lifestyle => "lifestyle",
            Self::Experimental => "experimental",
        }
    }
}

/// Shot style qualifier appended to the render instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotType {
    #[serde(rename = "Close-up / Product Focus")]
    CloseUp,
    #[serde(rename = "Lifestyle / Model Interaction")]
    LifestyleInteraction,
    #[serde(rename = "Action / Motion Shot")]
    Action,
    #[serde(rename = "Hero / Ad Key Visual")]
    Hero,
}

impl ShotType {
    pub const ALL: [Self; 4] = [
        Self::CloseUp,
        Self::LifestyleInteraction,
        Self::Action,
        Self::Hero,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CloseUp => "Close-up / Product Focus",
            Self::LifestyleInteraction => "Lifestyle / Model Interaction",
            Self::Action => "Action / Motion Shot",
            Self::Hero => "Hero / Ad Key Visual",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::CloseUp => "close-up",
            Self::LifestyleInteraction => "interaction",
            Self::Action => "action",
            Self::Hero => "hero",
        }
    }
}

macro_rules! labelled_enum {
    ($ty:ty, $kind:literal, $($alias:ident)?) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            /// Accepts the label, the short keyword, or any extra alias, ignoring case.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                Self::ALL
                    .into_iter()
                    .find(|v| {
                        needle.eq_ignore_ascii_case(v.label())
                            || needle.eq_ignore_ascii_case(v.keyword())
                            $(|| needle.eq_ignore_ascii_case(v.$alias()))?
                    })
                    .ok_or_else(|| CoreError::UnknownValue {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

labelled_enum!(AspectRatio, "aspect ratio", as_str);
labelled_enum!(PromptMode, "prompt mode",);
labelled_enum!(CreativeDirection, "creative direction",);
labelled_enum!(ShotType, "shot type",);

// ── Session record ───────────────────────────────────────────

/// Everything the wizard has collected in the current session.
///
/// Owned exclusively by the wizard and replaced wholesale on reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub product_image: Option<ImageHandle>,
    pub model_image: Option<ImageHandle>,
    pub selected_size: Option<AspectRatio>,
    pub prompt_mode: Option<PromptMode>,
    /// Kept as typed; trimmed when used.
    pub user_prompt: Option<String>,
    pub system_prompt: Option<String>,
    pub creative_direction: Option<CreativeDirection>,
    pub shot_type: Option<ShotType>,
    /// Most recent successful generation result.
    pub generated_image: Option<ImageHandle>,
}

impl Session {
    /// Both upload slots are filled.
    pub fn has_images(&self) -> bool {
        self.product_image.is_some() && self.model_image.is_some()
    }

    /// Every field is absent, as after a reset.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}
