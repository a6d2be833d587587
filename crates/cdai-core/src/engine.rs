//! Studio engine.
//!
//! The [`Studio`] is the main entry point for cdai-core. It owns the
//! [`Wizard`] for one session together with the generation backend and the
//! prompt templates, and drives the wizard's asynchronous transitions.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use cdai_pm::PromptManager;
use tracing::{debug, info, instrument, warn};

use crate::backend::CreativeBackend;
use crate::config::{ProjectConfig, StudioConfig, load_project_config};
use crate::error::CoreError;
use crate::events::{Call, Completion};
use crate::gemini::{GeminiBackend, GeminiSettings};
use crate::generation;
use crate::session::{CreativeDirection, Session, ShotType};
use crate::step::Step;
use crate::wizard::Wizard;

/// One wizard session bound to a generation backend.
///
/// Synchronous transitions are reached through [`wizard_mut`](Self::wizard_mut).
/// The asynchronous ones come in two forms: `pick_direction`,
/// `regenerate_prompt`, `generate` and `regenerate_same` wait for the backend
/// in place, while the `begin_*` methods return a [`Call`] for the caller to
/// run and hand back through [`complete`](Self::complete).
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use cdai_core::{Studio, StudioConfig};
///
/// # async fn example() -> Result<(), cdai_core::CoreError> {
/// let config = StudioConfig::builder()
///     .workdir(PathBuf::from("."))
///     .build();
///
/// let studio = Studio::new(config)?;
/// # Ok(())
/// # }
/// ```
pub struct Studio {
    /// CLI-level configuration.
    config: StudioConfig,
    /// Project-level configuration from `.cdai/config.yaml`.
    project_config: ProjectConfig,
    wizard: Wizard,
    /// Shared with background tasks running a [`Call`].
    backend: Arc<dyn CreativeBackend>,
    prompts: Arc<PromptManager>,
}

impl fmt::Debug for Studio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Studio")
            .field("config", &self.config)
            .field("project_config", &self.project_config)
            .field("wizard", &self.wizard)
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl Studio {
    /// Create a studio backed by Gemini.
    ///
    /// Loads `.cdai/config.yaml` (if it exists), the prompt templates
    /// (built-in plus any configured override directories), and merges model
    /// settings with CLI overrides taking precedence.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if the config file exists but is invalid.
    /// Returns `CoreError::Prompt` if prompt templates cannot be loaded.
    /// Returns `CoreError::Backend` if the HTTP client cannot be built.
    #[instrument(skip_all)]
    pub fn new(config: StudioConfig) -> Result<Self, CoreError> {
        info!(workdir = %config.workdir().display(), "initializing studio");

        let project_config = load_project_config(&config.config_path())?;
        let prompts = Arc::new(load_prompts(&config, &project_config)?);

        let settings = GeminiSettings::resolve(&config, &project_config.backend);
        debug!(
            analysis_model = %settings.analysis_model,
            image_model = %settings.image_model,
            "resolved backend settings"
        );
        let backend = GeminiBackend::new(settings, Arc::clone(&prompts))
            .map_err(CoreError::Backend)?;

        Ok(Self {
            config,
            project_config,
            wizard: Wizard::new(),
            backend: Arc::new(backend),
            prompts,
        })
    }

    /// Create a studio around any backend, with default project configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Prompt` if the built-in prompt templates cannot be
    /// loaded.
    pub fn with_backend(
        config: StudioConfig,
        backend: Arc<dyn CreativeBackend>,
    ) -> Result<Self, CoreError> {
        let project_config = ProjectConfig::default();
        let prompts = Arc::new(load_prompts(&config, &project_config)?);
        Ok(Self {
            config,
            project_config,
            wizard: Wizard::new(),
            backend,
            prompts,
        })
    }

    // ── Read access ──────────────────────────────────────────

    pub fn current_step(&self) -> Step {
        self.wizard.current_step()
    }

    pub fn session(&self) -> &Session {
        self.wizard.session()
    }

    pub fn is_loading(&self) -> bool {
        self.wizard.is_loading()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.wizard.last_error()
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    /// Mutable access for the synchronous transitions.
    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn project_config(&self) -> &ProjectConfig {
        &self.project_config
    }

    /// Backend handle for running a [`Call`] on another task.
    pub fn backend(&self) -> Arc<dyn CreativeBackend> {
        Arc::clone(&self.backend)
    }

    pub fn prompts(&self) -> &PromptManager {
        &self.prompts
    }

    /// Directory where saved images go, resolved against the working directory.
    pub fn output_dir(&self) -> PathBuf {
        self.config.resolve(&self.project_config.output.dir)
    }

    // ── Split asynchronous transitions ───────────────────────

    /// Start scene analysis for `direction` on the creative direction step.
    pub fn begin_direction(&mut self, direction: CreativeDirection) -> Result<Call, CoreError> {
        let request = self.wizard.begin_direction(direction)?;
        Ok(Call::Analysis {
            ticket: self.wizard.ticket(),
            request,
        })
    }

    /// Start another scene analysis on the prompt preview step.
    pub fn begin_prompt_regeneration(&mut self) -> Result<Call, CoreError> {
        let request = self.wizard.begin_prompt_regeneration()?;
        Ok(Call::Analysis {
            ticket: self.wizard.ticket(),
            request,
        })
    }

    /// Start a generation with `shot_type` on the shot type step.
    ///
    /// The render instruction is built before the wizard changes step, so a
    /// template failure is returned without leaving `ShotType`.
    pub fn begin_generation(&mut self, shot_type: ShotType) -> Result<Call, CoreError> {
        let plan = self.wizard.plan_generation(shot_type)?;
        let request = generation::build_request(&self.prompts, plan)?;
        self.wizard.begin_generation(shot_type)?;
        Ok(Call::Generation {
            ticket: self.wizard.ticket(),
            request,
        })
    }

    /// Repeat the last successful generation with the same shot type.
    pub fn begin_regeneration(&mut self) -> Result<Call, CoreError> {
        let plan = self.wizard.plan_regeneration()?;
        let request = generation::build_request(&self.prompts, plan)?;
        self.wizard.begin_regeneration()?;
        Ok(Call::Generation {
            ticket: self.wizard.ticket(),
            request,
        })
    }

    /// Apply the outcome of a call started with one of the `begin_*` methods.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::StaleCompletion` for a call abandoned by a reset
    /// when a newer call is in flight, and `CoreError::NotAwaiting` when
    /// nothing is in flight. The session is left untouched in both cases.
    pub fn complete(&mut self, completion: Completion) -> Result<(), CoreError> {
        let ticket = completion.ticket();
        if self.wizard.is_loading() && ticket != self.wizard.ticket() {
            warn!(%ticket, current = %self.wizard.ticket(), "stale completion");
            return Err(CoreError::StaleCompletion(ticket));
        }
        match completion {
            Completion::Analysis { outcome, .. } => self.wizard.finish_analysis(outcome),
            Completion::Generation { outcome, .. } => self.wizard.finish_generation(outcome),
        }
    }

    // ── Awaiting asynchronous transitions ────────────────────

    /// Pick a creative direction and wait for the system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transition is rejected. A failed
    /// analysis is reported through [`last_error`](Self::last_error).
    #[instrument(skip(self))]
    pub async fn pick_direction(&mut self, direction: CreativeDirection) -> Result<(), CoreError> {
        let call = self.begin_direction(direction)?;
        self.drive(call).await
    }

    /// Rewrite the system prompt with the current direction.
    #[instrument(skip(self))]
    pub async fn regenerate_prompt(&mut self) -> Result<(), CoreError> {
        let call = self.begin_prompt_regeneration()?;
        self.drive(call).await
    }

    /// Pick a shot type and wait for the image. Always ends on `Result`
    /// unless the transition is rejected.
    #[instrument(skip(self))]
    pub async fn generate(&mut self, shot_type: ShotType) -> Result<(), CoreError> {
        let call = self.begin_generation(shot_type)?;
        self.drive(call).await
    }

    /// Generate again with the same prompt and shot type.
    #[instrument(skip(self))]
    pub async fn regenerate_same(&mut self) -> Result<(), CoreError> {
        let call = self.begin_regeneration()?;
        self.drive(call).await
    }

    async fn drive(&mut self, call: Call) -> Result<(), CoreError> {
        let completion = call.execute(self.backend.as_ref()).await;
        self.complete(completion)
    }
}

fn load_prompts(
    config: &StudioConfig,
    project_config: &ProjectConfig,
) -> Result<PromptManager, CoreError> {
    let mut pm = PromptManager::new()?;
    for dir in &project_config.prompts.include {
        let resolved = config.resolve(dir);
        if resolved.is_dir() {
            pm.load_dir(&resolved)?;
            debug!(dir = %resolved.display(), "loaded custom prompt directory");
        }
    }
    Ok(pm)
}
