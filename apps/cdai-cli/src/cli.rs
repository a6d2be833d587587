use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cdai_core::{AspectRatio, CreativeDirection, PromptMode, ShotType, Studio, StudioConfig};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::assets;
use crate::tui::{self, Uploads};

#[derive(Debug, Parser)]
#[command(name = "cdai", about = "Commercial product photo studio")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that talks to the generation backend.
#[derive(Debug, Args)]
pub struct BackendArgs {
    /// Working directory holding `.cdai/config.yaml` and saved assets
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Generation service API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the model that writes system prompts
    #[arg(long)]
    pub analysis_model: Option<String>,

    /// Override the model that renders images
    #[arg(long)]
    pub image_model: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the interactive photo wizard
    Studio {
        #[command(flatten)]
        backend: BackendArgs,

        /// Product image to preload
        #[arg(short, long)]
        product: Option<PathBuf>,

        /// Model image to preload
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Generate a single image without the interactive wizard
    #[command(group(
        clap::ArgGroup::new("source")
            .required(true)
            .args(["prompt", "direction"])
    ))]
    Generate {
        #[command(flatten)]
        backend: BackendArgs,

        /// Product image
        #[arg(short, long)]
        product: PathBuf,

        /// Model image
        #[arg(short, long)]
        model: PathBuf,

        /// Output size: square, portrait, reel, landscape, or a ratio like 4:5
        #[arg(short, long)]
        size: AspectRatio,

        /// Use this prompt as written
        #[arg(long)]
        prompt: Option<String>,

        /// Let the backend write the prompt: safe, bold, lifestyle, experimental
        #[arg(short, long)]
        direction: Option<CreativeDirection>,

        /// Shot type: close-up, interaction, action, hero
        #[arg(long)]
        shot: ShotType,

        /// Output file (defaults to the configured asset directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print a JSON summary instead of plain text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Command name, log directory and whether to also log to stderr.
    pub fn log_context(&self) -> (&'static str, PathBuf, bool) {
        let (command, backend, stderr) = match &self.command {
            Commands::Studio { backend, .. } => ("studio", backend, false),
            Commands::Generate { backend, .. } => ("generate", backend, true),
        };
        (command, backend.config().logs_dir(), stderr)
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Studio {
                backend,
                product,
                model,
            } => {
                let studio = Studio::new(backend.config())?;
                tui::run(studio, Uploads { product, model }).await
            }
            Commands::Generate {
                backend,
                product,
                model,
                size,
                prompt,
                direction,
                shot,
                out,
                json,
            } => {
                let studio = Studio::new(backend.config())?;
                let request = Headless {
                    product,
                    model,
                    size,
                    prompt,
                    direction,
                    shot,
                    out,
                    json,
                };
                request.run(studio).await
            }
        }
    }
}

impl BackendArgs {
    fn config(&self) -> StudioConfig {
        let workdir =
            std::fs::canonicalize(&self.workdir).unwrap_or_else(|_| self.workdir.clone());
        StudioConfig::builder()
            .workdir(workdir)
            .api_key_opt(self.api_key.clone())
            .analysis_model_opt(self.analysis_model.clone())
            .image_model_opt(self.image_model.clone())
            .build()
    }
}

/// One pass through the wizard driven by command-line arguments.
struct Headless {
    product: PathBuf,
    model: PathBuf,
    size: AspectRatio,
    prompt: Option<String>,
    direction: Option<CreativeDirection>,
    shot: ShotType,
    out: Option<PathBuf>,
    json: bool,
}

impl Headless {
    async fn run(self, mut studio: Studio) -> Result<()> {
        let wizard = studio.wizard_mut();
        wizard.set_product_image(Some(assets::load_image(&self.product)?))?;
        wizard.set_model_image(Some(assets::load_image(&self.model)?))?;
        wizard.confirm_upload()?;
        wizard.select_size(self.size)?;

        match (self.prompt, self.direction) {
            (Some(text), _) => {
                wizard.select_mode(PromptMode::User)?;
                wizard.edit_user_prompt(text)?;
                wizard.proceed_with_user_prompt()?;
            }
            (None, Some(direction)) => {
                wizard.select_mode(PromptMode::System)?;
                studio.pick_direction(direction).await?;
                if let Some(message) = studio.last_error() {
                    bail!("{message}");
                }
                if !self.json {
                    let prompt = studio.session().system_prompt.as_deref().unwrap_or_default();
                    println!("Prompt: {prompt}\n");
                }
                studio.wizard_mut().proceed_from_preview()?;
            }
            (None, None) => bail!("either --prompt or --direction is required"),
        }

        studio.generate(self.shot).await?;
        if let Some(message) = studio.last_error() {
            bail!("{message}");
        }
        let image = studio
            .session()
            .generated_image
            .as_ref()
            .context("no image in the session after generation")?;

        let path = match self.out {
            Some(path) => {
                assets::write_image(image, &path)?;
                path
            }
            None => assets::save_image(image, &studio.output_dir())?,
        };
        info!(path = %path.display(), "generation complete");

        if self.json {
            let session = studio.session();
            let summary = serde_json::json!({
                "path": path,
                "selectedSize": session.selected_size,
                "promptMode": session.prompt_mode,
                "creativeDirection": session.creative_direction,
                "systemPrompt": session.system_prompt,
                "shotType": session.shot_type,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Saved {}", path.display());
        }
        Ok(())
    }
}
