//! TUI application state and key handling.

use std::path::{Path, PathBuf};

use cdai_core::{Call, Completion, CoreError, Step, Studio};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::menu::{self, Action};
use crate::assets;

/// Images given on the command line, loaded before the first frame.
#[derive(Debug, Default)]
pub struct Uploads {
    pub product: Option<PathBuf>,
    pub model: Option<PathBuf>,
}

/// Which path field has focus on the upload step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadField {
    #[default]
    Product,
    Model,
}

impl UploadField {
    fn other(self) -> Self {
        match self {
            Self::Product => Self::Model,
            Self::Model => Self::Product,
        }
    }
}

/// A one-line message under the step body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Main TUI application state.
pub struct App {
    studio: Studio,
    runtime: Handle,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    focus: UploadField,
    product_path: String,
    model_path: String,
    /// Highlighted menu row.
    selected: usize,
    /// Step the menu selection belongs to.
    shown_step: Step,
    notice: Option<Notice>,
    ticks: usize,
    running: bool,
}

impl App {
    pub fn new(studio: Studio, runtime: Handle) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let shown_step = studio.current_step();
        Self {
            studio,
            runtime,
            completions_tx,
            completions_rx,
            focus: UploadField::default(),
            product_path: String::new(),
            model_path: String::new(),
            selected: 0,
            shown_step,
            notice: None,
            ticks: 0,
            running: true,
        }
    }

    // ── State read by the view ───────────────────────────────

    pub fn studio(&self) -> &Studio {
        &self.studio
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn focus(&self) -> UploadField {
        self.focus
    }

    pub fn path_input(&self, field: UploadField) -> &str {
        match field {
            UploadField::Product => &self.product_path,
            UploadField::Model => &self.model_path,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn menu(&self) -> Vec<Action> {
        menu::actions(
            self.studio.current_step(),
            self.studio.wizard().is_failed_result(),
        )
    }

    // ── Updates ──────────────────────────────────────────────

    /// Load images passed on the command line.
    pub fn preload(&mut self, uploads: Uploads) {
        if let Some(path) = uploads.product {
            self.load(UploadField::Product, &path);
        }
        if let Some(path) = uploads.model {
            self.load(UploadField::Model, &path);
        }
    }

    /// Advance the animation counter and apply finished backend calls.
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        while let Ok(completion) = self.completions_rx.try_recv() {
            if let Err(e) = self.studio.complete(completion) {
                warn!(error = %e, "dropped completion");
            }
        }
        self.sync_step();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.running = false;
                return;
            }
            KeyCode::Char('r') if ctrl => {
                self.reset();
                return;
            }
            _ => {}
        }
        if self.studio.is_loading() {
            return;
        }

        match self.studio.current_step() {
            Step::Upload => self.handle_upload_key(key, ctrl),
            Step::UserPromptInput => self.handle_prompt_key(key, ctrl),
            Step::Generating => {}
            step => self.handle_menu_key(step, key),
        }
        self.sync_step();
    }

    fn handle_upload_key(&mut self, key: KeyEvent, ctrl: bool) {
        let focus = self.focus;
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = focus.other();
            }
            KeyCode::Backspace => {
                self.path_buffer(focus).pop();
            }
            KeyCode::Enter => {
                let input = self.path_input(focus).trim().to_owned();
                if input.is_empty() {
                    let result = self.studio.wizard_mut().confirm_upload();
                    self.report(result);
                } else {
                    self.load(focus, Path::new(&input));
                }
            }
            KeyCode::Char('q') if self.path_input(focus).is_empty() => self.running = false,
            KeyCode::Char(c) if !ctrl => self.path_buffer(focus).push(c),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, ctrl: bool) {
        let mut text = self.studio.session().user_prompt.clone().unwrap_or_default();
        let result = match key.code {
            KeyCode::Esc => self.studio.wizard_mut().cancel_user_prompt(),
            KeyCode::Enter => self.studio.wizard_mut().proceed_with_user_prompt(),
            KeyCode::Backspace => {
                text.pop();
                self.studio.wizard_mut().edit_user_prompt(text)
            }
            KeyCode::Char(c) if !ctrl => {
                text.push(c);
                self.studio.wizard_mut().edit_user_prompt(text)
            }
            _ => Ok(()),
        };
        self.report(result);
    }

    fn handle_menu_key(&mut self, step: Step, key: KeyEvent) {
        let menu = self.menu();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') if !menu.is_empty() => {
                self.selected = self.selected.checked_sub(1).unwrap_or(menu.len() - 1);
            }
            KeyCode::Down | KeyCode::Char('j') if !menu.is_empty() => {
                self.selected = (self.selected + 1) % menu.len();
            }
            KeyCode::Enter => {
                if let Some(action) = menu.get(self.selected).copied() {
                    self.apply(action);
                }
            }
            KeyCode::Char('s') if step == Step::Result => self.save(),
            KeyCode::Char('q') | KeyCode::Esc if step == Step::SessionEnd => self.running = false,
            _ => {}
        }
    }

    /// Run the transition behind a menu entry.
    pub fn apply(&mut self, action: Action) {
        let result = match action {
            Action::Size(size) => self.studio.wizard_mut().select_size(size),
            Action::Mode(mode) => self.studio.wizard_mut().select_mode(mode),
            Action::Direction(direction) => {
                self.studio.begin_direction(direction).map(|call| self.spawn(call))
            }
            Action::RegeneratePrompt => {
                self.studio.begin_prompt_regeneration().map(|call| self.spawn(call))
            }
            Action::CancelPreview => self.studio.wizard_mut().cancel_preview(),
            Action::UsePrompt => self.studio.wizard_mut().proceed_from_preview(),
            Action::Shot(shot) => self.studio.begin_generation(shot).map(|call| self.spawn(call)),
            Action::RegenerateSame => self.studio.begin_regeneration().map(|call| self.spawn(call)),
            Action::NewShotType => self.studio.wizard_mut().new_shot_type(),
            Action::NewCreativePrompt => self.studio.wizard_mut().new_creative_prompt(),
            Action::EndSession => self.studio.wizard_mut().end_session(),
            Action::Retry => self.studio.wizard_mut().retry(),
            Action::Restart => self.studio.wizard_mut().restart(),
            Action::Quit => {
                self.running = false;
                Ok(())
            }
        };
        self.report(result);
    }

    fn spawn(&self, call: Call) {
        debug!(ticket = %call.ticket(), "spawning backend call");
        let backend = self.studio.backend();
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let completion = call.execute(backend.as_ref()).await;
            // The receiver is gone only when the app has quit.
            let _ = tx.send(completion);
        });
    }

    fn reset(&mut self) {
        if !self.studio.current_step().allows_reset() {
            return;
        }
        let result = self.studio.wizard_mut().reset();
        if result.is_ok() {
            self.product_path.clear();
            self.model_path.clear();
            self.focus = UploadField::default();
        }
        self.report(result);
        self.sync_step();
    }

    fn save(&mut self) {
        let Some(image) = self.studio.session().generated_image.as_ref() else {
            return;
        };
        self.notice = Some(match assets::save_image(image, &self.studio.output_dir()) {
            Ok(path) => Notice {
                text: format!("Saved {}", path.display()),
                is_error: false,
            },
            Err(e) => {
                warn!(error = %e, "failed to save image");
                Notice {
                    text: format!("{e:#}"),
                    is_error: true,
                }
            }
        });
    }

    fn load(&mut self, field: UploadField, path: &Path) {
        let result = assets::load_image(path).and_then(|image| {
            let wizard = self.studio.wizard_mut();
            let set = match field {
                UploadField::Product => wizard.set_product_image(Some(image)),
                UploadField::Model => wizard.set_model_image(Some(image)),
            };
            Ok(set?)
        });
        match result {
            Ok(()) => {
                self.path_buffer(field).clear();
                self.focus = field.other();
                self.notice = None;
            }
            Err(e) => {
                self.notice = Some(Notice {
                    text: format!("{e:#}"),
                    is_error: true,
                });
            }
        }
    }

    fn path_buffer(&mut self, field: UploadField) -> &mut String {
        match field {
            UploadField::Product => &mut self.product_path,
            UploadField::Model => &mut self.model_path,
        }
    }

    /// Show a rejected transition to the user.
    fn report(&mut self, result: Result<(), CoreError>) {
        if let Err(e) = result {
            info!(step = %self.studio.current_step(), error = %e, "transition rejected");
            self.notice = Some(Notice {
                text: e.to_string(),
                is_error: true,
            });
        }
    }

    /// Reset the menu selection and notice when the step changes.
    fn sync_step(&mut self) {
        let step = self.studio.current_step();
        if step != self.shown_step {
            self.shown_step = step;
            self.selected = 0;
            self.notice = None;
        }
    }
}
