//! Step state machine.
//!
//! [`Wizard`] owns the [`Session`] record and the current [`Step`]. Every
//! change goes through one method per trigger; a rejected trigger returns an
//! error and leaves the wizard untouched.
//!
//! Collaborator calls are split in two halves. `begin_*` checks the guard,
//! applies the entry effects and marks the wizard busy; `finish_*` applies
//! the outcome and marks it idle again. Only `reset` is accepted while busy,
//! so at most one call is in flight per session. Each started call gets a new
//! [`Ticket`]; a reset abandons the call without cancelling it.
//!
//! ```text
//! Upload ─► SizeSelection ─► ModeSelection ─┬─► UserPromptInput ───────────────┬─► ShotType ─► Generating ─► Result ─► SessionEnd
//!                                           └─► SystemDirection ─► PromptPreview ┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::SceneRequest;
use crate::error::{ANALYSIS_FAILED_MESSAGE, CoreError, GENERATION_FAILED_MESSAGE};
use crate::generation::GenerationPlan;
use crate::prompt::PromptStrategy;
use crate::session::{
    AspectRatio, CreativeDirection, ImageHandle, PromptMode, Session, ShotType,
};
use crate::step::{Activity, Pending, Step, Ticket};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wizard {
    step: Step,
    session: Session,
    activity: Activity,
    /// Ticket of the most recently started call.
    ticket: Ticket,
    error: Option<String>,
}

impl Wizard {
    /// A blank session on the upload step.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    /// Read-only view of the session record.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Ticket of the most recently started call. Only meaningful while busy.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.activity, Activity::Busy(_))
    }

    /// User-facing message of the last failed call, if not yet cleared.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The result step is showing a generation failure.
    pub fn is_failed_result(&self) -> bool {
        self.step == Step::Result && self.error.is_some()
    }

    // ── Upload ───────────────────────────────────────────────

    pub fn set_product_image(&mut self, image: Option<ImageHandle>) -> Result<(), CoreError> {
        self.expect_step(Step::Upload, "upload a product image")?;
        self.session.product_image = image;
        Ok(())
    }

    pub fn set_model_image(&mut self, image: Option<ImageHandle>) -> Result<(), CoreError> {
        self.expect_step(Step::Upload, "upload a model image")?;
        self.session.model_image = image;
        Ok(())
    }

    /// Leave the upload step once both images are present.
    pub fn confirm_upload(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::Upload, "confirm upload")?;
        if !self.session.has_images() {
            return Err(CoreError::MissingImages);
        }
        self.enter(Step::SizeSelection, "confirm upload");
        Ok(())
    }

    // ── Size and mode ────────────────────────────────────────

    /// Fix the aspect ratio for every generation until reset.
    pub fn select_size(&mut self, size: AspectRatio) -> Result<(), CoreError> {
        self.expect_step(Step::SizeSelection, "select a size")?;
        self.session.selected_size = Some(size);
        self.enter(Step::ModeSelection, "select size");
        Ok(())
    }

    pub fn select_mode(&mut self, mode: PromptMode) -> Result<(), CoreError> {
        self.expect_step(Step::ModeSelection, "select a prompt mode")?;
        self.session.prompt_mode = Some(mode);
        let next = match mode {
            PromptMode::User => Step::UserPromptInput,
            PromptMode::System => Step::SystemDirection,
        };
        self.enter(next, "select mode");
        Ok(())
    }

    // ── User-authored prompt ─────────────────────────────────

    /// Replace the prompt text as typed.
    pub fn edit_user_prompt(&mut self, text: impl Into<String>) -> Result<(), CoreError> {
        self.expect_step(Step::UserPromptInput, "edit the prompt")?;
        self.session.user_prompt = Some(text.into());
        Ok(())
    }

    pub fn proceed_with_user_prompt(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::UserPromptInput, "proceed to shot type")?;
        if PromptStrategy::UserAuthored
            .active_prompt(&self.session)
            .is_none()
        {
            return Err(CoreError::EmptyPrompt);
        }
        self.enter(Step::ShotType, "proceed with user prompt");
        Ok(())
    }

    pub fn cancel_user_prompt(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::UserPromptInput, "cancel")?;
        self.enter(Step::ModeSelection, "cancel user prompt");
        Ok(())
    }

    // ── System-generated prompt ──────────────────────────────

    /// Record the direction and start scene analysis.
    ///
    /// The wizard stays on `SystemDirection` until [`finish_analysis`](Self::finish_analysis).
    pub fn begin_direction(
        &mut self,
        direction: CreativeDirection,
    ) -> Result<SceneRequest, CoreError> {
        self.expect_step(Step::SystemDirection, "pick a creative direction")?;
        let request = self.scene_request(direction)?;
        self.session.creative_direction = Some(direction);
        self.start(Pending::Analysis);
        Ok(request)
    }

    /// Re-run scene analysis with the current direction.
    pub fn begin_prompt_regeneration(&mut self) -> Result<SceneRequest, CoreError> {
        self.expect_step(Step::PromptPreview, "regenerate the prompt")?;
        let direction = self
            .session
            .creative_direction
            .ok_or(CoreError::IncompleteSession("a creative direction"))?;
        let request = self.scene_request(direction)?;
        self.start(Pending::Analysis);
        Ok(request)
    }

    /// Apply the outcome of scene analysis.
    ///
    /// Success overwrites `system_prompt` and shows the preview. Failure keeps
    /// the current step and prompt and records the analysis error message.
    pub fn finish_analysis(&mut self, outcome: Result<String, CoreError>) -> Result<(), CoreError> {
        self.expect_pending(Pending::Analysis)?;
        self.activity = Activity::Idle;

        match outcome {
            Ok(text) if !text.trim().is_empty() => {
                self.session.system_prompt = Some(text);
                if self.step == Step::SystemDirection {
                    self.enter(Step::PromptPreview, "prompt ready");
                } else {
                    debug!(step = %self.step, "system prompt regenerated");
                }
            }
            Ok(_) => {
                warn!(step = %self.step, "scene analysis produced blank text");
                self.error = Some(ANALYSIS_FAILED_MESSAGE.to_owned());
            }
            Err(e) => {
                warn!(step = %self.step, error = %e, "scene analysis failed");
                self.error = Some(ANALYSIS_FAILED_MESSAGE.to_owned());
            }
        }
        Ok(())
    }

    pub fn cancel_preview(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::PromptPreview, "cancel")?;
        self.enter(Step::ModeSelection, "cancel preview");
        Ok(())
    }

    pub fn proceed_from_preview(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::PromptPreview, "proceed to shot type")?;
        self.enter(Step::ShotType, "proceed from preview");
        Ok(())
    }

    // ── Generation ───────────────────────────────────────────

    /// Check that a generation with `shot_type` could start, without changing anything.
    pub fn plan_generation(&self, shot_type: ShotType) -> Result<GenerationPlan, CoreError> {
        self.expect_step(Step::ShotType, "generate")?;
        self.generation_plan(shot_type)
    }

    /// Record the shot type and enter `Generating`.
    pub fn begin_generation(&mut self, shot_type: ShotType) -> Result<GenerationPlan, CoreError> {
        let plan = self.plan_generation(shot_type)?;
        self.start_generation(shot_type);
        Ok(plan)
    }

    /// Check that the last generation could be repeated with the same shot type.
    pub fn plan_regeneration(&self) -> Result<GenerationPlan, CoreError> {
        self.expect_successful_result("regenerate")?;
        let shot_type = self
            .session
            .shot_type
            .ok_or(CoreError::IncompleteSession("a shot type"))?;
        self.generation_plan(shot_type)
    }

    /// Repeat the last generation with an unchanged shot type.
    pub fn begin_regeneration(&mut self) -> Result<GenerationPlan, CoreError> {
        let plan = self.plan_regeneration()?;
        self.start_generation(plan.shot_type);
        Ok(plan)
    }

    /// Apply the outcome of a generation. Always lands on `Result`.
    pub fn finish_generation(
        &mut self,
        outcome: Result<ImageHandle, CoreError>,
    ) -> Result<(), CoreError> {
        self.expect_pending(Pending::Generation)?;
        self.activity = Activity::Idle;

        match outcome {
            Ok(image) if !image.base64_payload().is_empty() => {
                self.session.generated_image = Some(image);
                self.error = None;
            }
            Ok(_) => {
                warn!("generation returned an empty image");
                self.error = Some(GENERATION_FAILED_MESSAGE.to_owned());
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                self.error = Some(GENERATION_FAILED_MESSAGE.to_owned());
            }
        }
        self.enter(Step::Result, "generation finished");
        Ok(())
    }

    // ── Result ───────────────────────────────────────────────

    pub fn new_shot_type(&mut self) -> Result<(), CoreError> {
        self.expect_successful_result("choose a new shot type")?;
        self.enter(Step::ShotType, "new shot type");
        Ok(())
    }

    pub fn new_creative_prompt(&mut self) -> Result<(), CoreError> {
        self.expect_successful_result("choose a new creative prompt")?;
        self.enter(Step::ModeSelection, "new creative prompt");
        Ok(())
    }

    /// Go back to shot selection after a failed generation.
    pub fn retry(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::Result, "retry")?;
        if self.error.is_none() {
            return Err(CoreError::InvalidTransition {
                step: self.step,
                action: "retry",
            });
        }
        self.enter(Step::ShotType, "retry");
        Ok(())
    }

    pub fn end_session(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::Result, "end the session")?;
        self.enter(Step::SessionEnd, "end session");
        Ok(())
    }

    // ── Restart and reset ────────────────────────────────────

    /// Start a new project from the session-end screen.
    pub fn restart(&mut self) -> Result<(), CoreError> {
        self.expect_step(Step::SessionEnd, "restart")?;
        self.wipe();
        self.enter(Step::Upload, "restart");
        Ok(())
    }

    /// Discard the session from any step except `Upload` and `SessionEnd`.
    ///
    /// Accepted while busy. The in-flight call keeps running and its
    /// completion is rejected when it arrives.
    pub fn reset(&mut self) -> Result<(), CoreError> {
        if !self.step.allows_reset() {
            return Err(CoreError::InvalidTransition {
                step: self.step,
                action: "reset",
            });
        }
        if let Activity::Busy(pending) = self.activity {
            info!(pending = pending.as_str(), ticket = %self.ticket, "abandoning in-flight call");
            self.activity = Activity::Idle;
        }
        self.wipe();
        self.enter(Step::Upload, "reset");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────

    fn expect_idle(&self) -> Result<(), CoreError> {
        match self.activity {
            Activity::Idle => Ok(()),
            Activity::Busy(_) => Err(CoreError::Busy),
        }
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<(), CoreError> {
        self.expect_idle()?;
        if self.step != expected {
            return Err(CoreError::InvalidTransition {
                step: self.step,
                action,
            });
        }
        Ok(())
    }

    fn expect_successful_result(&self, action: &'static str) -> Result<(), CoreError> {
        self.expect_step(Step::Result, action)?;
        if self.error.is_some() || self.session.generated_image.is_none() {
            return Err(CoreError::InvalidTransition {
                step: self.step,
                action,
            });
        }
        Ok(())
    }

    fn expect_pending(&self, pending: Pending) -> Result<(), CoreError> {
        if self.activity != Activity::Busy(pending) {
            return Err(CoreError::NotAwaiting(pending.as_str()));
        }
        Ok(())
    }

    fn scene_request(&self, direction: CreativeDirection) -> Result<SceneRequest, CoreError> {
        let (Some(product_image), Some(model_image)) = (
            self.session.product_image.clone(),
            self.session.model_image.clone(),
        ) else {
            return Err(CoreError::MissingImages);
        };
        Ok(SceneRequest {
            product_image,
            model_image,
            direction,
        })
    }

    fn generation_plan(&self, shot_type: ShotType) -> Result<GenerationPlan, CoreError> {
        let aspect_ratio = self
            .session
            .selected_size
            .ok_or(CoreError::IncompleteSession("an aspect ratio"))?;
        let mode = self
            .session
            .prompt_mode
            .ok_or(CoreError::IncompleteSession("a prompt mode"))?;
        let prompt = PromptStrategy::from(mode)
            .active_prompt(&self.session)
            .ok_or(CoreError::EmptyPrompt)?;

        Ok(GenerationPlan {
            prompt: prompt.to_owned(),
            aspect_ratio,
            shot_type,
            product_image: self.session.product_image.clone(),
            model_image: self.session.model_image.clone(),
        })
    }

    fn start(&mut self, pending: Pending) {
        self.error = None;
        self.activity = Activity::Busy(pending);
        self.ticket = self.ticket.next();
        debug!(step = %self.step, pending = pending.as_str(), ticket = %self.ticket, "awaiting backend");
    }

    fn start_generation(&mut self, shot_type: ShotType) {
        self.session.shot_type = Some(shot_type);
        self.session.generated_image = None;
        self.start(Pending::Generation);
        self.enter(Step::Generating, "generate");
    }

    fn wipe(&mut self) {
        self.session = Session::default();
        self.error = None;
    }

    fn enter(&mut self, next: Step, action: &'static str) {
        info!(from = %self.step, to = %next, action, "step transition");
        self.step = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::testing::image;

    fn uploaded() -> Wizard {
        let mut wizard = Wizard::new();
        wizard
            .set_product_image(Some(image("P1")))
            .expect("should set product");
        wizard
            .set_model_image(Some(image("M1")))
            .expect("should set model");
        wizard.confirm_upload().expect("should confirm");
        wizard
    }

    fn at_mode_selection() -> Wizard {
        let mut wizard = uploaded();
        wizard
            .select_size(AspectRatio::Portrait)
            .expect("should select size");
        wizard
    }

    fn at_shot_type_with_user_prompt() -> Wizard {
        let mut wizard = at_mode_selection();
        wizard.select_mode(PromptMode::User).expect("should select mode");
        wizard
            .edit_user_prompt("a watch on a wrist")
            .expect("should edit");
        wizard.proceed_with_user_prompt().expect("should proceed");
        wizard
    }

    fn at_preview() -> Wizard {
        let mut wizard = at_mode_selection();
        wizard
            .select_mode(PromptMode::System)
            .expect("should select mode");
        wizard
            .begin_direction(CreativeDirection::Lifestyle)
            .expect("should begin");
        wizard
            .finish_analysis(Ok("a lifestyle shot...".to_owned()))
            .expect("should finish");
        wizard
    }

    fn at_successful_result() -> Wizard {
        let mut wizard = at_shot_type_with_user_prompt();
        wizard
            .begin_generation(ShotType::Hero)
            .expect("should begin");
        wizard
            .finish_generation(Ok(image("H1")))
            .expect("should finish");
        wizard
    }

    fn at_failed_result() -> Wizard {
        let mut wizard = at_shot_type_with_user_prompt();
        wizard
            .begin_generation(ShotType::Hero)
            .expect("should begin");
        wizard
            .finish_generation(Err(CoreError::Generation(BackendError::NoImage)))
            .expect("should finish");
        wizard
    }

    #[test]
    fn test_should_start_blank_on_upload() {
        let wizard = Wizard::new();
        assert_eq!(wizard.current_step(), Step::Upload);
        assert!(wizard.session().is_blank());
        assert!(!wizard.is_loading());
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn test_should_confirm_upload_only_with_both_images() {
        let cases = [
            (None, None, false),
            (Some(image("P1")), None, false),
            (None, Some(image("M1")), false),
            (Some(image("P1")), Some(image("M1")), true),
        ];

        for (product, model, accepted) in cases {
            let mut wizard = Wizard::new();
            wizard.set_product_image(product).expect("should set product");
            wizard.set_model_image(model).expect("should set model");

            let result = wizard.confirm_upload();
            assert_eq!(result.is_ok(), accepted);
            if accepted {
                assert_eq!(wizard.current_step(), Step::SizeSelection);
            } else {
                assert!(matches!(result, Err(CoreError::MissingImages)));
                assert_eq!(wizard.current_step(), Step::Upload);
            }
        }
    }

    #[test]
    fn test_should_allow_reupload_before_leaving_upload() {
        let mut wizard = Wizard::new();
        wizard.set_product_image(Some(image("P1"))).expect("should set");
        wizard.set_product_image(Some(image("P2"))).expect("should overwrite");
        assert_eq!(wizard.session().product_image, Some(image("P2")));

        let mut wizard = uploaded();
        let result = wizard.set_product_image(Some(image("P3")));
        assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
        assert_eq!(wizard.session().product_image, Some(image("P1")));
    }

    #[test]
    fn test_should_keep_selected_size_until_reset() {
        let mut wizard = at_mode_selection();
        assert_eq!(wizard.current_step(), Step::ModeSelection);
        assert_eq!(wizard.session().selected_size, Some(AspectRatio::Portrait));

        let result = wizard.select_size(AspectRatio::Landscape);
        assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));

        wizard.select_mode(PromptMode::User).expect("should select");
        wizard.edit_user_prompt("prompt").expect("should edit");
        wizard.proceed_with_user_prompt().expect("should proceed");
        let plan = wizard
            .begin_generation(ShotType::CloseUp)
            .expect("should begin");
        assert_eq!(plan.aspect_ratio, AspectRatio::Portrait);
        wizard.finish_generation(Ok(image("H1"))).expect("should finish");
        wizard.new_creative_prompt().expect("should go back");
        assert_eq!(wizard.session().selected_size, Some(AspectRatio::Portrait));
    }

    #[test]
    fn test_should_route_mode_selection() {
        let mut wizard = at_mode_selection();
        wizard.select_mode(PromptMode::User).expect("should select");
        assert_eq!(wizard.current_step(), Step::UserPromptInput);
        assert_eq!(wizard.session().prompt_mode, Some(PromptMode::User));

        wizard.cancel_user_prompt().expect("should cancel");
        assert_eq!(wizard.current_step(), Step::ModeSelection);

        wizard.select_mode(PromptMode::System).expect("should select");
        assert_eq!(wizard.current_step(), Step::SystemDirection);
        assert_eq!(wizard.session().prompt_mode, Some(PromptMode::System));
    }

    #[test]
    fn test_should_reject_blank_user_prompt() {
        let mut wizard = at_mode_selection();
        wizard.select_mode(PromptMode::User).expect("should select");

        assert!(matches!(
            wizard.proceed_with_user_prompt(),
            Err(CoreError::EmptyPrompt)
        ));
        for blank in ["", "   ", "\n\t "] {
            wizard.edit_user_prompt(blank).expect("should edit");
            assert!(matches!(
                wizard.proceed_with_user_prompt(),
                Err(CoreError::EmptyPrompt)
            ));
            assert_eq!(wizard.current_step(), Step::UserPromptInput);
        }

        wizard.edit_user_prompt("  neon street  ").expect("should edit");
        wizard.proceed_with_user_prompt().expect("should proceed");
        assert_eq!(wizard.current_step(), Step::ShotType);
        assert_eq!(
            wizard.session().user_prompt.as_deref(),
            Some("  neon street  ")
        );
    }

    #[test]
    fn test_should_preview_system_prompt_after_analysis() {
        let mut wizard = at_mode_selection();
        wizard.select_mode(PromptMode::System).expect("should select");

        let request = wizard
            .begin_direction(CreativeDirection::Lifestyle)
            .expect("should begin");
        assert_eq!(request.product_image, image("P1"));
        assert_eq!(request.model_image, image("M1"));
        assert_eq!(request.direction, CreativeDirection::Lifestyle);
        assert!(wizard.is_loading());
        assert_eq!(wizard.current_step(), Step::SystemDirection);
        assert_eq!(
            wizard.session().creative_direction,
            Some(CreativeDirection::Lifestyle)
        );

        wizard
            .finish_analysis(Ok("a lifestyle shot...".to_owned()))
            .expect("should finish");
        assert!(!wizard.is_loading());
        assert_eq!(wizard.current_step(), Step::PromptPreview);
        assert_eq!(
            wizard.session().system_prompt.as_deref(),
            Some("a lifestyle shot...")
        );
    }

    #[test]
    fn test_should_stay_on_direction_when_analysis_fails() {
        let mut wizard = at_mode_selection();
        wizard.select_mode(PromptMode::System).expect("should select");
        wizard
            .begin_direction(CreativeDirection::BoldImpact)
            .expect("should begin");

        wizard
            .finish_analysis(Err(CoreError::Analysis(BackendError::EmptyText)))
            .expect("should finish");
        assert_eq!(wizard.current_step(), Step::SystemDirection);
        assert_eq!(wizard.last_error(), Some(ANALYSIS_FAILED_MESSAGE));
        assert!(wizard.session().system_prompt.is_none());
        assert!(!wizard.is_loading());

        // picking again clears the error
        wizard
            .begin_direction(CreativeDirection::SafeClean)
            .expect("should begin again");
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn test_should_overwrite_only_system_prompt_on_regeneration() {
        // Come back from a finished user-mode image so every field is set.
        let mut wizard = at_successful_result();
        wizard.new_creative_prompt().expect("should go back");
        wizard
            .select_mode(PromptMode::System)
            .expect("should select mode");
        wizard
            .begin_direction(CreativeDirection::Lifestyle)
            .expect("should begin");
        wizard
            .finish_analysis(Ok("a lifestyle shot...".to_owned()))
            .expect("should finish");
        let before = wizard.session().clone();
        assert_eq!(before.user_prompt.as_deref(), Some("a watch on a wrist"));
        assert_eq!(before.shot_type, Some(ShotType::Hero));
        assert_eq!(before.generated_image, Some(image("H1")));

        let request = wizard
            .begin_prompt_regeneration()
            .expect("should begin regeneration");
        assert_eq!(request.direction, CreativeDirection::Lifestyle);
        wizard
            .finish_analysis(Ok("a second take".to_owned()))
            .expect("should finish");

        let after = wizard.session();
        assert_eq!(wizard.current_step(), Step::PromptPreview);
        assert_eq!(after.system_prompt.as_deref(), Some("a second take"));
        assert_eq!(after.user_prompt, before.user_prompt);
        assert_eq!(after.selected_size, before.selected_size);
        assert_eq!(after.shot_type, before.shot_type);
        assert_eq!(after.generated_image, before.generated_image);
        assert_eq!(after.creative_direction, before.creative_direction);
        assert_eq!(after.prompt_mode, Some(PromptMode::System));
    }

    #[test]
    fn test_should_keep_previous_prompt_when_regeneration_fails() {
        let mut wizard = at_preview();
        wizard
            .begin_prompt_regeneration()
            .expect("should begin regeneration");
        wizard
            .finish_analysis(Err(CoreError::Analysis(BackendError::NoImage)))
            .expect("should finish");

        assert_eq!(wizard.current_step(), Step::PromptPreview);
        assert_eq!(
            wizard.session().system_prompt.as_deref(),
            Some("a lifestyle shot...")
        );
        assert_eq!(wizard.last_error(), Some(ANALYSIS_FAILED_MESSAGE));
    }

    #[test]
    fn test_should_leave_preview_by_cancel_or_proceed() {
        let mut wizard = at_preview();
        wizard.cancel_preview().expect("should cancel");
        assert_eq!(wizard.current_step(), Step::ModeSelection);

        let mut wizard = at_preview();
        wizard.proceed_from_preview().expect("should proceed");
        assert_eq!(wizard.current_step(), Step::ShotType);
    }

    #[test]
    fn test_should_reject_everything_but_reset_while_busy() {
        let mut wizard = at_mode_selection();
        wizard.select_mode(PromptMode::System).expect("should select");
        wizard
            .begin_direction(CreativeDirection::Lifestyle)
            .expect("should begin");

        assert!(matches!(
            wizard.begin_direction(CreativeDirection::Lifestyle),
            Err(CoreError::Busy)
        ));
        assert!(matches!(wizard.cancel_preview(), Err(CoreError::Busy)));
        assert!(matches!(
            wizard.finish_generation(Ok(image("H1"))),
            Err(CoreError::NotAwaiting("generation"))
        ));
        assert_eq!(wizard.activity(), Activity::Busy(Pending::Analysis));
    }

    #[test]
    fn test_should_reset_while_generating() {
        let mut wizard = at_shot_type_with_user_prompt();
        wizard
            .begin_generation(ShotType::Hero)
            .expect("should begin");
        assert_eq!(wizard.current_step(), Step::Generating);

        wizard.reset().expect("should reset");
        assert_eq!(wizard.current_step(), Step::Upload);
        assert!(wizard.session().is_blank());
        assert!(!wizard.is_loading());

        // The abandoned call reports back later.
        assert!(matches!(
            wizard.finish_generation(Ok(image("H1"))),
            Err(CoreError::NotAwaiting("generation"))
        ));
        assert!(wizard.session().is_blank());
        assert_eq!(wizard.current_step(), Step::Upload);
    }

    #[test]
    fn test_should_reset_while_analysis_pending() {
        let mut wizard = at_preview();
        wizard
            .begin_prompt_regeneration()
            .expect("should begin regeneration");

        wizard.reset().expect("should reset");
        assert_eq!(wizard.current_step(), Step::Upload);
        assert!(wizard.session().is_blank());
        assert!(wizard
            .finish_analysis(Ok("late".to_owned()))
            .is_err());
        assert!(wizard.session().system_prompt.is_none());
    }

    #[test]
    fn test_should_issue_new_ticket_per_call() {
        let mut wizard = at_shot_type_with_user_prompt();
        wizard
            .begin_generation(ShotType::Hero)
            .expect("should begin");
        let first = wizard.ticket();
        wizard
            .finish_generation(Err(CoreError::Generation(BackendError::NoImage)))
            .expect("should finish");
        wizard.retry().expect("should retry");
        wizard
            .begin_generation(ShotType::Hero)
            .expect("should begin again");
        assert_ne!(wizard.ticket(), first);
    }

    #[test]
    fn test_should_reject_completion_without_request() {
        let mut wizard = at_preview();
        assert!(matches!(
            wizard.finish_analysis(Ok("late".to_owned())),
            Err(CoreError::NotAwaiting("analysis"))
        ));
        assert_eq!(
            wizard.session().system_prompt.as_deref(),
            Some("a lifestyle shot...")
        );
    }

    #[test]
    fn test_should_enter_generating_then_result_on_success() {
        let mut wizard = at_shot_type_with_user_prompt();
        let plan = wizard
            .begin_generation(ShotType::Hero)
            .expect("should begin");
        assert_eq!(plan.prompt, "a watch on a wrist");
        assert_eq!(plan.shot_type, ShotType::Hero);
        assert_eq!(plan.product_image, Some(image("P1")));
        assert_eq!(wizard.current_step(), Step::Generating);
        assert!(wizard.is_loading());
        assert_eq!(wizard.session().shot_type, Some(ShotType::Hero));

        wizard
            .finish_generation(Ok(image("H1")))
            .expect("should finish");
        assert_eq!(wizard.current_step(), Step::Result);
        assert_eq!(wizard.session().generated_image, Some(image("H1")));
        assert!(wizard.last_error().is_none());
        assert!(!wizard.is_failed_result());
    }

    #[test]
    fn test_should_land_on_result_with_error_on_failure() {
        let wizard = at_failed_result();
        assert_eq!(wizard.current_step(), Step::Result);
        assert!(wizard.session().generated_image.is_none());
        assert_eq!(wizard.last_error(), Some(GENERATION_FAILED_MESSAGE));
        assert!(wizard.is_failed_result());
        assert!(!wizard.is_loading());
    }

    #[test]
    fn test_should_treat_empty_image_as_failure() {
        let mut wizard = at_shot_type_with_user_prompt();
        wizard
            .begin_generation(ShotType::Action)
            .expect("should begin");
        wizard
            .finish_generation(Ok(ImageHandle::from_base64("image/png", "")))
            .expect("should finish");
        assert!(wizard.is_failed_result());
        assert!(wizard.session().generated_image.is_none());
    }

    #[test]
    fn test_should_clear_previous_image_when_generation_starts() {
        let mut wizard = at_successful_result();
        wizard.begin_regeneration().expect("should begin");
        assert!(wizard.session().generated_image.is_none());
        wizard
            .finish_generation(Err(CoreError::Generation(BackendError::NoImage)))
            .expect("should finish");
        assert!(wizard.session().generated_image.is_none());
    }

    #[test]
    fn test_should_regenerate_with_same_shot_type() {
        let mut wizard = at_successful_result();
        let plan = wizard.begin_regeneration().expect("should begin");
        assert_eq!(plan.shot_type, ShotType::Hero);
        assert_eq!(wizard.current_step(), Step::Generating);

        wizard
            .finish_generation(Ok(image("H2")))
            .expect("should finish");
        assert_eq!(wizard.session().generated_image, Some(image("H2")));
    }

    #[test]
    fn test_should_offer_iteration_after_success_only() {
        let mut wizard = at_successful_result();
        assert!(matches!(
            wizard.retry(),
            Err(CoreError::InvalidTransition { action: "retry", .. })
        ));
        wizard.new_shot_type().expect("should pick new shot");
        assert_eq!(wizard.current_step(), Step::ShotType);

        let mut wizard = at_successful_result();
        wizard.new_creative_prompt().expect("should pick new prompt");
        assert_eq!(wizard.current_step(), Step::ModeSelection);
        assert_eq!(wizard.session().shot_type, Some(ShotType::Hero));

        let mut wizard = at_failed_result();
        assert!(wizard.new_shot_type().is_err());
        assert!(wizard.new_creative_prompt().is_err());
        assert!(wizard.begin_regeneration().is_err());
        assert_eq!(wizard.current_step(), Step::Result);
    }

    #[test]
    fn test_should_retry_shot_selection_after_failure() {
        let mut wizard = at_failed_result();
        wizard.retry().expect("should retry");
        assert_eq!(wizard.current_step(), Step::ShotType);

        wizard
            .begin_generation(ShotType::CloseUp)
            .expect("should begin");
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn test_should_end_session_from_either_result() {
        for mut wizard in [at_successful_result(), at_failed_result()] {
            wizard.end_session().expect("should end");
            assert_eq!(wizard.current_step(), Step::SessionEnd);
            assert!(matches!(
                wizard.reset(),
                Err(CoreError::InvalidTransition { action: "reset", .. })
            ));
        }
    }

    #[test]
    fn test_should_restart_to_blank_session() {
        let mut wizard = at_failed_result();
        wizard.end_session().expect("should end");
        wizard.restart().expect("should restart");

        assert_eq!(wizard.current_step(), Step::Upload);
        assert!(wizard.session().is_blank());
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn test_should_reset_from_every_intermediate_step() {
        let mut system_direction = at_mode_selection();
        system_direction
            .select_mode(PromptMode::System)
            .expect("should select");
        let mut user_input = at_mode_selection();
        user_input.select_mode(PromptMode::User).expect("should select");

        let wizards = [
            uploaded(),
            at_mode_selection(),
            user_input,
            system_direction,
            at_preview(),
            at_shot_type_with_user_prompt(),
            at_successful_result(),
            at_failed_result(),
        ];

        for mut wizard in wizards {
            let from = wizard.current_step();
            wizard.reset().expect("should reset");
            assert_eq!(wizard.current_step(), Step::Upload, "reset from {from}");
            assert!(wizard.session().is_blank(), "reset from {from}");
            assert!(wizard.last_error().is_none(), "reset from {from}");
        }
    }

    #[test]
    fn test_should_not_reset_on_upload() {
        let mut wizard = Wizard::new();
        wizard.set_product_image(Some(image("P1"))).expect("should set");
        assert!(wizard.reset().is_err());
        assert_eq!(wizard.session().product_image, Some(image("P1")));
    }

    #[test]
    fn test_should_reject_out_of_order_triggers() {
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.select_size(AspectRatio::Square),
            Err(CoreError::InvalidTransition { step: Step::Upload, .. })
        ));
        assert!(wizard.begin_generation(ShotType::Hero).is_err());
        assert!(wizard.end_session().is_err());
        assert!(wizard.restart().is_err());
        assert!(wizard.session().is_blank());
        assert_eq!(wizard.current_step(), Step::Upload);
    }

    #[test]
    fn test_should_plan_without_mutating() {
        let wizard = at_shot_type_with_user_prompt();
        let before = wizard.session().clone();
        let plan = wizard.plan_generation(ShotType::Action).expect("should plan");

        assert_eq!(plan.shot_type, ShotType::Action);
        assert_eq!(wizard.session(), &before);
        assert_eq!(wizard.current_step(), Step::ShotType);
    }

    #[test]
    fn test_should_serialize_wizard_snapshot() {
        let wizard = at_failed_result();
        let value = serde_json::to_value(&wizard).expect("should serialize");
        assert_eq!(value["step"], "result");
        assert_eq!(value["activity"], "idle");
        assert_eq!(value["error"], GENERATION_FAILED_MESSAGE);
        assert_eq!(value["session"]["shotType"], "Hero / Ad Key Visual");
    }
}
