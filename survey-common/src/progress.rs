//! Survey progression: forward-gated step submission and final submission
//!
//! `Progression` tracks the participant's current route. A step's submit
//! action validates that step's answer; only on success does the route
//! advance. Field errors are returned to the caller and never propagate
//! further. The step whose target is the thank-you page cannot be passed by
//! a step submit; only a stored survey ends the progression.

use std::future::Future;
use tracing::{info, warn};

use crate::catalog::Playlist;
use crate::models::{Rating, StepKey, SurveyAggregate, SurveyDraft};
use crate::schema::{self, FieldErrors, Validate};
use crate::state::{SnapshotStore, SurveyState};
use crate::steps::{self, Destination, Route, StepForm};

/// Field key for errors that do not belong to one input
pub const FORM_FIELD: &str = "form";

/// Message shown when the submission collaborator fails
pub const SUBMISSION_FAILED: &str = "Something went wrong while saving your answers. Please try again.";

/// Message returned when a step submit reaches the end of the survey
pub const FINAL_SUBMISSION_REQUIRED: &str = "Submit the completed survey to finish";

/// Collaborator that durably stores a completed survey
pub trait SurveySink {
    fn submit(
        &self,
        survey: &SurveyAggregate,
    ) -> impl Future<Output = crate::Result<()>> + Send;
}

/// Where the participant is in the step sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    current: Route,
    submitted: bool,
}

impl Default for Progression {
    fn default() -> Self {
        Self::at(steps::first())
    }
}

impl Progression {
    /// Progression positioned at `route`
    pub fn at(route: Route) -> Self {
        Self {
            current: route,
            submitted: false,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// True once the final submission succeeded
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Navigate without gating (step links, back/forward arrows)
    pub fn go_to(&mut self, route: Route) {
        self.current = route;
    }

    pub fn go_next(&mut self) -> Route {
        self.current = steps::next(self.current);
        self.current
    }

    pub fn go_previous(&mut self) -> Route {
        self.current = steps::previous(self.current);
        self.current
    }

    pub fn is_active_parent(&self, major_index: u8) -> bool {
        steps::is_active_parent(self.current, major_index)
    }

    /// Submit the current step
    ///
    /// `playlist` is the playlist shown on a swipe step; it is required to
    /// decide whether every song was rated. On success the route moves to the
    /// step's submit target and that target is returned. A step whose target
    /// is the thank-you page is never passed here: once its answer is valid a
    /// single [`FORM_FIELD`] error with [`FINAL_SUBMISSION_REQUIRED`] comes
    /// back and the caller must use [`Progression::submit_survey`] or
    /// [`submit_draft`].
    pub fn submit_step(
        &mut self,
        draft: &SurveyDraft,
        playlist: Option<&Playlist>,
    ) -> Result<Destination, FieldErrors> {
        let errors = check_step_submission(self.current, draft, playlist);
        if !errors.is_empty() {
            info!(
                "Step {} rejected with {} field error(s)",
                self.current,
                errors.len()
            );
            return Err(errors);
        }

        let from = self.current;
        let target = steps::submit_target(from);
        match target {
            Destination::Step(route) => self.current = route,
            Destination::ThankYou => {
                info!("Step {} is final, survey submission required", from);
                return Err(FieldErrors::single(FORM_FIELD, FINAL_SUBMISSION_REQUIRED));
            }
            Destination::Terms => {}
        }
        info!("Step {} accepted, continuing to {:?}", from, target);
        Ok(target)
    }

    /// Validate the whole survey and hand it to `sink`
    ///
    /// Validation failures come back as field errors with nothing sent. A sink
    /// failure comes back as a single [`FORM_FIELD`] error and local data is
    /// kept so the participant can retry. On success local data is cleared and
    /// the progression becomes terminal.
    pub async fn submit_survey<S, K>(
        &mut self,
        state: &mut SurveyState<S>,
        sink: &K,
    ) -> Result<Destination, FieldErrors>
    where
        S: SnapshotStore,
        K: SurveySink,
    {
        let target = submit_draft(state.draft(), sink).await?;

        if let Err(e) = state.reset() {
            // The record is stored; a stale local copy only costs a reload
            warn!("Failed to clear local survey data after submission: {}", e);
        }
        self.submitted = true;
        Ok(target)
    }
}

/// Validate `draft` in full and hand the aggregate to `sink`
///
/// Stateless half of [`Progression::submit_survey`], for callers that hold
/// the draft themselves (an HTTP handler receiving it in a request body).
pub async fn submit_draft<K: SurveySink>(
    draft: &SurveyDraft,
    sink: &K,
) -> Result<Destination, FieldErrors> {
    let aggregate = draft.validate()?;

    if let Err(e) = sink.submit(&aggregate).await {
        warn!("Survey submission failed: {}", e);
        return Err(FieldErrors::single(FORM_FIELD, SUBMISSION_FAILED));
    }

    info!("Survey accepted for models {:?}", aggregate.model_order());
    Ok(Destination::ThankYou)
}

/// True if submitting the step at `route` ends the survey
pub fn requires_final_submission(route: Route) -> bool {
    steps::submit_target(route) == Destination::ThankYou
}

/// True if `errors` is the storage failure reported by [`submit_draft`]
pub fn is_submission_failure(errors: &FieldErrors) -> bool {
    errors.len() == 1 && errors.get(FORM_FIELD) == Some(SUBMISSION_FAILED)
}

/// Errors blocking a submit at `route`; empty when the step may advance
pub fn check_step_submission(
    route: Route,
    draft: &SurveyDraft,
    playlist: Option<&Playlist>,
) -> FieldErrors {
    let descriptor = route.descriptor();
    let mut errors = FieldErrors::new();

    let Some(step) = draft.step(descriptor.answer) else {
        if let Err(review_errors) = draft.review.validate() {
            errors.extend(review_errors);
        }
        return errors;
    };

    if let Err(step_errors) = schema::validate_step(step, descriptor.answer) {
        errors.extend(step_errors);
    }

    match descriptor.form {
        StepForm::StarRating => {
            let has_stars = step
                .song_ratings
                .iter()
                .any(|r| matches!(r.rating, Rating::Stars(_)));
            if !has_stars {
                errors.add("songRatings", "Please rate at least one song");
            }
        }
        StepForm::Swipe => match playlist {
            Some(playlist) if playlist.is_finished(step) => {}
            Some(_) => errors.add("songRatings", "Please rate every song in the playlist"),
            None => errors.add(FORM_FIELD, "Playlist is not available"),
        },
        StepForm::Review => {}
    }

    errors
}

/// Key of the first step whose answer fails in `errors`, in survey order
///
/// Used to send a participant back to the step that needs attention after a
/// rejected final submission.
pub fn first_failing_step(errors: &FieldErrors) -> Option<StepKey> {
    [
        StepKey::StepOne,
        StepKey::StepTwo,
        StepKey::StepThree,
        StepKey::Review,
    ]
    .into_iter()
    .find(|key| errors.any_under(key.as_str()))
}

/// Route holding the form for `key`
pub fn route_for(key: StepKey) -> Route {
    steps::STEP_ORDER
        .iter()
        .find(|d| d.answer == key)
        .map(|d| d.route)
        .unwrap_or_else(steps::first)
}
