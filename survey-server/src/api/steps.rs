//! Step table, playlists and per-step submission

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use survey_common::catalog::Playlist;
use survey_common::models::SurveyDraft;
use survey_common::progress::{self, Progression};
use survey_common::steps::{self, Route, StepDescriptor, STEP_ORDER};
use tracing::debug;

use super::survey::{apply_session_order, finish_survey, session_order};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Submit request for the step at `route`
#[derive(Debug, Deserialize)]
pub struct StepSubmitRequest {
    pub route: String,
    /// The participant's full draft, as held on the client
    pub survey: SurveyDraft,
}

/// Where to go after an accepted submit
#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub redirect: &'static str,
}

/// Playlist shown on a swipe step
#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub route: Route,
    pub playlist: Playlist,
}

/// GET /api/steps
pub async fn list_steps() -> Json<&'static [StepDescriptor]> {
    Json(&STEP_ORDER[..])
}

/// GET /api/playlists/:major/:sub
///
/// Resolves the model from the session's model order.
pub async fn get_playlist(
    State(state): State<AppState>,
    Path((major, sub)): Path<(u8, u8)>,
    headers: HeaderMap,
) -> ApiResult<Json<PlaylistResponse>> {
    let route = steps::playlist_route(major, sub)
        .ok_or_else(|| ApiError::NotFound(format!("No playlist step {}/{}", major, sub)))?;

    let order = session_order(&headers)?;
    let model = order
        .get(usize::from(major) - 1)
        .copied()
        .ok_or_else(|| ApiError::NotFound(format!("No model for step {}", major)))?;

    let playlist = state
        .catalog
        .playlist(model, sub)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("No playlist {} for {}", sub, model)))?;

    Ok(Json(PlaylistResponse { route, playlist }))
}

/// POST /api/steps/submit
///
/// Validates the answer for `route`; 422 with field errors when it may not
/// advance. Model ids come from the session cookie, so a swipe step is
/// checked against the playlist `GET /api/playlists` served. The last step
/// stores the whole survey exactly like `POST /api/survey/submit`.
pub async fn submit_step(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StepSubmitRequest>,
) -> ApiResult<Json<RedirectResponse>> {
    let route = Route::from_str(&request.route)?;
    let mut draft = request.survey;
    apply_session_order(&headers, &mut draft)?;

    if progress::requires_final_submission(route) {
        debug!("Step {} ends the survey, storing submission", route);
        return finish_survey(&state, &draft).await;
    }

    let playlist = state.catalog.for_route(route, &draft);
    let mut progression = Progression::at(route);
    match progression.submit_step(&draft, playlist) {
        Ok(target) => Ok(Json(RedirectResponse {
            redirect: target.as_str(),
        })),
        Err(errors) => {
            debug!("Step {} returned {} field error(s)", route, errors.len());
            Err(ApiError::Validation {
                errors,
                redirect: None,
            })
        }
    }
}
