//! Final survey submission

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use survey_common::db::SqliteSink;
use survey_common::models::{ModelId, SurveyDraft};
use survey_common::progress::{self, first_failing_step, route_for};
use survey_common::session;
use tracing::{debug, warn};

use super::cookies::RequestCookies;
use super::steps::RedirectResponse;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SurveySubmitRequest {
    pub survey: SurveyDraft,
}

/// Model order stored in the session cookie
pub(crate) fn session_order(headers: &HeaderMap) -> ApiResult<Vec<ModelId>> {
    let cookies = RequestCookies::from_headers(headers, false);
    session::model_order(&cookies)
        .ok_or_else(|| ApiError::BadRequest("Session has no model order".to_string()))
}

/// Overwrite the draft's model ids with the session's model order
///
/// The cookie is the only source of the order; ids sent by the client are
/// never trusted.
pub(crate) fn apply_session_order(headers: &HeaderMap, draft: &mut SurveyDraft) -> ApiResult<()> {
    let order = session_order(headers)?;
    if draft.model_order()[..] != order[..] {
        debug!(
            "Replacing client model order {:?} with session order {:?}",
            draft.model_order(),
            order
        );
    }
    draft.assign_model_order(&order)?;
    Ok(())
}

/// Validate `draft` and store it; shared by both submission endpoints
pub(crate) async fn finish_survey(
    state: &AppState,
    draft: &SurveyDraft,
) -> ApiResult<Json<RedirectResponse>> {
    let sink = SqliteSink::new(state.db.clone());

    match progress::submit_draft(draft, &sink).await {
        Ok(target) => Ok(Json(RedirectResponse {
            redirect: target.as_str(),
        })),
        Err(errors) if progress::is_submission_failure(&errors) => {
            Err(ApiError::Unavailable(errors))
        }
        Err(errors) => {
            let redirect = first_failing_step(&errors).map(|key| route_for(key).as_str());
            warn!(
                "Survey submission rejected, returning participant to {:?}",
                redirect
            );
            Err(ApiError::Validation { errors, redirect })
        }
    }
}

/// POST /api/survey/submit
///
/// Model ids come from the session cookie. 422 with the first failing step
/// as `redirect` when any answer is invalid; 503 when the survey could not
/// be stored.
pub async fn submit_survey(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SurveySubmitRequest>,
) -> ApiResult<Json<RedirectResponse>> {
    let mut draft = request.survey;
    apply_session_order(&headers, &mut draft)?;
    finish_survey(&state, &draft).await
}
