//! Terms acceptance and session endpoints

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use survey_common::models::ModelId;
use survey_common::session;
use survey_common::steps;
use tracing::info;

use super::cookies::RequestCookies;
use crate::AppState;

/// Response to accepting the terms
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptTermsResponse {
    /// First survey step
    pub redirect: &'static str,
    pub model_order: Vec<ModelId>,
}

/// Current participant session
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub accepted_terms: bool,
    /// `None` when the stored order is missing or tampered with
    pub model_order: Option<Vec<ModelId>>,
}

/// POST /api/terms/accept
///
/// Sets the terms cookie and assigns a model order if none is stored yet.
pub async fn accept_terms(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut cookies = RequestCookies::from_headers(&headers, state.secure_cookies);
    let model_order = session::accept_terms(&mut cookies, &mut rand::thread_rng());
    info!("Participant accepted terms");

    let mut response = Json(AcceptTermsResponse {
        redirect: steps::first().as_str(),
        model_order,
    })
    .into_response();
    cookies.write_to(response.headers_mut());
    response
}

/// POST /api/terms/reset
///
/// Clears terms and model order so the next acceptance reshuffles.
pub async fn reset_terms(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut cookies = RequestCookies::from_headers(&headers, state.secure_cookies);
    session::reset_session(&mut cookies);

    let mut response = StatusCode::NO_CONTENT.into_response();
    cookies.write_to(response.headers_mut());
    response
}

/// GET /api/session
pub async fn get_session(headers: HeaderMap) -> Json<SessionResponse> {
    let cookies = RequestCookies::from_headers(&headers, false);
    Json(SessionResponse {
        accepted_terms: session::terms_accepted(&cookies),
        model_order: session::model_order(&cookies),
    })
}
