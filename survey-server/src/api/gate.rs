//! Terms gate for survey routes
//!
//! Requests without an accepted-terms cookie are redirected to the landing
//! page. Applied to protected routes only.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use survey_common::session::{self, Gate};
use tracing::debug;

use super::cookies::RequestCookies;

/// Redirect (303) to `/` unless the participant accepted the terms
pub async fn terms_gate(request: Request, next: Next) -> Response {
    let cookies = RequestCookies::from_headers(request.headers(), false);
    match session::gate(&cookies) {
        Gate::Allow => next.run(request).await,
        Gate::RedirectToTerms => {
            debug!("Terms not accepted, redirecting {}", request.uri().path());
            Redirect::to("/").into_response()
        }
    }
}
