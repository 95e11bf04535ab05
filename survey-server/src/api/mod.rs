//! HTTP API handlers for survey-server

pub mod cookies;
pub mod gate;
pub mod health;
pub mod steps;
pub mod survey;
pub mod terms;

pub use cookies::RequestCookies;
pub use gate::terms_gate;
pub use health::health_routes;
pub use steps::{get_playlist, list_steps, submit_step};
pub use survey::submit_survey;
pub use terms::{accept_terms, get_session, reset_terms};
