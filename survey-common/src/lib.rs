//! # Survey Common Library
//!
//! Core of the music recommendation survey, shared by every front-end:
//! - Step order and navigation (`steps`, `progress`)
//! - Answer models and validation schemas (`models`, `schema`)
//! - Client-side persistence and the survey state container (`state`)
//! - Swipe playlists and the playlist catalog (`swipe`, `catalog`)
//! - Session cookies and model order shuffling (`session`, `shuffle`)
//! - Configuration loading and submission storage (`config`, `db`)

pub mod catalog;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod progress;
pub mod schema;
pub mod session;
pub mod shuffle;
pub mod state;
pub mod steps;
pub mod swipe;

pub use error::{Error, Result};
pub use schema::{FieldErrors, Validate};
