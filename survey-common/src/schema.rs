//! Validation schemas for step answers and the full survey aggregate
//!
//! Each validator walks a draft, records at most one message per field path
//! (the first failing rule wins) and yields the validated answer only when no
//! rule failed. Field paths are dotted, e.g. `modelRating.relevance`,
//! `playlistRatings.1.novelty` or `songRatings.0.rating`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::models::{
    ModelRating, ModelRatingDraft, ModelRatingField, Rating, ReviewAnswer, ReviewDraft, SongRating,
    StepAnswer, StepDraft, StepKey, SurveyAggregate, SurveyDraft,
};

/// Lowest accepted score for stars and model ratings
pub const MIN_SCORE: i64 = 1;
/// Highest accepted score for stars and model ratings
pub const MAX_SCORE: i64 = 5;
/// Youngest accepted participant age
pub const MIN_AGE: i64 = 13;
/// Oldest accepted participant age
pub const MAX_AGE: i64 = 120;
/// Feedback length limit, in characters
pub const MAX_FEEDBACK_CHARS: usize = 500;

/// Mapping of field path to the message of its first failing rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry mapping
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record `message` for `field` unless that field already failed
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True if any recorded path starts with `prefix`
    pub fn any_under(&self, prefix: &str) -> bool {
        self.0.keys().any(|k| k == prefix || k.starts_with(&format!("{}.", prefix)))
    }

    /// Merge `other` into `self`, keeping existing messages
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// A draft that can be checked against its schema
pub trait Validate {
    /// The validated form
    type Output;

    /// Record failures under `path` into `errors`; returns the validated form if
    /// this value passed every rule
    fn check(&self, path: &str, errors: &mut FieldErrors) -> Option<Self::Output>;

    /// Validate as a top-level value
    fn validate(&self) -> Result<Self::Output, FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.check("", &mut errors) {
            Some(output) if errors.is_empty() => Ok(output),
            _ => Err(errors),
        }
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

fn score(value: Option<i64>, field: &str, errors: &mut FieldErrors) -> Option<u8> {
    match value {
        None => {
            errors.add(field, "Required");
            None
        }
        Some(v) if !(MIN_SCORE..=MAX_SCORE).contains(&v) => {
            errors.add(
                field,
                format!("Must be between {} and {}", MIN_SCORE, MAX_SCORE),
            );
            None
        }
        Some(v) => Some(v as u8),
    }
}

fn pinned_step(value: i64, key: StepKey, field: &str, errors: &mut FieldErrors) -> Option<u8> {
    if value == key.position() {
        Some(value as u8)
    } else {
        errors.add(field, format!("Expected step {}", key.position()));
        None
    }
}

impl Validate for ModelRatingDraft {
    type Output = ModelRating;

    fn check(&self, path: &str, errors: &mut FieldErrors) -> Option<ModelRating> {
        let [relevance, novelty, satisfaction] = ModelRatingField::ALL
            .map(|field| score(self.get(field), &join(path, field.as_str()), errors));
        Some(ModelRating {
            relevance: relevance?,
            novelty: novelty?,
            satisfaction: satisfaction?,
        })
    }
}

impl Validate for SongRating {
    type Output = SongRating;

    fn check(&self, path: &str, errors: &mut FieldErrors) -> Option<SongRating> {
        match self.rating {
            Rating::Stars(stars) => {
                score(Some(stars), &join(path, "rating"), errors)?;
            }
            Rating::Liked(_) => {}
        }
        Some(self.clone())
    }
}

/// Validate a model step draft against the schema pinned to `key`
pub fn check_step(
    draft: &StepDraft,
    key: StepKey,
    path: &str,
    errors: &mut FieldErrors,
) -> Option<StepAnswer> {
    let step = pinned_step(draft.step, key, &join(path, "step"), errors);

    let ratings_path = join(path, "songRatings");
    let mut ratings_ok = true;
    for (i, rating) in draft.song_ratings.iter().enumerate() {
        let item_path = format!("{}.{}", ratings_path, i);
        let duplicate = draft.song_ratings[..i]
            .iter()
            .any(|earlier| earlier.song_id == rating.song_id);
        if duplicate {
            errors.add(join(&item_path, "songId"), "Duplicate song rating");
            ratings_ok = false;
        }
        if rating.check(&item_path, errors).is_none() {
            ratings_ok = false;
        }
    }

    let model_rating = draft.model_rating.check(&join(path, "modelRating"), errors);

    let playlists_path = join(path, "playlistRatings");
    let mut playlist_ratings: Vec<Option<ModelRating>> = Vec::new();
    for (i, rating) in draft.playlist_ratings.iter().enumerate() {
        playlist_ratings.push(rating.check(&format!("{}.{}", playlists_path, i), errors));
    }

    if !ratings_ok {
        return None;
    }
    let playlist_ratings = playlist_ratings
        .into_iter()
        .collect::<Option<Vec<_>>>()?
        .try_into()
        .ok()?;
    Some(StepAnswer {
        step: step?,
        model_id: draft.model_id,
        song_ratings: draft.song_ratings.clone(),
        model_rating: model_rating?,
        playlist_ratings,
    })
}

/// Validate the step draft stored under `key` as a top-level value
pub fn validate_step(draft: &StepDraft, key: StepKey) -> Result<StepAnswer, FieldErrors> {
    let mut errors = FieldErrors::new();
    match check_step(draft, key, "", &mut errors) {
        Some(answer) if errors.is_empty() => Ok(answer),
        _ => Err(errors),
    }
}

impl Validate for ReviewDraft {
    type Output = ReviewAnswer;

    fn check(&self, path: &str, errors: &mut FieldErrors) -> Option<ReviewAnswer> {
        let step = pinned_step(self.step, StepKey::Review, &join(path, "step"), errors);

        let age_path = join(path, "age");
        let age = match self.age {
            None => {
                errors.add(&age_path, "Required");
                None
            }
            Some(a) if a < MIN_AGE => {
                errors.add(&age_path, format!("Age must be at least {}", MIN_AGE));
                None
            }
            Some(a) if a > MAX_AGE => {
                errors.add(&age_path, format!("Age must be at most {}", MAX_AGE));
                None
            }
            Some(a) => Some(a as u8),
        };

        let country = if self.country.trim().is_empty() {
            errors.add(join(path, "country"), "Country is required");
            None
        } else {
            Some(self.country.clone())
        };

        let preference = self.preference;
        if preference.is_none() {
            errors.add(join(path, "preference"), "Required");
        }

        let feedback = if self.feedback.chars().count() > MAX_FEEDBACK_CHARS {
            errors.add(
                join(path, "feedback"),
                format!("Feedback must be at most {} characters", MAX_FEEDBACK_CHARS),
            );
            None
        } else {
            Some(self.feedback.clone())
        };

        Some(ReviewAnswer {
            step: step?,
            age: age?,
            country: country?,
            preference: preference?,
            feedback: feedback?,
        })
    }
}

impl Validate for SurveyDraft {
    type Output = SurveyAggregate;

    fn check(&self, path: &str, errors: &mut FieldErrors) -> Option<SurveyAggregate> {
        let step_one = check_step(
            &self.step_one,
            StepKey::StepOne,
            &join(path, StepKey::StepOne.as_str()),
            errors,
        );
        let step_two = check_step(
            &self.step_two,
            StepKey::StepTwo,
            &join(path, StepKey::StepTwo.as_str()),
            errors,
        );
        let step_three = check_step(
            &self.step_three,
            StepKey::StepThree,
            &join(path, StepKey::StepThree.as_str()),
            errors,
        );
        let review = self
            .review
            .check(&join(path, StepKey::Review.as_str()), errors);

        Some(SurveyAggregate {
            step_one: step_one?,
            step_two: step_two?,
            step_three: step_three?,
            review: review?,
        })
    }
}

/// Why a stored snapshot was rejected
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not JSON, wrong types, or a required key is missing
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Well-formed but at least one field breaks its rule
    #[error("Invalid snapshot: {0}")]
    Invalid(FieldErrors),
}

/// Parse a stored snapshot into a draft, validating it in full
///
/// The draft is returned (rather than the validated aggregate) because the
/// state container keeps working on drafts after a successful load.
pub fn parse_draft(raw: &str) -> Result<SurveyDraft, SnapshotError> {
    let draft: SurveyDraft = serde_json::from_str(raw)?;
    draft.validate().map_err(SnapshotError::Invalid)?;
    Ok(draft)
}

/// Parse and validate a stored snapshot into a submittable aggregate
pub fn parse_snapshot(raw: &str) -> Result<SurveyAggregate, SnapshotError> {
    let draft: SurveyDraft = serde_json::from_str(raw)?;
    draft.validate().map_err(SnapshotError::Invalid)
}
