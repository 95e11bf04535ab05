//! Survey data model
//!
//! Two layers live here:
//! - Drafts (`StepDraft`, `ReviewDraft`, `SurveyDraft`) hold what the participant has
//!   entered so far. They are what the state container mutates and persists.
//! - Validated answers (`StepAnswer`, `ReviewAnswer`, `SurveyAggregate`) are produced
//!   only by the validators in [`crate::schema`] and are what gets submitted.
//!
//! All JSON uses camelCase keys so stored snapshots keep the same shape across releases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Country stored in a fresh review draft until the participant picks one
pub const DEFAULT_COUNTRY: &str = "Not specified";

/// Age stored in a fresh review draft
pub const DEFAULT_AGE: i64 = 18;

/// Swipe playlists presented for each model step
pub const PLAYLISTS_PER_STEP: usize = 3;

/// Identifier of one of the recommendation models under study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    Model1,
    Model2,
    Model3,
}

impl ModelId {
    /// The fixed set of models, in canonical order
    pub const ALL: [ModelId; 3] = [ModelId::Model1, ModelId::Model2, ModelId::Model3];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Model1 => "model1",
            ModelId::Model2 => "model2",
            ModelId::Model3 => "model3",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model1" => Ok(ModelId::Model1),
            "model2" => Ok(ModelId::Model2),
            "model3" => Ok(ModelId::Model3),
            other => Err(Error::InvalidInput(format!("Unknown model id: {}", other))),
        }
    }
}

/// A recommended song offered to the participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub name: String,
}

/// Rating given to a single song
///
/// Swipe steps record like/dislike, star steps record 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Liked(bool),
    Stars(i64),
}

/// One participant rating for one song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRating {
    pub song_id: i64,
    pub song_name: String,
    pub rating: Rating,
}

/// Fields of the per-model rating sub-form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRatingField {
    Relevance,
    Novelty,
    Satisfaction,
}

impl ModelRatingField {
    pub const ALL: [ModelRatingField; 3] = [
        ModelRatingField::Relevance,
        ModelRatingField::Novelty,
        ModelRatingField::Satisfaction,
    ];

    /// JSON field name
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRatingField::Relevance => "relevance",
            ModelRatingField::Novelty => "novelty",
            ModelRatingField::Satisfaction => "satisfaction",
        }
    }
}

/// Keys of the aggregate, one per answer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKey {
    StepOne,
    StepTwo,
    StepThree,
    Review,
}

impl StepKey {
    /// Keys whose answers rate a model, in presentation order
    pub const MODEL_STEPS: [StepKey; 3] = [StepKey::StepOne, StepKey::StepTwo, StepKey::StepThree];

    /// The literal `step` value pinned by this key's schema (1-based)
    pub fn position(&self) -> i64 {
        match self {
            StepKey::StepOne => 1,
            StepKey::StepTwo => 2,
            StepKey::StepThree => 3,
            StepKey::Review => 4,
        }
    }

    /// JSON key in the aggregate
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKey::StepOne => "stepOne",
            StepKey::StepTwo => "stepTwo",
            StepKey::StepThree => "stepThree",
            StepKey::Review => "review",
        }
    }
}

// ============================================================================
// Drafts
// ============================================================================

/// Model rating as entered; empty fields are `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRatingDraft {
    pub relevance: Option<i64>,
    pub novelty: Option<i64>,
    pub satisfaction: Option<i64>,
}

impl ModelRatingDraft {
    /// Every field filled with the lowest score
    pub fn filled() -> Self {
        Self {
            relevance: Some(1),
            novelty: Some(1),
            satisfaction: Some(1),
        }
    }

    pub fn get(&self, field: ModelRatingField) -> Option<i64> {
        match field {
            ModelRatingField::Relevance => self.relevance,
            ModelRatingField::Novelty => self.novelty,
            ModelRatingField::Satisfaction => self.satisfaction,
        }
    }

    pub fn set(&mut self, field: ModelRatingField, value: Option<i64>) {
        match field {
            ModelRatingField::Relevance => self.relevance = value,
            ModelRatingField::Novelty => self.novelty = value,
            ModelRatingField::Satisfaction => self.satisfaction = value,
        }
    }

    /// True when no field is empty (values are not range-checked here)
    pub fn is_complete(&self) -> bool {
        ModelRatingField::ALL.iter().all(|f| self.get(*f).is_some())
    }
}

/// In-progress answer for one model step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDraft {
    pub step: i64,
    pub model_id: ModelId,
    #[serde(default)]
    pub song_ratings: Vec<SongRating>,
    /// Rating entered on the star form
    pub model_rating: ModelRatingDraft,
    /// Rating entered after each swipe playlist, indexed by playlist number - 1
    pub playlist_ratings: [ModelRatingDraft; PLAYLISTS_PER_STEP],
}

impl StepDraft {
    /// Fresh draft for the model step at `key`
    pub fn new(key: StepKey, model_id: ModelId) -> Self {
        Self {
            step: key.position(),
            model_id,
            song_ratings: Vec::new(),
            model_rating: ModelRatingDraft::filled(),
            playlist_ratings: [ModelRatingDraft::filled(); PLAYLISTS_PER_STEP],
        }
    }

    /// Model rating for swipe playlist `number` (1-based)
    pub fn playlist_rating(&self, number: u8) -> Option<&ModelRatingDraft> {
        (number as usize)
            .checked_sub(1)
            .and_then(|i| self.playlist_ratings.get(i))
    }

    pub fn playlist_rating_mut(&mut self, number: u8) -> Option<&mut ModelRatingDraft> {
        (number as usize)
            .checked_sub(1)
            .and_then(|i| self.playlist_ratings.get_mut(i))
    }

    /// Insert or replace the rating for `rating.song_id`
    ///
    /// An existing entry is replaced in place so list order is preserved.
    pub fn upsert_song_rating(&mut self, rating: SongRating) {
        match self.song_ratings.iter_mut().find(|r| r.song_id == rating.song_id) {
            Some(existing) => *existing = rating,
            None => self.song_ratings.push(rating),
        }
    }

    /// Delete the rating for `song_id`, returning whether one existed
    pub fn remove_song_rating(&mut self, song_id: i64) -> bool {
        let before = self.song_ratings.len();
        self.song_ratings.retain(|r| r.song_id != song_id);
        self.song_ratings.len() != before
    }

    pub fn song_rating(&self, song_id: i64) -> Option<&SongRating> {
        self.song_ratings.iter().find(|r| r.song_id == song_id)
    }
}

/// In-progress answer for the final review step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub step: i64,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub preference: Option<ModelId>,
    #[serde(default)]
    pub feedback: String,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        Self {
            step: StepKey::Review.position(),
            age: Some(DEFAULT_AGE),
            country: DEFAULT_COUNTRY.to_string(),
            preference: Some(ModelId::Model1),
            feedback: String::new(),
        }
    }
}

/// Everything the participant has entered, one key per step
///
/// Every key is required when deserializing; a snapshot missing one is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDraft {
    pub step_one: StepDraft,
    pub step_two: StepDraft,
    pub step_three: StepDraft,
    pub review: ReviewDraft,
}

impl Default for SurveyDraft {
    fn default() -> Self {
        Self {
            step_one: StepDraft::new(StepKey::StepOne, ModelId::Model1),
            step_two: StepDraft::new(StepKey::StepTwo, ModelId::Model2),
            step_three: StepDraft::new(StepKey::StepThree, ModelId::Model3),
            review: ReviewDraft::default(),
        }
    }
}

impl SurveyDraft {
    /// Model step draft for `key`; `None` for the review key
    pub fn step(&self, key: StepKey) -> Option<&StepDraft> {
        match key {
            StepKey::StepOne => Some(&self.step_one),
            StepKey::StepTwo => Some(&self.step_two),
            StepKey::StepThree => Some(&self.step_three),
            StepKey::Review => None,
        }
    }

    pub fn step_mut(&mut self, key: StepKey) -> Option<&mut StepDraft> {
        match key {
            StepKey::StepOne => Some(&mut self.step_one),
            StepKey::StepTwo => Some(&mut self.step_two),
            StepKey::StepThree => Some(&mut self.step_three),
            StepKey::Review => None,
        }
    }

    /// Models currently assigned to the three model steps
    pub fn model_order(&self) -> [ModelId; 3] {
        [
            self.step_one.model_id,
            self.step_two.model_id,
            self.step_three.model_id,
        ]
    }

    /// Assign `order[i]` to the i-th model step
    pub fn assign_model_order(&mut self, order: &[ModelId]) -> Result<(), Error> {
        if order.len() != StepKey::MODEL_STEPS.len() {
            return Err(Error::InvalidInput(format!(
                "Model order needs {} entries, got {}",
                StepKey::MODEL_STEPS.len(),
                order.len()
            )));
        }
        for (key, model) in StepKey::MODEL_STEPS.iter().zip(order) {
            if let Some(step) = self.step_mut(*key) {
                step.model_id = *model;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Validated answers
// ============================================================================

/// Validated model rating, every field in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRating {
    pub relevance: u8,
    pub novelty: u8,
    pub satisfaction: u8,
}

/// Validated answer for one model step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAnswer {
    pub step: u8,
    pub model_id: ModelId,
    pub song_ratings: Vec<SongRating>,
    pub model_rating: ModelRating,
    pub playlist_ratings: [ModelRating; PLAYLISTS_PER_STEP],
}

/// Validated review answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnswer {
    pub step: u8,
    pub age: u8,
    pub country: String,
    pub preference: ModelId,
    pub feedback: String,
}

/// Complete, validated survey ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAggregate {
    pub step_one: StepAnswer,
    pub step_two: StepAnswer,
    pub step_three: StepAnswer,
    pub review: ReviewAnswer,
}

impl SurveyAggregate {
    /// Model presentation order recorded in the step answers
    pub fn model_order(&self) -> [ModelId; 3] {
        [
            self.step_one.model_id,
            self.step_two.model_id,
            self.step_three.model_id,
        ]
    }
}
