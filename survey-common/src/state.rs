//! Survey state container and client-side snapshot persistence
//!
//! `SurveyState` is handed to every step handler. Each mutation is merged into
//! the in-memory draft and the full draft is written to the snapshot store
//! immediately. Loading is fail-closed: a snapshot that does not parse or does
//! not validate in full is discarded and the participant starts from defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::{
    ModelId, ModelRatingDraft, ModelRatingField, Rating, ReviewDraft, SongRating, StepKey,
    SurveyDraft, PLAYLISTS_PER_STEP,
};
use crate::schema::{self, SnapshotError};
use crate::{Error, Result};

/// Storage key holding the serialized survey draft
pub const STORAGE_KEY: &str = "multi-page-survey-data";

/// Durable key/value storage on the participant's side
pub trait SnapshotStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, used by tests and embedded front-ends
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `value` under `key`
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::InvalidInput(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write-then-rename so a crash never leaves a half-written snapshot
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Change to a model step's answer, built by the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    /// Rate a song; replaces an earlier rating of the same song
    SongRating {
        song_id: i64,
        song_name: String,
        rating: Rating,
    },
    /// Delete a song's rating
    RemoveSongRating { song_id: i64 },
    /// Set or clear one field of the model rating sub-form
    ModelRating {
        field: ModelRatingField,
        value: Option<i64>,
    },
    /// Set or clear one field of the rating shown after swipe playlist `playlist`
    PlaylistRating {
        playlist: u8,
        field: ModelRatingField,
        value: Option<i64>,
    },
}

/// Change to the review answer
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewInput {
    Age(Option<i64>),
    Country(String),
    Preference(Option<ModelId>),
    Feedback(String),
}

/// Any change a participant can make
#[derive(Debug, Clone, PartialEq)]
pub enum SurveyInput {
    Step { key: StepKey, input: StepInput },
    Review(ReviewInput),
}

/// Partial update of a model step; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepPatch {
    pub song_ratings: Option<Vec<SongRating>>,
    pub model_rating: Option<ModelRatingDraft>,
    pub playlist_ratings: Option<[ModelRatingDraft; PLAYLISTS_PER_STEP]>,
}

/// Partial update of the review; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub age: Option<Option<i64>>,
    pub country: Option<String>,
    pub preference: Option<Option<ModelId>>,
    pub feedback: Option<String>,
}

/// Explicit survey state container
#[derive(Debug)]
pub struct SurveyState<S: SnapshotStore> {
    store: S,
    draft: SurveyDraft,
}

impl<S: SnapshotStore> SurveyState<S> {
    /// Load the stored snapshot, falling back to defaults on any problem
    ///
    /// Never fails: unreadable storage, malformed JSON and invalid contents are
    /// all logged and replaced by the default draft.
    pub fn load(store: S) -> Self {
        let draft = match store.read(STORAGE_KEY) {
            Ok(Some(raw)) => match schema::parse_draft(&raw) {
                Ok(draft) => {
                    debug!("Restored survey snapshot");
                    draft
                }
                Err(SnapshotError::Malformed(e)) => {
                    warn!("Discarding malformed survey snapshot: {}", e);
                    SurveyDraft::default()
                }
                Err(SnapshotError::Invalid(errors)) => {
                    warn!("Discarding invalid survey snapshot: {}", errors);
                    SurveyDraft::default()
                }
            },
            Ok(None) => {
                debug!("No survey snapshot stored, starting from defaults");
                SurveyDraft::default()
            }
            Err(e) => {
                warn!("Failed to read survey snapshot: {}", e);
                SurveyDraft::default()
            }
        };
        Self { store, draft }
    }

    pub fn draft(&self) -> &SurveyDraft {
        &self.draft
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the full draft to the store
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.draft)?;
        self.store.write(STORAGE_KEY, &json)
    }

    /// Apply one input event and persist
    pub fn apply(&mut self, input: SurveyInput) -> Result<()> {
        match input {
            SurveyInput::Step { key, input } => {
                let step = self.draft.step_mut(key).ok_or_else(|| {
                    Error::InvalidInput(format!("{} does not take step inputs", key.as_str()))
                })?;
                match input {
                    StepInput::SongRating {
                        song_id,
                        song_name,
                        rating,
                    } => step.upsert_song_rating(SongRating {
                        song_id,
                        song_name,
                        rating,
                    }),
                    StepInput::RemoveSongRating { song_id } => {
                        step.remove_song_rating(song_id);
                    }
                    StepInput::ModelRating { field, value } => step.model_rating.set(field, value),
                    StepInput::PlaylistRating {
                        playlist,
                        field,
                        value,
                    } => step
                        .playlist_rating_mut(playlist)
                        .ok_or_else(|| {
                            Error::InvalidInput(format!("No swipe playlist {}", playlist))
                        })?
                        .set(field, value),
                }
            }
            SurveyInput::Review(input) => {
                let review = &mut self.draft.review;
                match input {
                    ReviewInput::Age(age) => review.age = age,
                    ReviewInput::Country(country) => review.country = country,
                    ReviewInput::Preference(preference) => review.preference = preference,
                    ReviewInput::Feedback(feedback) => review.feedback = feedback,
                }
            }
        }
        self.save()
    }

    /// Shallow-merge `patch` into the model step at `key` and persist
    pub fn merge_step(&mut self, key: StepKey, patch: StepPatch) -> Result<()> {
        let step = self.draft.step_mut(key).ok_or_else(|| {
            Error::InvalidInput(format!("{} is not a model step", key.as_str()))
        })?;
        if let Some(song_ratings) = patch.song_ratings {
            step.song_ratings = song_ratings;
        }
        if let Some(model_rating) = patch.model_rating {
            step.model_rating = model_rating;
        }
        if let Some(playlist_ratings) = patch.playlist_ratings {
            step.playlist_ratings = playlist_ratings;
        }
        self.save()
    }

    /// Shallow-merge `patch` into the review and persist
    pub fn merge_review(&mut self, patch: ReviewPatch) -> Result<()> {
        let review: &mut ReviewDraft = &mut self.draft.review;
        if let Some(age) = patch.age {
            review.age = age;
        }
        if let Some(country) = patch.country {
            review.country = country;
        }
        if let Some(preference) = patch.preference {
            review.preference = preference;
        }
        if let Some(feedback) = patch.feedback {
            review.feedback = feedback;
        }
        self.save()
    }

    /// Assign the session's model order to the three model steps and persist
    pub fn set_model_order(&mut self, order: &[ModelId]) -> Result<()> {
        self.draft.assign_model_order(order)?;
        self.save()
    }

    /// Drop stored progress and return to defaults
    pub fn reset(&mut self) -> Result<()> {
        self.store.remove(STORAGE_KEY)?;
        self.draft = SurveyDraft::default();
        Ok(())
    }

    /// Consume the container, returning its store
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(song_id: i64, rating: Rating) -> SurveyInput {
        SurveyInput::Step {
            key: StepKey::StepOne,
            input: StepInput::SongRating {
                song_id,
                song_name: format!("Song {}", song_id),
                rating,
            },
        }
    }

    #[test]
    fn test_load_without_snapshot_uses_defaults() {
        let state = SurveyState::load(MemoryStore::new());
        assert_eq!(state.draft(), &SurveyDraft::default());
    }

    #[test]
    fn test_corrupt_json_falls_back_to_defaults() {
        let state = SurveyState::load(MemoryStore::with_entry(STORAGE_KEY, "{not valid"));
        assert_eq!(state.draft(), &SurveyDraft::default());
    }

    #[test]
    fn test_invalid_snapshot_falls_back_to_defaults() {
        let mut draft = SurveyDraft::default();
        draft.step_one.song_ratings.push(SongRating {
            song_id: 1,
            song_name: "A".to_string(),
            rating: Rating::Stars(3),
        });
        draft.review.age = Some(5);
        let raw = serde_json::to_string(&draft).unwrap();

        let state = SurveyState::load(MemoryStore::with_entry(STORAGE_KEY, &raw));
        assert_eq!(state.draft(), &SurveyDraft::default());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut state = SurveyState::load(MemoryStore::new());
        state.apply(song(1, Rating::Stars(4))).unwrap();

        let stored = state.store().get(STORAGE_KEY).expect("snapshot written");
        let restored: SurveyDraft = serde_json::from_str(stored).unwrap();
        assert_eq!(&restored, state.draft());
    }

    #[test]
    fn test_reload_restores_progress() {
        let mut state = SurveyState::load(MemoryStore::new());
        state.apply(song(1, Rating::Stars(4))).unwrap();
        state
            .apply(SurveyInput::Review(ReviewInput::Country("Chile".to_string())))
            .unwrap();

        let reloaded = SurveyState::load(state.into_store());
        assert_eq!(reloaded.draft().step_one.song_ratings.len(), 1);
        assert_eq!(reloaded.draft().review.country, "Chile");
    }

    #[test]
    fn test_upsert_through_container() {
        let mut state = SurveyState::load(MemoryStore::new());
        state.apply(song(1, Rating::Stars(2))).unwrap();
        state.apply(song(2, Rating::Stars(3))).unwrap();
        state.apply(song(1, Rating::Stars(5))).unwrap();

        let ratings = &state.draft().step_one.song_ratings;
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].song_id, 1);
        assert_eq!(ratings[0].rating, Rating::Stars(5));
    }

    #[test]
    fn test_step_input_rejected_for_review_key() {
        let mut state = SurveyState::load(MemoryStore::new());
        let result = state.apply(SurveyInput::Step {
            key: StepKey::Review,
            input: StepInput::RemoveSongRating { song_id: 1 },
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_merge_step_is_shallow() {
        let mut state = SurveyState::load(MemoryStore::new());
        state.apply(song(1, Rating::Stars(4))).unwrap();
        state
            .merge_step(
                StepKey::StepOne,
                StepPatch {
                    model_rating: Some(ModelRatingDraft::default()),
                    ..StepPatch::default()
                },
            )
            .unwrap();

        let step = &state.draft().step_one;
        assert_eq!(step.song_ratings.len(), 1);
        assert_eq!(step.model_rating, ModelRatingDraft::default());
        assert_eq!(step.playlist_ratings, [ModelRatingDraft::filled(); 3]);
    }

    #[test]
    fn test_each_playlist_keeps_its_own_rating() {
        let mut state = SurveyState::load(MemoryStore::new());
        for (playlist, value) in [(1, 5), (2, 2)] {
            state
                .apply(SurveyInput::Step {
                    key: StepKey::StepTwo,
                    input: StepInput::PlaylistRating {
                        playlist,
                        field: ModelRatingField::Satisfaction,
                        value: Some(value),
                    },
                })
                .unwrap();
        }

        let reloaded = SurveyState::load(state.into_store());
        let step = &reloaded.draft().step_two;
        assert_eq!(step.playlist_rating(1).unwrap().satisfaction, Some(5));
        assert_eq!(step.playlist_rating(2).unwrap().satisfaction, Some(2));
        assert_eq!(step.playlist_rating(3).unwrap().satisfaction, Some(1));
        assert_eq!(step.model_rating.satisfaction, Some(1));

        let answer = crate::schema::validate_step(step, StepKey::StepTwo).unwrap();
        assert_eq!(answer.playlist_ratings[0].satisfaction, 5);
        assert_eq!(answer.playlist_ratings[1].satisfaction, 2);
    }

    #[test]
    fn test_playlist_rating_out_of_range_index() {
        let mut state = SurveyState::load(MemoryStore::new());
        let result = state.apply(SurveyInput::Step {
            key: StepKey::StepOne,
            input: StepInput::PlaylistRating {
                playlist: 4,
                field: ModelRatingField::Novelty,
                value: Some(3),
            },
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_set_model_order() {
        let mut state = SurveyState::load(MemoryStore::new());
        state
            .set_model_order(&[ModelId::Model3, ModelId::Model1, ModelId::Model2])
            .unwrap();
        assert_eq!(state.draft().step_one.model_id, ModelId::Model3);
        assert_eq!(state.draft().step_two.model_id, ModelId::Model1);
        assert_eq!(state.draft().step_three.model_id, ModelId::Model2);
        assert!(state.set_model_order(&[ModelId::Model1]).is_err());
    }

    #[test]
    fn test_reset_clears_storage() {
        let mut state = SurveyState::load(MemoryStore::new());
        state.apply(song(1, Rating::Liked(true))).unwrap();
        state.reset().unwrap();
        assert!(state.store().get(STORAGE_KEY).is_none());
        assert_eq!(state.draft(), &SurveyDraft::default());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("storage")).unwrap();
        assert_eq!(store.read(STORAGE_KEY).unwrap(), None);

        store.write(STORAGE_KEY, "{}").unwrap();
        assert_eq!(store.read(STORAGE_KEY).unwrap().as_deref(), Some("{}"));

        store.remove(STORAGE_KEY).unwrap();
        store.remove(STORAGE_KEY).unwrap();
        assert_eq!(store.read(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.read("../escape").is_err());
        assert!(store.read("").is_err());
    }
}
