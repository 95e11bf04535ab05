//! Playlist catalog
//!
//! Each model has three playlists, each built from one seeded song and the
//! songs the model recommended for it. The catalog is read from TOML:
//!
//! ```toml
//! [[playlist]]
//! model = "model1"
//! number = 1
//! seed = { id = 10, name = "Seed song" }
//! recommendations = [
//!     { id = 11, name = "First pick" },
//!     { id = 12, name = "Second pick" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{ModelId, Song, StepDraft, SurveyDraft};
use crate::steps::{Route, StepKind};
use crate::{Error, Result};

/// Songs a model recommended from one seeded song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub model: ModelId,
    /// 1-based playlist number within the model
    pub number: u8,
    pub seed: Song,
    pub recommendations: Vec<Song>,
}

impl Playlist {
    /// Number of this playlist's recommendations rated in `draft`
    pub fn rated_count(&self, draft: &StepDraft) -> usize {
        self.recommendations
            .iter()
            .filter(|song| draft.song_rating(song.id).is_some())
            .count()
    }

    /// True once every recommendation has a rating in `draft`
    pub fn is_finished(&self, draft: &StepDraft) -> bool {
        self.rated_count(draft) == self.recommendations.len()
    }

    /// First recommendation without a rating in `draft`
    pub fn next_unrated(&self, draft: &StepDraft) -> Option<&Song> {
        self.recommendations
            .iter()
            .find(|song| draft.song_rating(song.id).is_none())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    playlist: Vec<Playlist>,
}

/// All playlists offered in the survey
#[derive(Debug, Clone, Default)]
pub struct PlaylistCatalog {
    playlists: Vec<Playlist>,
}

impl PlaylistCatalog {
    /// Build a catalog, rejecting duplicate (model, number) pairs
    pub fn new(playlists: Vec<Playlist>) -> Result<Self> {
        let mut seen = HashSet::new();
        for p in &playlists {
            if !seen.insert((p.model, p.number)) {
                return Err(Error::Config(format!(
                    "Duplicate playlist {} for {}",
                    p.number, p.model
                )));
            }
            let mut ids = HashSet::new();
            if let Some(song) = p.recommendations.iter().find(|s| !ids.insert(s.id)) {
                return Err(Error::Config(format!(
                    "Playlist {} for {} recommends song {} twice",
                    p.number, p.model, song.id
                )));
            }
        }
        Ok(Self { playlists })
    }

    /// Parse a catalog from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.playlist)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&content)?;
        info!(
            "Loaded {} playlists from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    pub fn playlist(&self, model: ModelId, number: u8) -> Option<&Playlist> {
        self.playlists
            .iter()
            .find(|p| p.model == model && p.number == number)
    }

    /// Playlist shown at `route` for the model assigned in `draft`
    ///
    /// `None` for major steps, and for playlists missing from the catalog.
    pub fn for_route(&self, route: Route, draft: &SurveyDraft) -> Option<&Playlist> {
        let descriptor = route.descriptor();
        let StepKind::Minor { sub_index, .. } = descriptor.kind else {
            return None;
        };
        let model = draft.step(descriptor.answer)?.model_id;
        let found = self.playlist(model, sub_index);
        if found.is_none() {
            debug!("No playlist {} for {} in catalog", sub_index, model);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, SongRating, StepKey};

    const CATALOG: &str = r#"
[[playlist]]
model = "model1"
number = 1
seed = { id = 10, name = "Seed" }
recommendations = [
    { id = 11, name = "Eleven" },
    { id = 12, name = "Twelve" },
]

[[playlist]]
model = "model2"
number = 1
seed = { id = 20, name = "Seed" }
recommendations = [{ id = 21, name = "Twenty-one" }]
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = PlaylistCatalog::from_toml(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        let p = catalog.playlist(ModelId::Model1, 1).unwrap();
        assert_eq!(p.seed.id, 10);
        assert_eq!(p.recommendations.len(), 2);
        assert!(catalog.playlist(ModelId::Model3, 1).is_none());
    }

    #[test]
    fn test_duplicate_playlist_rejected() {
        let doubled = format!("{}\n{}", CATALOG, CATALOG);
        assert!(PlaylistCatalog::from_toml(&doubled).is_err());
    }

    #[test]
    fn test_for_route_uses_assigned_model() {
        let catalog = PlaylistCatalog::from_toml(CATALOG).unwrap();
        let mut draft = SurveyDraft::default();
        draft.step_one.model_id = ModelId::Model2;

        let p = catalog.for_route(Route::StepOnePlaylistOne, &draft).unwrap();
        assert_eq!(p.model, ModelId::Model2);
        assert!(catalog.for_route(Route::StepOne, &draft).is_none());
        assert!(catalog.for_route(Route::StepOnePlaylistTwo, &draft).is_none());
    }

    #[test]
    fn test_finished_counts_only_playlist_songs() {
        let catalog = PlaylistCatalog::from_toml(CATALOG).unwrap();
        let p = catalog.playlist(ModelId::Model1, 1).unwrap();
        let mut draft = StepDraft::new(StepKey::StepOne, ModelId::Model1);
        for id in [99, 11] {
            draft.upsert_song_rating(SongRating {
                song_id: id,
                song_name: String::new(),
                rating: Rating::Liked(true),
            });
        }
        assert_eq!(p.rated_count(&draft), 1);
        assert!(!p.is_finished(&draft));
        assert_eq!(p.next_unrated(&draft).unwrap().id, 12);
    }
}
