//! Swipe-style playlist steps
//!
//! A `SwipeSession` walks one playlist's recommendations, turning like/dislike
//! swipes into song-rating events for the parent step's answer. It keeps the
//! swipe history so the latest swipe can be undone. The history is derived
//! per page view and never persisted on its own. The model rating entered
//! after the deck is empty belongs to this playlist alone.

use crate::catalog::Playlist;
use crate::models::{ModelRatingField, Rating, Song, StepDraft, StepKey};
use crate::state::{StepInput, SurveyInput};

/// One forward swipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeRecord {
    pub song: Song,
    pub liked: bool,
}

/// Swipe progress through one playlist
#[derive(Debug, Clone)]
pub struct SwipeSession {
    key: StepKey,
    playlist: Playlist,
    history: Vec<SwipeRecord>,
}

impl SwipeSession {
    /// Start swiping `playlist`, writing ratings into the answer at `key`
    pub fn new(key: StepKey, playlist: Playlist) -> Self {
        Self {
            key,
            playlist,
            history: Vec::new(),
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn history(&self) -> &[SwipeRecord] {
        &self.history
    }

    /// Song currently on top of the deck
    pub fn current<'a>(&'a self, draft: &StepDraft) -> Option<&'a Song> {
        self.playlist.next_unrated(draft)
    }

    /// True when every recommendation in the playlist has a rating
    ///
    /// Reaching this reveals the model rating sub-form.
    pub fn is_finished(&self, draft: &StepDraft) -> bool {
        self.playlist.is_finished(draft)
    }

    /// Swipe the current song; `None` once the deck is empty
    pub fn swipe(&mut self, draft: &StepDraft, liked: bool) -> Option<SurveyInput> {
        let song = self.current(draft)?.clone();
        let input = SurveyInput::Step {
            key: self.key,
            input: StepInput::SongRating {
                song_id: song.id,
                song_name: song.name.clone(),
                rating: Rating::Liked(liked),
            },
        };
        self.history.push(SwipeRecord { song, liked });
        Some(input)
    }

    /// Rate the model for this playlist
    pub fn rate_model(&self, field: ModelRatingField, value: Option<i64>) -> SurveyInput {
        SurveyInput::Step {
            key: self.key,
            input: StepInput::PlaylistRating {
                playlist: self.playlist.number,
                field,
                value,
            },
        }
    }

    /// Undo the latest swipe; `None` when there is nothing to undo
    ///
    /// The rating is deleted outright rather than restored, since each song is
    /// swiped at most once per playlist.
    pub fn undo(&mut self) -> Option<SurveyInput> {
        let last = self.history.pop()?;
        Some(SurveyInput::Step {
            key: self.key,
            input: StepInput::RemoveSongRating {
                song_id: last.song.id,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelId;
    use crate::state::{MemoryStore, SurveyState};

    fn playlist(count: i64) -> Playlist {
        numbered_playlist(1, count)
    }

    fn numbered_playlist(number: u8, count: i64) -> Playlist {
        Playlist {
            model: ModelId::Model1,
            number,
            seed: Song {
                id: 0,
                name: "Seed".to_string(),
            },
            recommendations: (1..=count)
                .map(|id| Song {
                    id,
                    name: format!("Song {}", id),
                })
                .collect(),
        }
    }

    fn swipe(
        state: &mut SurveyState<MemoryStore>,
        session: &mut SwipeSession,
        liked: bool,
    ) -> bool {
        match session.swipe(&state.draft().step_one, liked) {
            Some(input) => {
                state.apply(input).unwrap();
                true
            }
            None => false,
        }
    }

    #[test]
    fn test_swipes_record_boolean_ratings() {
        let mut state = SurveyState::load(MemoryStore::new());
        let mut session = SwipeSession::new(StepKey::StepOne, playlist(3));

        assert!(swipe(&mut state, &mut session, true));
        assert!(swipe(&mut state, &mut session, false));

        let ratings = &state.draft().step_one.song_ratings;
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].rating, Rating::Liked(true));
        assert_eq!(ratings[1].rating, Rating::Liked(false));
        assert_eq!(session.current(&state.draft().step_one).unwrap().id, 3);
    }

    #[test]
    fn test_undo_removes_latest_rating() {
        let mut state = SurveyState::load(MemoryStore::new());
        let mut session = SwipeSession::new(StepKey::StepOne, playlist(5));
        for _ in 0..4 {
            assert!(swipe(&mut state, &mut session, true));
        }

        let undo = session.undo().expect("history not empty");
        state.apply(undo).unwrap();

        let step = &state.draft().step_one;
        assert_eq!(step.song_ratings.len(), 3);
        assert!(step.song_rating(4).is_none());
        assert_eq!(session.history().len(), 3);
        // The undone song is back on top of the deck
        assert_eq!(session.current(step).unwrap().id, 4);
    }

    #[test]
    fn test_undo_with_empty_history_is_noop() {
        let mut session = SwipeSession::new(StepKey::StepOne, playlist(2));
        assert!(session.undo().is_none());
    }

    #[test]
    fn test_finished_when_every_song_rated() {
        let mut state = SurveyState::load(MemoryStore::new());
        let mut session = SwipeSession::new(StepKey::StepOne, playlist(2));

        assert!(!session.is_finished(&state.draft().step_one));
        swipe(&mut state, &mut session, true);
        swipe(&mut state, &mut session, false);
        assert!(session.is_finished(&state.draft().step_one));
        assert!(!swipe(&mut state, &mut session, true));
    }

    #[test]
    fn test_model_rating_targets_its_playlist() {
        let mut state = SurveyState::load(MemoryStore::new());
        let first = SwipeSession::new(StepKey::StepOne, numbered_playlist(1, 1));
        let second = SwipeSession::new(StepKey::StepOne, numbered_playlist(2, 1));

        state
            .apply(first.rate_model(ModelRatingField::Relevance, Some(5)))
            .unwrap();
        state
            .apply(second.rate_model(ModelRatingField::Relevance, Some(3)))
            .unwrap();

        let step = &state.draft().step_one;
        assert_eq!(step.playlist_rating(1).unwrap().relevance, Some(5));
        assert_eq!(step.playlist_rating(2).unwrap().relevance, Some(3));
        assert_eq!(step.model_rating.relevance, Some(1));
    }
}
