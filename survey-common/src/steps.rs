//! Survey step order and navigation
//!
//! The route table below is the contract with the navigation UI. Route strings
//! are persisted in links and client state, so entries must never be renumbered
//! or renamed.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::models::StepKey;
use crate::Error;

/// Identity of one step in the survey sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    StepOne,
    StepOnePlaylistOne,
    StepOnePlaylistTwo,
    StepOnePlaylistThree,
    StepTwo,
    StepTwoPlaylistOne,
    StepTwoPlaylistTwo,
    StepTwoPlaylistThree,
    StepThree,
    StepThreePlaylistOne,
    StepThreePlaylistTwo,
    StepThreePlaylistThree,
    Review,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::StepOne => "step-one",
            Route::StepOnePlaylistOne => "step-one/playlist-one",
            Route::StepOnePlaylistTwo => "step-one/playlist-two",
            Route::StepOnePlaylistThree => "step-one/playlist-three",
            Route::StepTwo => "step-two",
            Route::StepTwoPlaylistOne => "step-two/playlist-one",
            Route::StepTwoPlaylistTwo => "step-two/playlist-two",
            Route::StepTwoPlaylistThree => "step-two/playlist-three",
            Route::StepThree => "step-three",
            Route::StepThreePlaylistOne => "step-three/playlist-one",
            Route::StepThreePlaylistTwo => "step-three/playlist-two",
            Route::StepThreePlaylistThree => "step-three/playlist-three",
            Route::Review => "review",
        }
    }

    /// Descriptor of this route in [`STEP_ORDER`]
    pub fn descriptor(&self) -> &'static StepDescriptor {
        &STEP_ORDER[self.position()]
    }

    /// Zero-based position in [`STEP_ORDER`]
    pub fn position(&self) -> usize {
        // Every Route variant has exactly one entry in STEP_ORDER
        STEP_ORDER
            .iter()
            .position(|d| d.route == *self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches('/');
        let trimmed = trimmed.strip_prefix("survey/").unwrap_or(trimmed);
        STEP_ORDER
            .iter()
            .map(|d| d.route)
            .find(|r| r.as_str() == trimmed)
            .ok_or_else(|| Error::NotFound(format!("Unknown step route: {}", s)))
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where a participant goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A step inside the sequence
    Step(Route),
    /// Terminal page after a successful submission
    ThankYou,
    /// Root page holding the terms gate
    Terms,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Step(route) => route.as_str(),
            Destination::ThankYou => "thank-you",
            Destination::Terms => "",
        }
    }
}

impl Serialize for Destination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Position of a step in the major/minor hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StepKind {
    /// Top-level stage, 1-based among major steps
    Major { index: u8 },
    /// Playlist sub-step under major step `parent_index`
    #[serde(rename_all = "camelCase")]
    Minor { parent_index: u8, sub_index: u8 },
}

impl StepKind {
    /// Major index this step belongs to (its own index for major steps)
    pub fn major_index(&self) -> u8 {
        match self {
            StepKind::Major { index } => *index,
            StepKind::Minor { parent_index, .. } => *parent_index,
        }
    }
}

/// Input form presented at a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepForm {
    /// 1..=5 star ratings per song plus the model rating sub-form
    StarRating,
    /// Like/dislike swipes; the model rating sub-form opens once every song is rated
    Swipe,
    /// Demographics, preferred model and free-text feedback
    Review,
}

/// One entry of the step order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    #[serde(flatten)]
    pub kind: StepKind,
    pub route: Route,
    /// Aggregate key this step writes into
    pub answer: StepKey,
    pub form: StepForm,
    /// Submit target replacing the structural next step
    #[serde(skip)]
    pub next_override: Option<Destination>,
}

const fn major(index: u8, route: Route, answer: StepKey, form: StepForm) -> StepDescriptor {
    StepDescriptor {
        kind: StepKind::Major { index },
        route,
        answer,
        form,
        next_override: None,
    }
}

const fn playlist(parent_index: u8, sub_index: u8, route: Route, answer: StepKey) -> StepDescriptor {
    StepDescriptor {
        kind: StepKind::Minor {
            parent_index,
            sub_index,
        },
        route,
        answer,
        form: StepForm::Swipe,
        next_override: None,
    }
}

/// The fixed order of every survey step
pub static STEP_ORDER: [StepDescriptor; 13] = [
    major(1, Route::StepOne, StepKey::StepOne, StepForm::StarRating),
    playlist(1, 1, Route::StepOnePlaylistOne, StepKey::StepOne),
    playlist(1, 2, Route::StepOnePlaylistTwo, StepKey::StepOne),
    playlist(1, 3, Route::StepOnePlaylistThree, StepKey::StepOne),
    major(2, Route::StepTwo, StepKey::StepTwo, StepForm::StarRating),
    playlist(2, 1, Route::StepTwoPlaylistOne, StepKey::StepTwo),
    playlist(2, 2, Route::StepTwoPlaylistTwo, StepKey::StepTwo),
    playlist(2, 3, Route::StepTwoPlaylistThree, StepKey::StepTwo),
    major(3, Route::StepThree, StepKey::StepThree, StepForm::StarRating),
    playlist(3, 1, Route::StepThreePlaylistOne, StepKey::StepThree),
    playlist(3, 2, Route::StepThreePlaylistTwo, StepKey::StepThree),
    playlist(3, 3, Route::StepThreePlaylistThree, StepKey::StepThree),
    StepDescriptor {
        kind: StepKind::Major { index: 4 },
        route: Route::Review,
        answer: StepKey::Review,
        form: StepForm::Review,
        next_override: Some(Destination::ThankYou),
    },
];

/// First step of the survey
pub fn first() -> Route {
    STEP_ORDER[0].route
}

/// Step after `current`, wrapping from the last step back to the first
///
/// The wrap-around mirrors the navigation arrows of the survey UI, which cycle
/// through the steps. Submitting the last step does not use this; see
/// [`submit_target`].
pub fn next(current: Route) -> Route {
    let i = current.position();
    STEP_ORDER[(i + 1) % STEP_ORDER.len()].route
}

/// Step before `current`, wrapping from the first step to the last
pub fn previous(current: Route) -> Route {
    let len = STEP_ORDER.len();
    let i = current.position();
    STEP_ORDER[(i + len - 1) % len].route
}

/// True if `current` is major step `major_index` or one of its playlists
///
/// Presentation only; nothing is gated on it.
pub fn is_active_parent(current: Route, major_index: u8) -> bool {
    current.descriptor().kind.major_index() == major_index
}

/// Where a successful submit at `current` leads
pub fn submit_target(current: Route) -> Destination {
    let descriptor = current.descriptor();
    descriptor
        .next_override
        .unwrap_or_else(|| Destination::Step(next(current)))
}

/// Playlist sub-step `sub_index` under major step `major_index`
pub fn playlist_route(major_index: u8, sub_index: u8) -> Option<Route> {
    STEP_ORDER
        .iter()
        .find(|d| {
            d.kind
                == StepKind::Minor {
                    parent_index: major_index,
                    sub_index,
                }
        })
        .map(|d| d.route)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_indices_contiguous_from_one() {
        let majors: Vec<u8> = STEP_ORDER
            .iter()
            .filter_map(|d| match d.kind {
                StepKind::Major { index } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(majors, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sub_indices_contiguous_per_parent() {
        for parent in 1..=4u8 {
            let subs: Vec<u8> = STEP_ORDER
                .iter()
                .filter_map(|d| match d.kind {
                    StepKind::Minor {
                        parent_index,
                        sub_index,
                    } if parent_index == parent => Some(sub_index),
                    _ => None,
                })
                .collect();
            let expected: Vec<u8> = (1..=subs.len() as u8).collect();
            assert_eq!(subs, expected, "parent {}", parent);
        }
    }

    #[test]
    fn test_minor_steps_follow_their_parent() {
        let mut current_major = 0;
        for d in STEP_ORDER.iter() {
            match d.kind {
                StepKind::Major { index } => current_major = index,
                StepKind::Minor { parent_index, .. } => assert_eq!(parent_index, current_major),
            }
        }
    }

    #[test]
    fn test_routes_unique_and_parse_back() {
        for (i, d) in STEP_ORDER.iter().enumerate() {
            assert_eq!(d.route.position(), i);
            assert_eq!(d.route.as_str().parse::<Route>().unwrap(), d.route);
        }
        assert_eq!("/survey/review".parse::<Route>().unwrap(), Route::Review);
        assert!("thank-you".parse::<Route>().is_err());
    }

    #[test]
    fn test_next_and_previous() {
        assert_eq!(next(Route::StepOne), Route::StepOnePlaylistOne);
        assert_eq!(next(Route::StepOnePlaylistThree), Route::StepTwo);
        assert_eq!(previous(Route::StepTwo), Route::StepOnePlaylistThree);
    }

    #[test]
    fn test_navigation_wraps_around() {
        assert_eq!(next(Route::Review), Route::StepOne);
        assert_eq!(previous(Route::StepOne), Route::Review);
    }

    #[test]
    fn test_next_previous_are_inverse() {
        for d in STEP_ORDER.iter() {
            assert_eq!(previous(next(d.route)), d.route);
        }
    }

    #[test]
    fn test_is_active_parent() {
        assert!(is_active_parent(Route::StepTwo, 2));
        assert!(is_active_parent(Route::StepTwoPlaylistThree, 2));
        assert!(!is_active_parent(Route::StepTwoPlaylistThree, 1));
        assert!(is_active_parent(Route::Review, 4));
    }

    #[test]
    fn test_submit_target_override() {
        assert_eq!(submit_target(Route::Review), Destination::ThankYou);
        assert_eq!(
            submit_target(Route::StepOne),
            Destination::Step(Route::StepOnePlaylistOne)
        );
        assert_eq!(
            submit_target(Route::StepThreePlaylistThree),
            Destination::Step(Route::Review)
        );
    }

    #[test]
    fn test_playlist_route_lookup() {
        assert_eq!(playlist_route(2, 3), Some(Route::StepTwoPlaylistThree));
        assert_eq!(playlist_route(4, 1), None);
    }

    #[test]
    fn test_descriptor_serializes_kind_fields() {
        let json = serde_json::to_value(Route::StepOnePlaylistTwo.descriptor()).unwrap();
        assert_eq!(json["kind"], "minor");
        assert_eq!(json["parentIndex"], 1);
        assert_eq!(json["subIndex"], 2);
        assert_eq!(json["route"], "step-one/playlist-two");
        assert_eq!(json["answer"], "stepOne");
    }
}
