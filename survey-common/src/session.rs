//! Participant session cookies: terms gate and model presentation order
//!
//! The model order is shuffled once, when terms are first accepted, and kept
//! in a cookie for the rest of the session. Accepting again (e.g. after a
//! reload) keeps the stored order; only an explicit reset makes the next
//! acceptance draw a new one.

use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::ModelId;
use crate::shuffle::shuffle_with;

/// Cookie holding the terms-accepted flag
pub const TERMS_COOKIE: &str = "accepted-terms";

/// Cookie holding the JSON-encoded model order
pub const MODEL_ORDER_COOKIE: &str = "model-order";

/// Minimal cookie access needed by the session logic
pub trait CookieJar {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str);
    fn remove(&mut self, name: &str);
}

/// Cookie jar backed by a map, for tests and non-HTTP front-ends
#[derive(Debug, Clone, Default)]
pub struct MemoryJar {
    cookies: HashMap<String, String>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieJar for MemoryJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    fn remove(&mut self, name: &str) {
        self.cookies.remove(name);
    }
}

/// Outcome of checking a protected route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    RedirectToTerms,
}

/// True if the participant accepted the terms
///
/// Absent cookies and any value other than `true` count as not accepted.
pub fn terms_accepted(jar: &impl CookieJar) -> bool {
    jar.get(TERMS_COOKIE)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Decide whether a protected route may be shown
pub fn gate(jar: &impl CookieJar) -> Gate {
    if terms_accepted(jar) {
        Gate::Allow
    } else {
        Gate::RedirectToTerms
    }
}

/// Stored model order, if present and a permutation of [`ModelId::ALL`]
pub fn model_order(jar: &impl CookieJar) -> Option<Vec<ModelId>> {
    let raw = jar.get(MODEL_ORDER_COOKIE)?;
    let order: Vec<ModelId> = match serde_json::from_str(&raw) {
        Ok(order) => order,
        Err(e) => {
            debug!("Ignoring unreadable model order cookie: {}", e);
            return None;
        }
    };
    is_model_permutation(&order).then_some(order)
}

fn is_model_permutation(order: &[ModelId]) -> bool {
    let mut sorted = order.to_vec();
    sorted.sort();
    sorted == ModelId::ALL
}

/// Record terms acceptance and make sure a model order exists
///
/// Returns the session's model order, drawing a fresh shuffle from `rng` only
/// when no valid order is stored.
pub fn accept_terms<R: Rng + ?Sized>(jar: &mut impl CookieJar, rng: &mut R) -> Vec<ModelId> {
    jar.set(TERMS_COOKIE, "true");

    if let Some(order) = model_order(&*jar) {
        debug!("Keeping existing model order {:?}", order);
        return order;
    }

    let order = shuffle_with(&ModelId::ALL, rng);
    // Serializing a Vec of unit enum variants cannot fail
    let encoded = serde_json::to_string(&order).unwrap_or_default();
    jar.set(MODEL_ORDER_COOKIE, &encoded);
    info!("Assigned model order {:?}", order);
    order
}

/// Forget terms acceptance and model order
pub fn reset_session(jar: &mut impl CookieJar) {
    jar.remove(TERMS_COOKIE);
    jar.remove(MODEL_ORDER_COOKIE);
}
