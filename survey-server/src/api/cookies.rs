//! Cookie access for request handlers
//!
//! `RequestCookies` reads the `Cookie` header and records every change so the
//! handler can turn it into `Set-Cookie` headers on the response. Values are
//! percent-encoded since the model order is stored as JSON.

use axum::http::{header, HeaderMap, HeaderValue};
use std::collections::HashMap;
use survey_common::session::CookieJar;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CookieChange {
    Set { name: String, value: String },
    Remove { name: String },
}

/// Cookies of one request plus pending changes
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    values: HashMap<String, String>,
    changes: Vec<CookieChange>,
    secure: bool,
}

impl RequestCookies {
    /// Parse every `Cookie` header in `headers`
    ///
    /// Later pairs with the same name win. Values that fail to decode are kept
    /// as sent.
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let mut values = HashMap::new();
        for header_value in headers.get_all(header::COOKIE) {
            let Ok(raw) = header_value.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                let Some((name, value)) = pair.trim().split_once('=') else {
                    continue;
                };
                let value = value.trim().trim_matches('"');
                let decoded = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                values.insert(name.trim().to_string(), decoded);
            }
        }
        Self {
            values,
            changes: Vec::new(),
            secure,
        }
    }

    /// `Set-Cookie` header values for the recorded changes, in order
    pub fn set_cookie_values(&self) -> Vec<String> {
        let secure = if self.secure { "; Secure" } else { "" };
        self.changes
            .iter()
            .map(|change| match change {
                CookieChange::Set { name, value } => format!(
                    "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
                    name,
                    urlencoding::encode(value),
                    secure
                ),
                CookieChange::Remove { name } => format!(
                    "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{}",
                    name, secure
                ),
            })
            .collect()
    }

    /// Append `Set-Cookie` headers for the recorded changes
    pub fn write_to(&self, headers: &mut HeaderMap) {
        for cookie in self.set_cookie_values() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => warn!("Dropping unencodable cookie {:?}: {}", cookie, e),
            }
        }
    }
}

impl CookieJar for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
        self.changes.push(CookieChange::Set {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove(&mut self, name: &str) {
        self.values.remove(name);
        self.changes.push(CookieChange::Remove {
            name: name.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_common::models::ModelId;
    use survey_common::session::{self, MODEL_ORDER_COOKIE, TERMS_COOKIE};

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_parses_cookie_header() {
        let cookies = RequestCookies::from_headers(&headers("a=1; accepted-terms=true"), false);
        assert_eq!(cookies.get("a").as_deref(), Some("1"));
        assert!(session::terms_accepted(&cookies));
    }

    #[test]
    fn test_json_value_round_trips_through_header() {
        let mut cookies = RequestCookies::default();
        cookies.set(MODEL_ORDER_COOKIE, r#"["model2","model3","model1"]"#);

        let set_cookie = cookies.set_cookie_values().remove(0);
        let pair = set_cookie.split(';').next().unwrap();
        let reparsed = RequestCookies::from_headers(&headers(pair), false);

        assert_eq!(
            session::model_order(&reparsed),
            Some(vec![ModelId::Model2, ModelId::Model3, ModelId::Model1])
        );
    }

    #[test]
    fn test_remove_expires_cookie() {
        let mut cookies = RequestCookies::from_headers(&headers("accepted-terms=true"), true);
        cookies.remove(TERMS_COOKIE);

        let values = cookies.set_cookie_values();
        assert_eq!(values.len(), 1);
        assert!(values[0].starts_with("accepted-terms=;"));
        assert!(values[0].contains("Max-Age=0"));
        assert!(values[0].ends_with("; Secure"));
        assert!(!session::terms_accepted(&cookies));
    }
}
