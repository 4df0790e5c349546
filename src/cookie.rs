//! Persisting the resolved language in a `Set-Cookie` header.

use std::fmt;

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::Config;
use crate::i18n::{primary_subtag, sanitize_cookie_value};

/// The language cookie as it will be sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub http_only: bool,
    pub path: &'static str,
}

impl LanguageCookie {
    /// Build the cookie for a resolved language code.
    ///
    /// The code is lower-cased, cut down to its primary subtag (`EN-us`
    /// becomes `en`) and stripped of anything not allowed in a cookie value.
    /// When nothing is left, the default language is written instead.
    pub fn new(language_code: &str, config: &Config) -> Self {
        let mut value = sanitize_cookie_value(&primary_subtag(language_code));
        if value.is_empty() {
            value = sanitize_cookie_value(&primary_subtag(&config.default_language));
        }

        Self {
            name: config.cookie_name.clone(),
            value,
            expires: config.cookie_expires,
            http_only: config.http_only,
            path: "/",
        }
    }

    /// Render the `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LanguageCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path={}; Expires={}",
            self.name,
            self.value,
            self.path,
            http_date(&self.expires)
        )?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// Anything a `Set-Cookie` header can be written to.
pub trait CookieSink {
    /// Set the cookie, replacing an earlier one with the same name.
    fn set_cookie(&mut self, cookie: &LanguageCookie);
}

impl CookieSink for HeaderMap {
    fn set_cookie(&mut self, cookie: &LanguageCookie) {
        let value = match HeaderValue::from_str(&cookie.header_value()) {
            Ok(value) => value,
            Err(e) => {
                warn!(cookie = %cookie.name, "Skipping unrepresentable language cookie: {}", e);
                return;
            }
        };

        remove_set_cookie(self, &cookie.name);
        self.append(SET_COOKIE, value);
    }
}

/// Normalize a resolved language code and write it as a cookie.
pub fn write_cookie<S: CookieSink + ?Sized>(sink: &mut S, language_code: &str, config: &Config) {
    sink.set_cookie(&LanguageCookie::new(language_code, config));
}

/// Check if the headers already carry a `Set-Cookie` for `name`.
pub fn has_set_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| set_cookie_name(value) == Some(name))
}

/// Find a cookie by name across every `Cookie` request header.
///
/// The first match wins. Surrounding double quotes are removed from the value.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| parse_cookie(header, name))
        .map(|value| unquote(value).to_string())
}

/// Parse a specific cookie from a `Cookie` header string.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn set_cookie_name(value: &HeaderValue) -> Option<&str> {
    let header = value.to_str().ok()?;
    let (name, _) = header.split_once('=')?;
    Some(name.trim())
}

fn remove_set_cookie(headers: &mut HeaderMap, name: &str) {
    if !has_set_cookie(headers, name) {
        return;
    }

    let kept: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter(|value| set_cookie_name(value) != Some(name))
        .cloned()
        .collect();

    headers.remove(SET_COOKIE);
    for value in kept {
        headers.append(SET_COOKIE, value);
    }
}

/// IMF-fixdate, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`.
fn http_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
