use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::{primary_subtag, AvailableLanguages};

/// Default cap on a buffered `application/x-www-form-urlencoded` body.
pub const DEFAULT_MAX_FORM_BYTES: usize = 64 * 1024;

/// Language detection settings, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // Cookie
    pub cookie_name: String,
    pub cookie_expires: DateTime<Utc>,
    pub http_only: bool,

    // Resolution
    pub default_language: String,
    pub get_param_name: String,
    #[serde(default)]
    pub available_languages: Option<AvailableLanguages>,

    // Request body
    #[serde(default = "default_max_form_bytes")]
    pub max_form_bytes: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid cookie name '{0}': only visible ASCII without separators is allowed")]
    InvalidCookieName(String),

    #[error("available languages contains an empty entry")]
    EmptyAvailableLanguage,

    #[error("available language '{0}' is not a lower-case primary subtag and would not survive the cookie")]
    NonCanonicalLanguage(String),

    #[error("default language '{0}' is not one of the available languages")]
    DefaultNotAvailable(String),
}

fn default_max_form_bytes() -> usize {
    DEFAULT_MAX_FORM_BYTES
}

impl Default for Config {
    /// The documented preset: `__i18n` cookie valid for a year, `lang`
    /// parameter, English default and an English-only whitelist.
    fn default() -> Self {
        let now = Utc::now();
        Self {
            cookie_name: "__i18n".to_string(),
            cookie_expires: now
                .checked_add_months(Months::new(12))
                .unwrap_or(now + Duration::days(365)),
            http_only: true,
            default_language: "en".to_string(),
            get_param_name: "lang".to_string(),
            available_languages: Some(AvailableLanguages::new(["en"])),
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from `I18N_*` environment variables.
    ///
    /// Unset variables take the preset values, except the whitelist: with
    /// `I18N_AVAILABLE_LANGUAGES` unset or empty every language is accepted.
    pub fn from_env() -> Result<Self> {
        let preset = Self::default();

        let max_age_days: i64 = match std::env::var("I18N_COOKIE_MAX_AGE_DAYS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("I18N_COOKIE_MAX_AGE_DAYS is not a number: {}", v))?,
            Err(_) => 365,
        };
        let cookie_expires = Duration::try_days(max_age_days)
            .and_then(|max_age| Utc::now().checked_add_signed(max_age))
            .context("I18N_COOKIE_MAX_AGE_DAYS is out of range")?;

        let http_only = match std::env::var("I18N_HTTP_ONLY") {
            Ok(v) => parse_bool(&v)
                .with_context(|| format!("I18N_HTTP_ONLY is not a boolean: {}", v))?,
            Err(_) => preset.http_only,
        };

        let config = Self {
            cookie_name: std::env::var("I18N_COOKIE_NAME").unwrap_or(preset.cookie_name),
            cookie_expires,
            http_only,
            default_language: std::env::var("I18N_DEFAULT_LANGUAGE")
                .unwrap_or(preset.default_language),
            get_param_name: std::env::var("I18N_PARAM_NAME").unwrap_or(preset.get_param_name),
            available_languages: std::env::var("I18N_AVAILABLE_LANGUAGES")
                .ok()
                .map(|list| AvailableLanguages::parse_list(&list))
                .filter(|available| !available.is_empty()),
            max_form_bytes: match std::env::var("I18N_MAX_FORM_BYTES") {
                Ok(v) => v
                    .parse()
                    .with_context(|| format!("I18N_MAX_FORM_BYTES is not a number: {}", v))?,
                Err(_) => preset.max_form_bytes,
            },
        };

        config.validate().context("Invalid language detection configuration")?;
        Ok(config)
    }

    /// Check the invariants the resolver relies on.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cookie_name.is_empty() {
            return Err(ConfigError::EmptyField("cookie_name"));
        }
        if !self.cookie_name.chars().all(is_token_char) {
            return Err(ConfigError::InvalidCookieName(self.cookie_name.clone()));
        }
        if self.default_language.is_empty() {
            return Err(ConfigError::EmptyField("default_language"));
        }
        if self.get_param_name.is_empty() {
            return Err(ConfigError::EmptyField("get_param_name"));
        }

        if let Some(available) = self.whitelist() {
            if available.iter().any(str::is_empty) {
                return Err(ConfigError::EmptyAvailableLanguage);
            }
            // The cookie only stores the normalized code, so other spellings
            // are accepted once and rejected on the next request
            if let Some(entry) = available.iter().find(|entry| primary_subtag(entry) != *entry) {
                return Err(ConfigError::NonCanonicalLanguage(entry.to_string()));
            }
            if !available.contains(&self.default_language) {
                return Err(ConfigError::DefaultNotAvailable(self.default_language.clone()));
            }
        }

        Ok(())
    }

    /// The whitelist, if one is configured and non-empty.
    pub fn whitelist(&self) -> Option<&AvailableLanguages> {
        self.available_languages
            .as_ref()
            .filter(|available| !available.is_empty())
    }

    /// Builder-style override of the whitelist.
    pub fn with_available_languages<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_languages = Some(AvailableLanguages::new(codes));
        self
    }

    /// Builder-style removal of the whitelist: every language is accepted.
    pub fn without_whitelist(mut self) -> Self {
        self.available_languages = None;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// RFC 6265 cookie-name is an RFC 2616 token
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
}
