//! Per-request language detection persisted in a cookie.
//!
//! Each request resolves to a single language code from, in order, an
//! explicit query/form parameter, the language cookie, the first
//! `Accept-Language` entry, or the configured default. The code is then
//! normalized to its lower-cased primary subtag and written back as a cookie.
//! Content is never translated here.

pub mod config;
pub mod cookie;
pub mod i18n;
pub mod middleware;
pub mod resolver;

pub use config::{Config, ConfigError};
pub use cookie::{write_cookie, CookieSink, LanguageCookie};
pub use i18n::AvailableLanguages;
pub use middleware::{
    set_language_cookie, with_language_detection, HttpSignals, LocalizeError, Localizer,
    ResolvedLanguage,
};
pub use resolver::{resolve, resolve_with_source, LanguageSignals, LanguageSource, Resolution};
