//! axum integration: request signals, the cookie middleware and an extractor.
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use lang_cookie::{Config, Localizer, ResolvedLanguage};
//!
//! async fn index(ResolvedLanguage(lang): ResolvedLanguage) -> String {
//!     format!("language: {}", lang)
//! }
//!
//! # fn build() -> Result<Router, lang_cookie::ConfigError> {
//! let localizer = Localizer::new(Config::default().with_available_languages(["en", "fr"]))?;
//! let app = lang_cookie::with_language_detection(Router::new().route("/", get(index)), localizer);
//! # Ok(app)
//! # }
//! ```

use std::sync::Arc;

use axum::{
    async_trait,
    body::{to_bytes, Body},
    extract::{FromRequestParts, Request, State},
    http::{
        header::{ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE},
        request::Parts,
        HeaderMap, Method, StatusCode, Uri,
    },
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, ConfigError};
use crate::cookie::{has_set_cookie, request_cookie, write_cookie};
use crate::resolver::{resolve_with_source, LanguageSignals, Resolution};

/// Shared handle to the language detection configuration.
///
/// Cloning is cheap; every clone reads the same immutable [`Config`].
#[derive(Debug, Clone)]
pub struct Localizer {
    config: Arc<Config>,
}

impl Localizer {
    /// Validate the configuration and wrap it for sharing across requests.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the language for a request from its headers and query string.
    ///
    /// Handlers can call this at any time; it does not need the middleware.
    pub fn language_code(&self, parts: &Parts) -> String {
        self.resolve(&HttpSignals::from_parts(parts)).code
    }

    pub fn resolve(&self, signals: &HttpSignals<'_>) -> Resolution {
        resolve_with_source(signals, &self.config)
    }

    /// Write the language cookie onto response headers.
    pub fn write_cookie(&self, headers: &mut HeaderMap, language_code: &str) {
        write_cookie(headers, language_code, &self.config);
    }
}

impl Default for Localizer {
    /// Localizer over the default preset.
    fn default() -> Self {
        Self {
            config: Arc::new(Config::default()),
        }
    }
}

/// Request signals backed by `http` types.
#[derive(Debug, Clone, Copy)]
pub struct HttpSignals<'a> {
    headers: &'a HeaderMap,
    query: Option<&'a str>,
    form: Option<&'a [u8]>,
}

impl<'a> HttpSignals<'a> {
    pub fn new(headers: &'a HeaderMap, uri: &'a Uri) -> Self {
        Self {
            headers,
            query: uri.query(),
            form: None,
        }
    }

    pub fn from_parts(parts: &'a Parts) -> Self {
        Self::new(&parts.headers, &parts.uri)
    }

    /// Add an `application/x-www-form-urlencoded` body. Its values are
    /// consulted before the query string.
    ///
    /// `multipart/form-data` bodies are not decoded; a language sent only as
    /// a multipart field is not seen.
    pub fn with_form(mut self, body: &'a [u8]) -> Self {
        self.form = Some(body);
        self
    }
}

impl LanguageSignals for HttpSignals<'_> {
    fn param(&self, name: &str) -> Option<String> {
        self.form
            .and_then(|body| find_param(body, name))
            .or_else(|| self.query.and_then(|query| find_param(query.as_bytes(), name)))
    }

    fn cookie(&self, name: &str) -> Option<String> {
        request_cookie(self.headers, name)
    }

    fn accept_language(&self) -> Option<String> {
        self.headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

fn find_param(encoded: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// The language resolved for the current request.
///
/// Stored in the request extensions by [`set_language_cookie`]; extracting it
/// without the middleware installed is a server error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLanguage(pub String);

impl ResolvedLanguage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResolvedLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ResolvedLanguage
where
    S: Send + Sync,
{
    type Rejection = LocalizeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedLanguage>()
            .cloned()
            .ok_or(LocalizeError::MissingLanguage)
    }
}

#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("language detection middleware is not installed")]
    MissingLanguage,
}

impl IntoResponse for LocalizeError {
    fn into_response(self) -> Response {
        let status = match &self {
            LocalizeError::MissingLanguage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Middleware: resolve the language, expose it to handlers and persist it.
///
/// Install with [`axum::middleware::from_fn_with_state`] or
/// [`with_language_detection`]. A cookie of the same name set by the handler
/// itself is left untouched.
///
/// Every request is forwarded. Form bodies are only buffered when they
/// declare a `Content-Length` within [`Config::max_form_bytes`]; anything
/// else reaches the handler untouched and the language comes from the query
/// string, cookie or header.
pub async fn set_language_cookie(
    State(localizer): State<Localizer>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let (resolution, body) = if should_buffer_form(&parts, localizer.config.max_form_bytes) {
        match to_bytes(body, localizer.config.max_form_bytes).await {
            Ok(form) => {
                let resolution =
                    localizer.resolve(&HttpSignals::from_parts(&parts).with_form(&form));
                (resolution, Body::from(form))
            }
            Err(e) => {
                // The stream is spent; the handler would fail reading it too
                warn!("Failed to read form body, ignoring it: {}", e);
                (localizer.resolve(&HttpSignals::from_parts(&parts)), Body::empty())
            }
        }
    } else {
        (localizer.resolve(&HttpSignals::from_parts(&parts)), body)
    };

    parts
        .extensions
        .insert(ResolvedLanguage(resolution.code.clone()));

    let mut response = next.run(axum::http::Request::from_parts(parts, body)).await;

    if has_set_cookie(response.headers(), &localizer.config.cookie_name) {
        debug!(
            cookie = %localizer.config.cookie_name,
            "Handler set the language cookie, keeping it"
        );
    } else {
        localizer.write_cookie(response.headers_mut(), &resolution.code);
    }

    response
}

/// Wrap a router so every request goes through [`set_language_cookie`].
pub fn with_language_detection<S>(router: Router<S>, localizer: Localizer) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(localizer, set_language_cookie))
}

fn carries_form(parts: &Parts) -> bool {
    let body_method = matches!(parts.method, Method::POST | Method::PUT | Method::PATCH);
    let urlencoded = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false);

    body_method && urlencoded
}

fn should_buffer_form(parts: &Parts, limit: usize) -> bool {
    if !carries_form(parts) {
        return false;
    }

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<usize>().ok());

    match declared {
        Some(length) if length <= limit => true,
        Some(length) => {
            debug!(length, limit, "Form body over the size limit, not reading it");
            false
        }
        None => false,
    }
}
