//! Language resolution: pick the single effective language for a request.
//!
//! Signals are consulted in a fixed order and the first one that yields a
//! value wins:
//!
//! 1. the explicit parameter named [`Config::get_param_name`], when non-empty
//! 2. the cookie named [`Config::cookie_name`], when present at all
//! 3. the first comma-separated entry of `Accept-Language`, taken verbatim
//! 4. [`Config::default_language`]
//!
//! With a whitelist configured, the value from whichever source stopped the
//! chain is checked against it and replaced by the default when it is not a
//! member. An empty value is replaced by the default as well, so the result
//! is never empty.

use tracing::debug;

use crate::config::Config;

/// Read-only view of the request data the resolver needs.
///
/// Any HTTP toolkit can implement this; see
/// [`HttpSignals`](crate::middleware::HttpSignals) for the axum one.
pub trait LanguageSignals {
    /// Value of the query/form parameter called `name`, if present.
    fn param(&self, name: &str) -> Option<String>;

    /// Value of the request cookie called `name`, if present.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Raw `Accept-Language` header value, if present.
    fn accept_language(&self) -> Option<String>;
}

/// Which signal produced the resolved language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSource {
    Param,
    Cookie,
    Header,
    Default,
}

impl LanguageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageSource::Param => "param",
            LanguageSource::Cookie => "cookie",
            LanguageSource::Header => "header",
            LanguageSource::Default => "default",
        }
    }
}

impl std::fmt::Display for LanguageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The effective language code, never empty
    pub code: String,

    /// The signal that stopped the precedence chain
    pub source: LanguageSource,

    /// True when the signal's value was replaced by the default language
    pub fell_back: bool,
}

/// Resolve the language code for a request.
pub fn resolve<S: LanguageSignals + ?Sized>(signals: &S, config: &Config) -> String {
    resolve_with_source(signals, config).code
}

/// Resolve the language code and report where it came from.
pub fn resolve_with_source<S: LanguageSignals + ?Sized>(
    signals: &S,
    config: &Config,
) -> Resolution {
    let resolution = match find_candidate(signals, config) {
        Some((candidate, source)) => accept_or_default(candidate, source, config),
        None => Resolution {
            code: config.default_language.clone(),
            source: LanguageSource::Default,
            fell_back: false,
        },
    };

    debug!(
        language = %resolution.code,
        source = %resolution.source,
        fell_back = resolution.fell_back,
        "Resolved request language"
    );

    resolution
}

fn find_candidate<S: LanguageSignals + ?Sized>(
    signals: &S,
    config: &Config,
) -> Option<(String, LanguageSource)> {
    if let Some(value) = signals
        .param(&config.get_param_name)
        .filter(|value| !value.is_empty())
    {
        return Some((value, LanguageSource::Param));
    }

    // Presence of the cookie is enough to stop the chain, even when empty
    if let Some(value) = signals.cookie(&config.cookie_name) {
        return Some((value, LanguageSource::Cookie));
    }

    if let Some(header) = signals
        .accept_language()
        .filter(|header| !header.is_empty())
    {
        let first = header.split(',').next().unwrap_or_default();
        return Some((first.to_string(), LanguageSource::Header));
    }

    None
}

fn accept_or_default(candidate: String, source: LanguageSource, config: &Config) -> Resolution {
    let allowed = !candidate.is_empty()
        && config
            .whitelist()
            .map_or(true, |available| available.contains(&candidate));

    if allowed {
        Resolution {
            code: candidate,
            source,
            fell_back: false,
        }
    } else {
        Resolution {
            code: config.default_language.clone(),
            source,
            fell_back: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// In-memory request signals for tests.
    #[derive(Debug, Default, Clone)]
    struct FakeSignals {
        params: Vec<(String, String)>,
        cookies: Vec<(String, String)>,
        accept_language: Option<String>,
    }

    impl FakeSignals {
        fn with_param(mut self, name: &str, value: &str) -> Self {
            self.params.push((name.to_string(), value.to_string()));
            self
        }

        fn with_cookie(mut self, name: &str, value: &str) -> Self {
            self.cookies.push((name.to_string(), value.to_string()));
            self
        }

        fn with_accept_language(mut self, value: &str) -> Self {
            self.accept_language = Some(value.to_string());
            self
        }
    }

    impl LanguageSignals for FakeSignals {
        fn param(&self, name: &str) -> Option<String> {
            self.params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        }

        fn cookie(&self, name: &str) -> Option<String> {
            self.cookies
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        }

        fn accept_language(&self) -> Option<String> {
            self.accept_language.clone()
        }
    }

    fn open_config() -> Config {
        Config::default().without_whitelist()
    }

    fn whitelist_config() -> Config {
        Config::default().with_available_languages(["en", "fr"])
    }

    // ==================== Precedence Tests ====================

    #[test]
    fn test_param_wins_over_everything() {
        let signals = FakeSignals::default()
            .with_param("lang", "es")
            .with_cookie("__i18n", "fr")
            .with_accept_language("de-DE,de;q=0.9");

        let resolution = resolve_with_source(&signals, &open_config());
        assert_eq!(resolution.code, "es");
        assert_eq!(resolution.source, LanguageSource::Param);
        assert!(!resolution.fell_back);
    }

    #[test]
    fn test_cookie_used_without_param() {
        let signals = FakeSignals::default()
            .with_cookie("__i18n", "fr")
            .with_accept_language("de-DE");

        let resolution = resolve_with_source(&signals, &open_config());
        assert_eq!(resolution.code, "fr");
        assert_eq!(resolution.source, LanguageSource::Cookie);
    }

    #[test]
    fn test_empty_param_falls_through_to_cookie() {
        let signals = FakeSignals::default()
            .with_param("lang", "")
            .with_cookie("__i18n", "fr");

        assert_eq!(resolve(&signals, &open_config()), "fr");
    }

    #[test]
    fn test_header_first_entry_verbatim() {
        let signals = FakeSignals::default().with_accept_language("fr-FR,en;q=0.8");

        let resolution = resolve_with_source(&signals, &open_config());
        assert_eq!(resolution.code, "fr-FR");
        assert_eq!(resolution.source, LanguageSource::Header);
    }

    #[test]
    fn test_header_entry_is_not_trimmed_or_parsed() {
        let signals = FakeSignals::default().with_accept_language(" fr;q=0.9, en");
        assert_eq!(resolve(&signals, &open_config()), " fr;q=0.9");
    }

    #[test]
    fn test_header_without_comma() {
        let signals = FakeSignals::default().with_accept_language("pt-BR");
        assert_eq!(resolve(&signals, &open_config()), "pt-BR");
    }

    #[test]
    fn test_empty_header_falls_to_default() {
        let signals = FakeSignals::default().with_accept_language("");

        let resolution = resolve_with_source(&signals, &open_config());
        assert_eq!(resolution.code, "en");
        assert_eq!(resolution.source, LanguageSource::Default);
    }

    #[test]
    fn test_no_signals_returns_default() {
        let resolution = resolve_with_source(&FakeSignals::default(), &open_config());
        assert_eq!(resolution.code, "en");
        assert_eq!(resolution.source, LanguageSource::Default);
        assert!(!resolution.fell_back);
    }

    #[test]
    fn test_other_cookie_names_are_ignored() {
        let signals = FakeSignals::default()
            .with_cookie("session", "fr")
            .with_accept_language("de");
        assert_eq!(resolve(&signals, &open_config()), "de");
    }

    #[test]
    fn test_custom_param_and_cookie_names() {
        let config = Config {
            cookie_name: "site_lang".to_string(),
            get_param_name: "hl".to_string(),
            ..open_config()
        };

        let by_param = FakeSignals::default()
            .with_param("lang", "es")
            .with_param("hl", "it");
        assert_eq!(resolve(&by_param, &config), "it");

        let by_cookie = FakeSignals::default().with_cookie("site_lang", "nl");
        assert_eq!(resolve(&by_cookie, &config), "nl");
    }

    // ==================== Empty Value Tests ====================

    #[test]
    fn test_empty_cookie_stops_chain_and_uses_default() {
        let signals = FakeSignals::default()
            .with_cookie("__i18n", "")
            .with_accept_language("de");

        let resolution = resolve_with_source(&signals, &open_config());
        assert_eq!(resolution.code, "en");
        assert_eq!(resolution.source, LanguageSource::Cookie);
        assert!(resolution.fell_back);
    }

    #[test]
    fn test_header_with_empty_first_entry_uses_default() {
        let signals = FakeSignals::default().with_accept_language(",fr");

        let resolution = resolve_with_source(&signals, &open_config());
        assert_eq!(resolution.code, "en");
        assert_eq!(resolution.source, LanguageSource::Header);
    }

    // ==================== Whitelist Tests ====================

    #[test]
    fn test_whitelist_rejects_param() {
        let signals = FakeSignals::default().with_param("lang", "de");
        assert_eq!(resolve(&signals, &whitelist_config()), "en");
    }

    #[test]
    fn test_whitelist_accepts_param() {
        let signals = FakeSignals::default().with_param("lang", "fr");
        assert_eq!(resolve(&signals, &whitelist_config()), "fr");
    }

    #[test]
    fn test_whitelist_rejection_does_not_continue_chain() {
        let signals = FakeSignals::default()
            .with_param("lang", "de")
            .with_cookie("__i18n", "fr");

        let resolution = resolve_with_source(&signals, &whitelist_config());
        assert_eq!(resolution.code, "en");
        assert_eq!(resolution.source, LanguageSource::Param);
        assert!(resolution.fell_back);
    }

    #[test]
    fn test_whitelist_checks_cookie() {
        let signals = FakeSignals::default().with_cookie("__i18n", "de");
        assert_eq!(resolve(&signals, &whitelist_config()), "en");

        let signals = FakeSignals::default().with_cookie("__i18n", "fr");
        assert_eq!(resolve(&signals, &whitelist_config()), "fr");
    }

    #[test]
    fn test_whitelist_checks_header_entry_exactly() {
        let signals = FakeSignals::default().with_accept_language("fr-FR,fr;q=0.9");
        assert_eq!(resolve(&signals, &whitelist_config()), "en");

        let signals = FakeSignals::default().with_accept_language("fr,en;q=0.5");
        assert_eq!(resolve(&signals, &whitelist_config()), "fr");
    }

    #[test]
    fn test_default_preset_whitelist_is_english_only() {
        let signals = FakeSignals::default().with_param("lang", "es");
        assert_eq!(resolve(&signals, &Config::default()), "en");
    }

    #[test]
    fn test_empty_whitelist_accepts_anything() {
        let config = Config::default().with_available_languages(Vec::<String>::new());
        let signals = FakeSignals::default().with_param("lang", "ja");
        assert_eq!(resolve(&signals, &config), "ja");
    }

    // ==================== Display Tests ====================

    #[test]
    fn test_language_source_display() {
        assert_eq!(LanguageSource::Param.to_string(), "param");
        assert_eq!(LanguageSource::Cookie.to_string(), "cookie");
        assert_eq!(LanguageSource::Header.to_string(), "header");
        assert_eq!(LanguageSource::Default.to_string(), "default");
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_non_empty_param_is_returned(value in "[a-zA-Z-]{1,12}") {
            let signals = FakeSignals::default()
                .with_param("lang", &value)
                .with_cookie("__i18n", "zz")
                .with_accept_language("yy");
            prop_assert_eq!(resolve(&signals, &open_config()), value);
        }

        #[test]
        fn prop_cookie_is_returned_without_param(value in "[a-zA-Z-]{1,12}") {
            let signals = FakeSignals::default()
                .with_cookie("__i18n", &value)
                .with_accept_language("yy");
            prop_assert_eq!(resolve(&signals, &open_config()), value);
        }

        #[test]
        fn prop_whitelisted_result_is_member_or_default(value in "[a-z]{0,3}") {
            let config = whitelist_config();
            let signals = FakeSignals::default().with_param("lang", &value);
            let code = resolve(&signals, &config);
            prop_assert!(code == "en" || code == "fr");
            if value == "fr" {
                prop_assert_eq!(code, "fr");
            }
        }

        #[test]
        fn prop_result_is_never_empty(
            param in proptest::option::of("[a-z,]{0,4}"),
            cookie in proptest::option::of("[a-z,]{0,4}"),
            header in proptest::option::of("[a-z,;=.]{0,8}"),
        ) {
            let mut signals = FakeSignals::default();
            if let Some(param) = &param {
                signals = signals.with_param("lang", param);
            }
            if let Some(cookie) = &cookie {
                signals = signals.with_cookie("__i18n", cookie);
            }
            if let Some(header) = &header {
                signals = signals.with_accept_language(header);
            }
            prop_assert!(!resolve(&signals, &open_config()).is_empty());
        }
    }
}
