//! Whitelist of languages a site is willing to serve.
//!
//! When configured, every resolved candidate is checked against this set and
//! anything outside it falls back to the default language. The set is owned
//! by the configuration value rather than a process-wide singleton, so two
//! routers in the same process can accept different languages.

use serde::{Deserialize, Serialize};

/// Set of language codes considered valid.
///
/// Membership is an exact, case-sensitive comparison, the same way the codes
/// were written in the configuration. Insertion order is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailableLanguages {
    codes: Vec<String>,
}

impl AvailableLanguages {
    /// Build a whitelist from any list of codes. Duplicates are dropped.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut available = Self::default();
        for code in codes {
            let code = code.into();
            if !available.codes.contains(&code) {
                available.codes.push(code);
            }
        }
        available
    }

    /// Parse a comma-separated list such as `"en, fr,es"`.
    ///
    /// Entries are trimmed and empty entries are skipped, so `""` yields an
    /// empty whitelist.
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty()),
        )
    }

    /// Check if a code is in the whitelist.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|available| available == code)
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// All configured codes, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AvailableLanguages {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
