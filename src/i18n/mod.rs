//! Language code helpers shared by the resolver and the cookie writer.
//!
//! # Architecture
//!
//! - `language`: normalization of a language tag down to its primary subtag
//! - `registry`: the optional whitelist of languages a site accepts
//!
//! # Example
//!
//! ```rust
//! use lang_cookie::i18n::{primary_subtag, AvailableLanguages};
//!
//! assert_eq!(primary_subtag("EN-us"), "en");
//!
//! let available = AvailableLanguages::new(["en", "fr"]);
//! assert!(available.contains("fr"));
//! assert!(!available.contains("de"));
//! ```

mod language;
mod registry;

pub use language::{primary_subtag, sanitize_cookie_value};
pub use registry::AvailableLanguages;
