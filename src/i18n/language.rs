//! Language tag normalization.
//!
//! A resolved language may arrive in any shape a browser or a user typed it
//! (`EN-us`, `fr-FR`, `pt`). Before it is persisted it is reduced to the
//! lower-cased primary subtag, which is what the cookie carries.

/// Reduce a language tag to its lower-cased primary subtag.
///
/// # Arguments
/// * `code` - A language tag such as `"en-US"` or `"fr"`
///
/// # Returns
/// The portion before the first `-`, lower-cased (e.g. `"en"`).
///
/// # Example
/// ```
/// use lang_cookie::i18n::primary_subtag;
///
/// assert_eq!(primary_subtag("EN-us"), "en");
/// assert_eq!(primary_subtag("fr"), "fr");
/// ```
pub fn primary_subtag(code: &str) -> String {
    let lowered = code.to_lowercase();
    match lowered.split_once('-') {
        Some((primary, _region)) => primary.to_string(),
        None => lowered,
    }
}

/// Drop every character that is not a valid RFC 6265 `cookie-octet`.
///
/// Request parameters end up in the cookie value, so anything that could
/// terminate the value (`;`, `,`, whitespace, quotes, control bytes) or is
/// outside ASCII is removed.
pub fn sanitize_cookie_value(value: &str) -> String {
    value.chars().filter(|c| is_cookie_octet(*c)).collect()
}

fn is_cookie_octet(c: char) -> bool {
    matches!(c, '\x21' | '\x23'..='\x2B' | '\x2D'..='\x3A' | '\x3C'..='\x5B' | '\x5D'..='\x7E')
}
