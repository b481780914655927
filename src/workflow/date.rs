//! `DD/MM/YYYY` date pattern shared by intake and moderator edits.
//!
//! Only the shape is checked: day 01-31, month 01-12, any four-digit
//! year. Day counts per month are not enforced, so `31/02/2025` passes.

use std::sync::LazyLock;

use regex::Regex;

static DATE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|[12][0-9]|3[01])/(0[1-9]|1[0-2])/([0-9]{4})$").ok()
});

/// Whether `text` is a `DD/MM/YYYY` date.
#[must_use]
pub fn is_valid_date(text: &str) -> bool {
    DATE_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text))
}

/// Reorder a `DD/MM/YYYY` date into `YYYY/MM/DD` for the published caption.
///
/// Text that does not match the pattern is returned unchanged.
#[must_use]
pub fn to_display_order(text: &str) -> String {
    let Some(captures) = DATE_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(text))
    else {
        return text.to_owned();
    };
    format!("{}/{}/{}", &captures[3], &captures[2], &captures[1])
}
