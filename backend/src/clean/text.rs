//! Text normalization for categorical columns.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::col;

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").unwrap());

/// Uppercase the first letter of every word and lowercase the rest.
///
/// A word starts at any letter that does not follow another letter,
/// so `"o'neil 2nd"` becomes `"O'Neil 2Nd"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_letter = false;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(ch);
            prev_letter = false;
        }
    }

    out
}

/// Keep only the digits of a phone-like value.
pub fn digits_only(value: &str) -> String {
    NON_DIGIT.replace_all(value, "").into_owned()
}

/// Normalize one categorical value of column `name`.
pub fn normalize(name: &str, value: &str) -> String {
    let trimmed = value.trim();
    if name == col::COUNTRY {
        trimmed.to_uppercase()
    } else if col::is_phone_like(name) {
        digits_only(&title_case(trimmed))
    } else {
        title_case(trimmed)
    }
}
