//! # Personalization Engine
//!
//! Pure template handling for campaign messages. A template is
//! *personalized* when it contains a `{{first_name}}` or `{{last_name}}`
//! placeholder; rendering substitutes every occurrence, falling back to a
//! literal `"Customer"` when the contact record has no value for a field.
//! No side effects, fully deterministic.

use std::sync::OnceLock;

use regex::{NoExpand, Regex};

use crate::constants::PERSONALIZATION_FALLBACK_NAME;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{(first_name|last_name)\}\}").expect("placeholder pattern is valid")
    })
}

fn first_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{first_name\}\}").expect("pattern is valid"))
}

fn last_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{last_name\}\}").expect("pattern is valid"))
}

/// Check whether a template contains any personalization placeholder.
pub fn has_placeholders(template: &str) -> bool {
    placeholder_pattern().is_match(template)
}

/// Render a template for one contact, substituting all placeholders.
pub fn render(template: &str, first_name: &str, last_name: &str) -> String {
    let first = if first_name.is_empty() {
        PERSONALIZATION_FALLBACK_NAME
    } else {
        first_name
    };
    let last = if last_name.is_empty() {
        PERSONALIZATION_FALLBACK_NAME
    } else {
        last_name
    };

    // NoExpand keeps `$` in customer names from being treated as a
    // capture-group reference.
    let rendered = first_name_pattern().replace_all(template, NoExpand(first));
    last_name_pattern()
        .replace_all(&rendered, NoExpand(last))
        .into_owned()
}
