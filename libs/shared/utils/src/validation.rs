use std::sync::LazyLock;

use regex::Regex;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Letters (any script), spaces, apostrophes and hyphens. Nothing that
/// PostgREST treats as filter syntax can pass.
const NAME_TERM_PATTERN: &str = r"^[\p{L}][\p{L} '\-]*$";

pub const MAX_NAME_TERM_LENGTH: usize = 50;

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());
static NAME_TERM_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(NAME_TERM_PATTERN).ok());

pub fn validate_email(email: &str) -> bool {
    email.len() <= 254
        && EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

pub fn validate_name_term(term: &str) -> bool {
    term.chars().count() <= MAX_NAME_TERM_LENGTH
        && NAME_TERM_RE.as_ref().is_some_and(|re| re.is_match(term))
}
