//! Document key and collection name grammars
//!
//! Pure predicates, no I/O. Patterns are compiled once per process.

use regex::Regex;
use std::sync::OnceLock;

static KEY_RE: OnceLock<Regex> = OnceLock::new();
static COLLECTION_RE: OnceLock<Regex> = OnceLock::new();

/// Whether the string is a valid document key.
///
/// Keys are 1..=254 characters from the letters, digits and the permitted
/// punctuation set.
pub fn is_valid_key_value(value: &str) -> bool {
    let re = KEY_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_\-:.@()+,=;$!*'%]{1,254}$").expect("key grammar pattern")
    });
    re.is_match(value)
}

/// Whether the string is a valid collection name.
///
/// Names start with a letter and continue with letters, digits, underscores
/// or dashes, up to 256 characters total.
pub fn is_valid_collection_name(name: &str) -> bool {
    let re = COLLECTION_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_\-]{0,255}$").expect("collection grammar pattern")
    });
    re.is_match(name)
}
