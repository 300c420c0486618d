//! Detect and repair path strings incompatible with cross-platform sync.
//!
//! Per spec §4.4: a closed set of disallowed constructs per path component,
//! and a repair function `fix(path) -> (new_path, changed)` that is
//! idempotent: `fix(fix(p)) == fix(p)`.

pub mod errors;
pub mod normalizer;

pub use errors::{ValidationCause, ValidationError, ValidationWarning};
pub use normalizer::{NormalizationReport, Normalizer};

use unicode_normalization::{is_nfc, UnicodeNormalization};

const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '\\'];

fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

fn is_line_separator(c: char) -> bool {
    matches!(c, '\u{2028}' | '\u{2029}')
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

fn basename_is_reserved(component: &str) -> bool {
    let stem = component.split('.').next().unwrap_or(component);
    WINDOWS_RESERVED
        .iter()
        .any(|r| r.eq_ignore_ascii_case(stem))
}

/// Validates a single path component, returning every cause that applies.
pub fn validate_component(component: &str) -> Vec<ValidationCause> {
    let mut causes = Vec::new();

    if component.chars().any(is_control) {
        causes.push(ValidationCause::ControlCharacter);
    }
    if component.chars().any(|c| ILLEGAL_CHARS.contains(&c)) {
        causes.push(ValidationCause::IllegalCharacter);
    }
    if basename_is_reserved(component) {
        causes.push(ValidationCause::ReservedName);
    }
    if component != component.trim() {
        causes.push(ValidationCause::Whitespace);
    }
    if component.ends_with('~') {
        causes.push(ValidationCause::TrailingTilde);
    }
    if component.chars().any(is_line_separator) {
        causes.push(ValidationCause::LineSeparator);
    }
    if component.chars().any(is_bidi_control) {
        causes.push(ValidationCause::BidiControl);
    }
    if component.chars().any(is_zero_width) {
        causes.push(ValidationCause::ZeroWidth);
    }
    if !is_nfc(component) {
        causes.push(ValidationCause::NonNfc);
    }

    causes
}

/// Validates a full relative path, one component at a time.
///
/// Returns a `ValidationWarning` with every cause found across every
/// component, or `None` if the path is already valid.
pub fn validate_path(path: &str) -> Option<ValidationWarning> {
    let mut causes = Vec::new();
    for component in path.split('/') {
        if component.is_empty() {
            continue;
        }
        causes.extend(validate_component(component));
    }
    if causes.is_empty() {
        None
    } else {
        causes.sort_by_key(cause_rank);
        causes.dedup();
        Some(ValidationWarning {
            path: path.to_string(),
            causes,
        })
    }
}

fn cause_rank(c: &ValidationCause) -> u8 {
    *c as u8
}

/// Repairs a single path component per spec §4.4:
/// - strip trailing `~`
/// - replace each illegal character with `_`
/// - append `_renamed` to Windows-reserved basenames
/// - NFC-normalize
/// - trim leading/trailing whitespace
fn fix_component(component: &str) -> String {
    let mut s = component.trim().to_string();

    while s.ends_with('~') {
        s.pop();
    }

    let replaced: String = s
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || is_control(c) || is_line_separator(c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    s = replaced;

    s = s
        .chars()
        .filter(|c| !is_bidi_control(*c) && !is_zero_width(*c))
        .collect();

    let nfc: String = s.nfc().collect();
    s = nfc;

    if basename_is_reserved(&s) {
        match s.find('.') {
            Some(dot_idx) => s.insert_str(dot_idx, "_renamed"),
            None => s.push_str("_renamed"),
        }
    }

    s.trim().to_string()
}

/// Repairs a full relative path, component by component.
///
/// Idempotent: `fix(fix(p)) == fix(p)`. Returns the repaired path and
/// whether it differs from the input.
pub fn fix(path: &str) -> (String, bool) {
    let fixed: Vec<String> = path.split('/').map(fix_component).collect();
    let fixed_path = fixed.join("/");
    (fixed_path.clone(), fixed_path != path)
}
