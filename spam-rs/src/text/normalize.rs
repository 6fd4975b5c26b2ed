//! Text normalizer
//!
//! The trained vectorizer saw text produced by exactly this sequence of
//! substitutions, so every step and its order is part of the artifact
//! contract. Changing anything here silently shifts the feature space.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

/// Hard cell limit of the spreadsheet consumers of batch output
pub const MAX_CELL_LEN: usize = 32767;

static LONG_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{3,}\b").expect("valid number pattern"));

/// Text that went through [`normalize`]
///
/// Only `normalize` builds values of this type, so anything handed to a
/// feature transformer is known to be in the training canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in UTF-16 code units
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }
}

impl Deref for NormalizedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NormalizedText> for String {
    fn from(text: NormalizedText) -> Self {
        text.0
    }
}

/// Canonicalize raw text for feature extraction and tabular export
pub fn normalize(text: &str) -> NormalizedText {
    let text = text
        .replace('$', " dollar ")
        .replace('£', " pound ")
        .replace('€', " euro ");

    // Magnitudes are deliberately collapsed: "10000" and "250" are the same token
    let text = LONG_NUMBER.replace_all(&text, " num ");

    let text: String = text.chars().filter(|&c| !is_stripped(c)).collect();

    let mut text = truncate_utf16(&text, MAX_CELL_LEN);

    if text.starts_with(['=', '+', '-', '@']) {
        // Make room for the apostrophe so the guarded cell stays within the limit
        text = truncate_utf16(&text, MAX_CELL_LEN - 1);
        text.insert(0, '\'');
    }

    NormalizedText(text)
}

/// Normalize an optional value, passing absence through untouched
pub fn normalize_opt(text: Option<&str>) -> Option<NormalizedText> {
    text.map(normalize)
}

fn is_stripped(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}'
            | '\u{0B}'
            | '\u{0C}'
            | '\u{0E}'..='\u{1F}'
            | '\u{200B}'..='\u{200F}'
            | '\u{FEFF}'
    )
}

/// Keep at most `limit` UTF-16 code units, dropping any surrogate half left
/// unpaired by the cut.
fn truncate_utf16(text: &str, limit: usize) -> String {
    char::decode_utf16(text.encode_utf16().take(limit))
        .filter_map(|unit| unit.ok())
        .collect()
}
