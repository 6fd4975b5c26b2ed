//! HTML to visible text

use regex::Regex;
use std::sync::LazyLock;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"));

static INVISIBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid script/style pattern")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z!][^>]*>").expect("valid tag pattern"));

/// Unescape entities, then strip markup keeping only visible text
///
/// Every removed tag leaves a single space behind so adjacent blocks do not
/// fuse into one word. References are decoded once before stripping and
/// once more on the visible text, so doubly escaped markup such as
/// `&amp;lt;b&amp;gt;` ends up as literal `<b>`.
pub fn html_to_text(html: &str) -> String {
    let text = unescape(html);
    let text = COMMENT.replace_all(&text, " ");
    let text = INVISIBLE.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");
    unescape(&text)
}

/// Collapse backslash runs and all whitespace runs to single spaces, then trim
pub fn collapse_whitespace(text: &str) -> String {
    text.replace('\\', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode every HTML5 character reference, legacy forms included
fn unescape(text: &str) -> String {
    htmlize::unescape(text).to_string()
}
