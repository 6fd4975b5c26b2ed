//! Message extractor
//!
//! Turns one raw RFC 5322 message into a [`MailRecord`]. Missing headers
//! become empty fields and undecodable bytes are dropped; nothing about a
//! single message is ever fatal.

use std::collections::{BTreeSet, HashMap};

use mail_parser::{Address, Message, MessageParser, MimeHeaders, PartType};
use tracing::debug;

use super::types::{Category, Direction, MailRecord};
use crate::text::{collapse_whitespace, html_to_text, normalize, normalize_opt};

pub struct MessageExtractor {
    labels_header: String,
}

impl MessageExtractor {
    /// `labels_header` names the header carrying provider labels
    pub fn new(labels_header: impl Into<String>) -> Self {
        Self {
            labels_header: labels_header.into(),
        }
    }

    pub fn extract(&self, raw: &[u8]) -> MailRecord {
        let headers = parse_headers(&decode_ignoring(header_block(raw)));
        let labels = headers
            .get(&self.labels_header.to_lowercase())
            .map(String::as_str)
            .unwrap_or_default();
        let time = headers
            .get("date")
            .map(|date| collapse_whitespace(date))
            .unwrap_or_default();

        let (recipients, subject, body) = match MessageParser::default().parse(raw) {
            Some(message) => (
                normalize(&all_recipients(&message)),
                normalize_opt(message.subject()).unwrap_or_default(),
                normalize(&extract_body(&message)),
            ),
            None => {
                debug!("Unparseable message, keeping headers only");
                Default::default()
            }
        };

        MailRecord {
            time,
            recipients,
            subject,
            body,
            category: Category::from_labels(labels),
            direction: Direction::from_labels(labels),
        }
    }
}

impl Default for MessageExtractor {
    fn default() -> Self {
        Self::new("X-Gmail-Labels")
    }
}

/// Visible text of every text/plain and text/html part, whitespace-collapsed
pub fn extract_body(message: &Message) -> String {
    let mut texts = Vec::new();

    let is_multipart = matches!(
        message.parts.first().map(|part| &part.body),
        Some(PartType::Multipart(_))
    );

    if is_multipart {
        collect_text_parts(message, &mut texts);
    } else if let Some(part) = message.parts.first() {
        // A single-part message is read whatever its declared type
        if let Some(text) = part_text(&part.body) {
            texts.push(html_to_text(&text));
        }
    }

    collapse_whitespace(&texts.join(" "))
}

fn collect_text_parts(message: &Message, texts: &mut Vec<String>) {
    for part in &message.parts {
        if let PartType::Message(inner) = &part.body {
            collect_text_parts(inner, texts);
            continue;
        }

        // Parts without a Content-Type default to text/plain
        let wanted = match part.content_type() {
            Some(ct) => {
                ct.ctype().eq_ignore_ascii_case("text")
                    && ct
                        .subtype()
                        .is_some_and(|s| s.eq_ignore_ascii_case("plain") || s.eq_ignore_ascii_case("html"))
            }
            None => !matches!(part.body, PartType::Multipart(_)),
        };
        if !wanted {
            continue;
        }

        if let Some(text) = part_text(&part.body) {
            if !text.is_empty() {
                texts.push(html_to_text(&text));
            }
        }
    }
}

fn part_text(body: &PartType) -> Option<String> {
    match body {
        PartType::Text(text) | PartType::Html(text) => Some(text.to_string()),
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => Some(decode_ignoring(bytes)),
        PartType::Message(_) | PartType::Multipart(_) => None,
    }
}

/// Bare addresses from From/To/Cc/Bcc, deduplicated and sorted
pub fn all_recipients(message: &Message) -> String {
    let mut addresses = BTreeSet::new();

    for field in [message.from(), message.to(), message.cc(), message.bcc()]
        .into_iter()
        .flatten()
    {
        match field {
            Address::List(list) => {
                addresses.extend(list.iter().filter_map(|a| a.address()));
            }
            Address::Group(groups) => {
                addresses.extend(
                    groups
                        .iter()
                        .flat_map(|g| g.addresses.iter())
                        .filter_map(|a| a.address()),
                );
            }
        }
    }

    addresses
        .into_iter()
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// UTF-8 decode that silently drops invalid sequences
fn decode_ignoring(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn header_block(raw: &[u8]) -> &[u8] {
    let crlf = raw.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = raw.windows(2).position(|w| w == b"\n\n");
    match (crlf, lf) {
        (Some(a), Some(b)) => &raw[..a.min(b)],
        (Some(end), None) | (None, Some(end)) => &raw[..end],
        (None, None) => raw,
    }
}

/// Header name (lowercased) to unfolded value; the first occurrence wins
fn parse_headers(headers_str: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let mut current_header: Option<(String, String)> = None;

    for line in headers_str.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            // Continuation of previous header (folded header)
            if let Some((_, ref mut value)) = current_header {
                value.push(' ');
                value.push_str(line.trim());
            }
        } else if let Some(colon_pos) = line.find(':') {
            if let Some((name, value)) = current_header.take() {
                headers.entry(name).or_insert(value);
            }

            let name = line[..colon_pos].trim().to_lowercase();
            let value = line[colon_pos + 1..].trim().to_string();
            current_header = Some((name, value));
        }
    }

    if let Some((name, value)) = current_header {
        headers.entry(name).or_insert(value);
    }

    headers
}
