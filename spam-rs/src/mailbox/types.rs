//! Mailbox record types

use serde::Serialize;

use crate::ensemble::Verdict;
use crate::text::NormalizedText;

/// Coarse provider category of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Inbox,
    Spam,
    Promotions,
    Social,
    Updates,
}

impl Category {
    /// Derive from a labels header; first match wins
    pub fn from_labels(labels: &str) -> Self {
        let labels = labels.to_lowercase();
        if labels.contains("spam") {
            Category::Spam
        } else if labels.contains("category_promotions") {
            Category::Promotions
        } else if labels.contains("category_social") {
            Category::Social
        } else if labels.contains("category_updates") {
            Category::Updates
        } else {
            Category::Inbox
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    /// `Sent` when the labels carry the case-sensitive `Sent` token
    pub fn from_labels(labels: &str) -> Self {
        if labels.contains("Sent") {
            Direction::Sent
        } else {
            Direction::Received
        }
    }
}

/// One message of a mailbox, flattened for scoring and export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailRecord {
    /// `Date` header as written by the sender
    pub time: String,
    pub recipients: NormalizedText,
    pub subject: NormalizedText,
    pub body: NormalizedText,
    pub category: Category,
    pub direction: Direction,
}

/// A record with the batch model's label attached
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: MailRecord,
    pub prediction: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_priority() {
        assert_eq!(Category::from_labels("Spam,CATEGORY_PROMOTIONS"), Category::Spam);
        assert_eq!(Category::from_labels("Inbox,Category_Promotions"), Category::Promotions);
        assert_eq!(Category::from_labels("category_social"), Category::Social);
        assert_eq!(Category::from_labels("Opened,CATEGORY_UPDATES"), Category::Updates);
        assert_eq!(Category::from_labels(""), Category::Inbox);
        assert_eq!(Category::from_labels("Important,Starred"), Category::Inbox);
    }

    #[test]
    fn test_direction_is_case_sensitive() {
        assert_eq!(Direction::from_labels("Sent,Opened"), Direction::Sent);
        assert_eq!(Direction::from_labels("sent"), Direction::Received);
        assert_eq!(Direction::from_labels(""), Direction::Received);
    }
}
