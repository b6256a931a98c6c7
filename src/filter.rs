//! Conversation filtering.
//!
//! Pure functions over the grouper's output; rendering of the filtered list
//! is the caller's concern. All matching is case-insensitive substring
//! containment.

use crate::model::conversation::Conversation;

/// Criteria for narrowing a conversation list.
///
/// A non-empty [`search_term`](Self::search_term) searches everything
/// (subject, participants, member bodies) and takes precedence; otherwise
/// the field criteria apply conjunctively.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    /// Free-text search across subject, participants, and body text.
    pub search_term: Option<String>,
    /// Participant filter (sender side).
    pub from: Option<String>,
    /// Participant filter (recipient side).
    pub to: Option<String>,
    /// Subject substring filter.
    pub subject: Option<String>,
}

impl ConversationFilter {
    /// Filter for a free-text search term.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    /// Apply the filter, cloning matching conversations.
    pub fn apply(&self, conversations: &[Conversation]) -> Vec<Conversation> {
        conversations
            .iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect()
    }

    fn matches(&self, conversation: &Conversation) -> bool {
        if let Some(term) = non_empty(&self.search_term) {
            return matches_anywhere(conversation, &term);
        }

        if let Some(from) = non_empty(&self.from) {
            if !has_participant(conversation, &from) {
                return false;
            }
        }
        if let Some(to) = non_empty(&self.to) {
            if !has_participant(conversation, &to) {
                return false;
            }
        }
        if let Some(subject) = non_empty(&self.subject) {
            if !contains_ci(&conversation.subject, &subject) {
                return false;
            }
        }
        true
    }
}

/// Conversations in which both participants appear.
pub fn between(conversations: &[Conversation], a: &str, b: &str) -> Vec<Conversation> {
    if a.is_empty() && b.is_empty() {
        return Vec::new();
    }
    conversations
        .iter()
        .filter(|c| has_participant(c, a) && has_participant(c, b))
        .cloned()
        .collect()
}

fn matches_anywhere(conversation: &Conversation, term: &str) -> bool {
    contains_ci(&conversation.subject, term)
        || has_participant(conversation, term)
        || conversation
            .emails
            .iter()
            .any(|e| contains_ci(&e.body_text, term))
}

fn has_participant(conversation: &Conversation, needle: &str) -> bool {
    conversation
        .participants
        .iter()
        .any(|p| contains_ci(p, needle))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
