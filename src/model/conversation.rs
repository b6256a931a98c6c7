//! Conversation (subject thread) type.

use super::mail::EmailRecord;

/// A thread of emails sharing a normalized subject.
///
/// Computed freshly from the full email list each time grouping runs, never
/// maintained incrementally. Immutable once produced.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Conversation {
    /// The normalized subject used as the grouping key.
    ///
    /// Not globally unique: two archives (or two unrelated threads that
    /// happen to share a subject) collide. Kept as the key on purpose.
    pub id: String,

    /// Subject of the chronologically first email, pre-normalization.
    pub subject: String,

    /// Distinct addresses across all members, in order of first appearance.
    /// Deduplicated by exact case-sensitive equality, not sorted.
    pub participants: Vec<String>,

    /// Member emails, sorted ascending by parsed date.
    pub emails: Vec<EmailRecord>,

    /// Date of the chronologically last email; drives list ordering.
    pub date: String,

    /// Number of member emails. Always equals `emails.len()` and is never 0.
    pub count: usize,
}
