//! `mboxview` — lenient MBOX/MIME parsing and subject-threaded conversations.
//!
//! The core turns a raw in-memory MBOX archive into [`EmailRecord`]s and
//! groups those into [`Conversation`]s. Parsing is deliberately best-effort:
//! a malformed message degrades to a placeholder record and a malformed MIME
//! part is skipped, so a single bad block never aborts the archive.

pub mod error;
pub mod filter;
pub mod model;
pub mod parser;
pub mod threading;

pub use error::{MboxViewError, Result};
pub use model::conversation::Conversation;
pub use model::mail::{Attachment, EmailRecord};

/// Parse a whole MBOX archive into email records, in archive order.
///
/// See [`parser::parse_archive`].
pub fn parse_emails(archive: &str) -> Vec<EmailRecord> {
    parser::parse_archive(archive)
}

/// Group parsed emails into conversations by normalized subject.
///
/// See [`threading::group_conversations`].
pub fn group_conversations(emails: &[EmailRecord]) -> Vec<Conversation> {
    threading::group_conversations(emails)
}
