//! Subject-based conversation grouping.
//!
//! Emails are grouped by normalized subject (one reply/forward prefix
//! stripped), approximating a reply chain without Message-ID headers.
//! Grouping always runs over the full email list and rebuilds every
//! conversation from scratch.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::conversation::Conversation;
use crate::model::mail::EmailRecord;
use crate::parser::header::parse_date;

/// Reply/forward prefix, optionally with a bracketed counter (`Re[2]:`).
static SUBJECT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Re|RE|FWD|Fwd|Fw|FW)(\[\d+\])?:\s*").expect("subject prefix regex")
});

/// Normalize a subject for grouping.
///
/// A single anchored pass strips at most one prefix, so `"Re: Re: Hi"`
/// normalizes to `"Re: Hi"` — carried over from the original grouping
/// behavior, not iterative stripping. An empty result becomes the literal
/// `"No Subject"`.
pub fn normalize_subject(subject: &str) -> String {
    let stripped = SUBJECT_PREFIX_RE.replace(subject, "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        "No Subject".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Group emails into conversations by normalized subject.
///
/// Members are cloned into each conversation and sorted ascending by parsed
/// date; the conversation list is sorted descending by its newest member's
/// date. Groups keep first-appearance order before that sort so the result
/// is deterministic for a given input.
pub fn group_conversations(emails: &[EmailRecord]) -> Vec<Conversation> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<EmailRecord>> = HashMap::new();

    for email in emails {
        let key = normalize_subject(&email.subject);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(email.clone());
    }

    let mut conversations: Vec<Conversation> = order
        .into_iter()
        .filter_map(|key| {
            let mut members = groups.remove(&key)?;
            if members.is_empty() {
                return None;
            }
            members.sort_by(|a, b| compare_date_strings(&a.date, &b.date));

            let subject = members[0].subject.clone();
            let date = members[members.len() - 1].date.clone();
            let participants = unique_participants(&members);
            let count = members.len();

            Some(Conversation {
                id: key,
                subject,
                participants,
                emails: members,
                date,
                count,
            })
        })
        .collect();

    conversations.sort_by(|a, b| compare_date_strings(&b.date, &a.date));
    conversations
}

/// Compare two record date strings.
///
/// Both parse → chronological order. Otherwise the raw strings compare by
/// their natural `Ord` — lenient fallback behavior kept as documented, not
/// fixed. Stable sorts keep archive order for equal keys.
fn compare_date_strings(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        _ => a.cmp(b),
    }
}

/// Distinct addresses across `from` and comma-split `to`, first-appearance
/// order, deduplicated by exact case-sensitive equality.
fn unique_participants(members: &[EmailRecord]) -> Vec<String> {
    let mut participants: Vec<String> = Vec::new();

    for email in members {
        push_unique(&mut participants, extract_address(&email.from));
        for recipient in email.to.split(',') {
            push_unique(&mut participants, extract_address(recipient));
        }
    }

    participants
}

fn push_unique(list: &mut Vec<String>, addr: String) {
    if !addr.is_empty() && !list.contains(&addr) {
        list.push(addr);
    }
}

/// Extract the address portion of a `"Name <addr>"` header value.
///
/// The last `<...>` pair wins; without one the whole trimmed string is the
/// address.
fn extract_address(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(start) = trimmed.rfind('<') {
        if let Some(end) = trimmed.rfind('>') {
            if end > start {
                return trimmed[start + 1..end].trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_archive;

    fn record(subject: &str, from: &str, to: &str, date: &str) -> EmailRecord {
        let mut r = EmailRecord::with_defaults(1);
        r.subject = subject.to_string();
        r.from = from.to_string();
        r.to = to.to_string();
        r.date = date.to_string();
        r
    }

    #[test]
    fn test_normalize_subject() {
        assert_eq!(normalize_subject("Hello"), "Hello");
        assert_eq!(normalize_subject("Re: Hello"), "Hello");
        assert_eq!(normalize_subject("FWD: Hello"), "Hello");
        assert_eq!(normalize_subject("Fw: Hello"), "Hello");
        assert_eq!(normalize_subject("Re[2]: Hello"), "Hello");
    }

    #[test]
    fn test_normalize_subject_single_pass() {
        // Only one prefix is stripped per pass
        assert_eq!(normalize_subject("Re: Re: Hello"), "Re: Hello");
    }

    #[test]
    fn test_normalize_subject_empty_and_idempotent() {
        assert_eq!(normalize_subject(""), "No Subject");
        assert_eq!(normalize_subject("Re: "), "No Subject");
        assert_eq!(normalize_subject("No Subject"), "No Subject");
        assert_eq!(normalize_subject(&normalize_subject("Fwd: Hi")), "Hi");
    }

    #[test]
    fn test_group_reply_into_one_conversation() {
        let emails = vec![
            record("Hello", "a@x.com", "b@y.com", "2024-01-01T10:00:00Z"),
            record("Re: Hello", "b@y.com", "a@x.com", "2024-01-02T10:00:00Z"),
        ];
        let convos = group_conversations(&emails);
        assert_eq!(convos.len(), 1);
        let c = &convos[0];
        assert_eq!(c.id, "Hello");
        assert_eq!(c.count, 2);
        assert_eq!(c.subject, "Hello"); // chronologically first, pre-normalization
        assert_eq!(c.date, "2024-01-02T10:00:00Z");
        assert_eq!(c.emails.len(), 2);
        assert_eq!(c.emails[0].subject, "Hello");
        assert_eq!(c.emails[1].subject, "Re: Hello");
    }

    #[test]
    fn test_conversations_sorted_newest_first() {
        let emails = vec![
            record("Old thread", "a@x.com", "", "2023-05-01T00:00:00Z"),
            record("New thread", "a@x.com", "", "2024-05-01T00:00:00Z"),
        ];
        let convos = group_conversations(&emails);
        assert_eq!(convos.len(), 2);
        assert_eq!(convos[0].id, "New thread");
        assert_eq!(convos[1].id, "Old thread");
    }

    #[test]
    fn test_members_sorted_ascending_by_date() {
        let emails = vec![
            record("T", "late@x.com", "", "2024-03-01T00:00:00Z"),
            record("Re: T", "early@x.com", "", "2024-01-01T00:00:00Z"),
        ];
        let convos = group_conversations(&emails);
        assert_eq!(convos[0].emails[0].from, "early@x.com");
        assert_eq!(convos[0].subject, "Re: T");
        assert_eq!(convos[0].date, "2024-03-01T00:00:00Z");
    }

    #[test]
    fn test_participants_dedup_and_order() {
        let emails = vec![
            record(
                "T",
                "Alice <alice@x.com>",
                "bob@y.com, Carol <carol@z.com>",
                "2024-01-01T00:00:00Z",
            ),
            record("Re: T", "bob@y.com", "Alice <alice@x.com>", "2024-01-02T00:00:00Z"),
        ];
        let convos = group_conversations(&emails);
        assert_eq!(
            convos[0].participants,
            vec!["alice@x.com", "bob@y.com", "carol@z.com"]
        );
    }

    #[test]
    fn test_extract_address_last_angle_wins() {
        assert_eq!(extract_address("A <old@x.com> <new@x.com>"), "new@x.com");
        assert_eq!(extract_address("plain@x.com"), "plain@x.com");
        assert_eq!(extract_address("  Name Only "), "Name Only");
    }

    #[test]
    fn test_empty_input() {
        assert!(group_conversations(&[]).is_empty());
    }

    #[test]
    fn test_group_from_parsed_archive() {
        let archive = "From a@b\nFrom: a@x.com\nSubject: Hello\nDate: Mon, 01 Jan 2024 10:00:00 +0000\n\nHi\nFrom c@d\nFrom: b@y.com\nSubject: Re: Hello\nDate: Tue, 02 Jan 2024 10:00:00 +0000\n\nHi back\n";
        let emails = parse_archive(archive);
        let convos = group_conversations(&emails);
        assert_eq!(convos.len(), 1);
        assert_eq!(convos[0].count, 2);
    }
}
