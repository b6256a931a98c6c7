//! Email parsing: archive splitting, header decoding, and MIME handling.

pub mod encoding;
pub mod header;
pub mod mbox;
pub mod mime;

use chrono::{SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::error::{MboxViewError, Result};
use crate::model::mail::EmailRecord;
use mime::BodyAccumulator;

/// Text used when a message yields neither plain text nor HTML.
const EMPTY_BODY_PLACEHOLDER: &str = "No readable content found in this email.";

/// Parse a whole MBOX archive into email records.
///
/// One record per `From `-delimited block, in archive order. A block that
/// fails to parse becomes a placeholder record instead of aborting the
/// archive, so output indexes always match archive positions. Zero blocks
/// yield an empty Vec.
pub fn parse_archive(archive: &str) -> Vec<EmailRecord> {
    mbox::split_messages(archive)
        .iter()
        .enumerate()
        .map(|(index, block)| {
            parse_message(block, index).unwrap_or_else(|err| {
                warn!(index, %err, "Failed to parse message, emitting placeholder");
                placeholder_record(index, &err)
            })
        })
        .collect()
}

/// Parse one message block (separator line included) into a record.
///
/// `index` is the 0-based position of the block in the archive; it only
/// feeds the `"Email #<n>"` default subject.
pub fn parse_message(block: &str, index: usize) -> Result<EmailRecord> {
    if !block.starts_with("From ") {
        return Err(MboxViewError::MalformedMessage {
            index,
            reason: "block does not start with an MBOX 'From ' separator".to_string(),
        });
    }

    let mut record = EmailRecord::with_defaults(index + 1);
    let (headers, body) = header::split_message(block);

    let mut content_type = "text/plain".to_string();
    let mut boundary: Option<String> = None;
    let mut transfer_encoding = String::new();

    for (name, value) in &headers {
        match name.as_str() {
            "from" => record.from = header::decode_encoded_words(value),
            "to" => record.to = header::decode_encoded_words(value),
            "subject" => record.subject = header::decode_encoded_words(value),
            "date" => record.date = header::header_date_string(value),
            "content-type" => {
                content_type = header::primary_content_type(value);
                boundary = header::boundary_param(value);
            }
            "content-transfer-encoding" => {
                transfer_encoding = value.trim().to_lowercase();
            }
            _ => {}
        }
    }

    if let Some(body) = body {
        let mut acc = BodyAccumulator::new();
        match &boundary {
            Some(b) if content_type.contains("multipart/") => {
                acc = mime::collect_parts(&body, b, acc);
            }
            _ => acc.add_single_part(&body, &content_type, &transfer_encoding),
        }
        record.body_text = acc.text;
        record.body_html = acc.html;
        record.attachments = acc.attachments;
    }

    if record.body_text.is_empty() && !record.body_html.is_empty() {
        record.body_text = mime::strip_html(&record.body_html);
    }
    if record.body_text.is_empty() && record.body_html.is_empty() {
        record.body_text = EMPTY_BODY_PLACEHOLDER.to_string();
    }

    Ok(record)
}

/// Record emitted in place of a message that could not be parsed.
///
/// Keeps the archive position in the output list; the error text lands in
/// the body so the failure is visible to the consumer.
fn placeholder_record(index: usize, err: &MboxViewError) -> EmailRecord {
    EmailRecord {
        id: Uuid::new_v4(),
        from: "Error parsing email".to_string(),
        to: String::new(),
        subject: format!("Message #{} (parsing failed)", index + 1),
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        body_text: format!("This email could not be parsed correctly: {err}"),
        body_html: String::new(),
        attachments: Vec::new(),
        is_read: false,
        is_starred: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_minimal() {
        let block = "From a@b Mon Jan 1\nFrom: x@y\nSubject: Re: Hi\n\nHello";
        let record = parse_message(block, 0).unwrap();
        assert_eq!(record.from, "x@y");
        assert_eq!(record.subject, "Re: Hi");
        assert_eq!(record.body_text, "Hello");
        assert!(record.body_html.is_empty());
    }

    #[test]
    fn test_parse_message_defaults() {
        let block = "From a@b Mon Jan 1\n\njust a body";
        let record = parse_message(block, 2).unwrap();
        assert_eq!(record.from, "Unknown Sender");
        assert_eq!(record.to, "Unknown Recipient");
        assert_eq!(record.subject, "Email #3");
        assert_eq!(record.body_text, "just a body");
    }

    #[test]
    fn test_parse_message_empty_body_placeholder() {
        let block = "From a@b Mon Jan 1\nSubject: Nothing\n\n";
        let record = parse_message(block, 0).unwrap();
        assert_eq!(record.body_text, EMPTY_BODY_PLACEHOLDER);
    }

    #[test]
    fn test_parse_message_html_only() {
        let block = "From a@b\nContent-Type: text/html\nContent-Transfer-Encoding: 7bit\n\n<p>Hello &amp; goodbye</p>";
        let record = parse_message(block, 0).unwrap();
        assert!(record.body_html.contains("<p>"));
        assert_eq!(record.body_text, "Hello & goodbye");
    }

    #[test]
    fn test_parse_message_base64_body() {
        let block = "From a@b\nContent-Transfer-Encoding: base64\n\nSGVsbG8=";
        let record = parse_message(block, 0).unwrap();
        assert_eq!(record.body_text, "Hello");
    }

    #[test]
    fn test_parse_message_date_fallback_keeps_raw() {
        let block = "From a@b\nDate: the day after tomorrow\n\nBody";
        let record = parse_message(block, 0).unwrap();
        assert_eq!(record.date, "the day after tomorrow");
    }

    #[test]
    fn test_parse_message_without_separator_errors() {
        let err = parse_message("Subject: no separator\n\nBody", 4).unwrap_err();
        assert!(matches!(
            err,
            MboxViewError::MalformedMessage { index: 4, .. }
        ));
    }

    #[test]
    fn test_parse_archive_count_matches_blocks() {
        let archive = "From a@b\nSubject: One\n\nfirst\nFrom c@d\nSubject: Two\n\nsecond\n";
        let emails = parse_archive(archive);
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].subject, "One");
        assert_eq!(emails[1].subject, "Two");
    }

    #[test]
    fn test_parse_archive_empty() {
        assert!(parse_archive("").is_empty());
    }

    #[test]
    fn test_parse_archive_ids_unique() {
        let archive = "From a@b\n\nx\nFrom a@b\n\ny\nFrom a@b\n\nz\n";
        let emails = parse_archive(archive);
        assert_eq!(emails.len(), 3);
        assert_ne!(emails[0].id, emails[1].id);
        assert_ne!(emails[1].id, emails[2].id);
    }
}
