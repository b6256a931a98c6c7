//! Parsed email record and attachment types.

use uuid::Uuid;

/// One parsed message from an MBOX archive.
///
/// Created once per `From `-delimited block and immutable after parsing,
/// except for the [`is_read`](Self::is_read) / [`is_starred`](Self::is_starred)
/// flags which belong to a consuming view layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmailRecord {
    /// Process-unique random identifier (not derived from content).
    pub id: Uuid,

    /// Decoded `From:` header in raw `"Name <addr>"` form.
    /// `"Unknown Sender"` when the header is absent.
    pub from: String,

    /// Decoded `To:` header, verbatim aside from encoded-word decoding.
    /// `"Unknown Recipient"` when the header is absent.
    pub to: String,

    /// Decoded subject. Defaults to `"Email #<n>"` (1-based archive
    /// position) when the header is absent.
    pub subject: String,

    /// RFC 3339 timestamp if the `Date:` header parsed, otherwise the raw
    /// header value, otherwise the time of parsing.
    pub date: String,

    /// Plain-text body. Derived from HTML by tag-stripping when no
    /// `text/plain` part exists.
    pub body_text: String,

    /// HTML body, when a `text/html` part was present.
    pub body_html: String,

    /// Decoded attachments, in order of appearance.
    pub attachments: Vec<Attachment>,

    /// View-layer flag; the parser always produces `false`.
    #[serde(default)]
    pub is_read: bool,

    /// View-layer flag; the parser always produces `false`.
    #[serde(default)]
    pub is_starred: bool,
}

impl EmailRecord {
    /// A fresh record with the defaults used before any header is parsed.
    ///
    /// `position` is the 1-based index of the message in the archive.
    pub fn with_defaults(position: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: "Unknown Sender".to_string(),
            to: "Unknown Recipient".to_string(),
            subject: format!("Email #{position}"),
            date: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            body_text: String::new(),
            body_html: String::new(),
            attachments: Vec::new(),
            is_read: false,
            is_starred: false,
        }
    }

    /// Whether the message carries at least one attachment.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A decoded attachment payload.
///
/// Content is text-decoded with the rest of the message; binary payloads are
/// not byte-safe. This is a known limitation of the lenient parser.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Attachment {
    /// Filename from `Content-Disposition` or the type parameters.
    /// Generated (`attachment-<n>`) if the headers carry none.
    pub filename: String,

    /// MIME content type of the part (e.g. `"text/csv"`).
    pub content_type: String,

    /// Decoded payload.
    pub content: String,
}
