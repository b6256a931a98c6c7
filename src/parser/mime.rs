//! MIME body parsing: single-part classification, recursive multipart
//! descent, and HTML-to-text conversion.
//!
//! Multipart parsing threads an explicit [`BodyAccumulator`] through the
//! recursion by value and merges it into the record once at the top level.
//! Nested multiparts accumulate into the same top-level record: the first
//! `text/plain` and first `text/html` parts win, attachments append in
//! order of appearance.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::model::mail::Attachment;
use crate::parser::encoding::decode_body;
use crate::parser::header::boundary_param;

static CONTENT_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Content-Type:\s*([^;\n]+)").expect("content-type regex"));

static ENCODING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Content-Transfer-Encoding:\s*([^;\n]+)").expect("encoding regex")
});

static DISPOSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Content-Disposition:\s*([^;\n]+)").expect("disposition regex")
});

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename="?([^";\n]+)"?"#).expect("filename regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(\d+);").expect("entity regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Body content collected while walking a message's MIME parts.
///
/// Owned exclusively by the recursion and merged into the email record by
/// the caller once the walk finishes.
#[derive(Debug, Default)]
pub struct BodyAccumulator {
    /// First `text/plain` part found, if any.
    pub text: String,
    /// First `text/html` part found, if any.
    pub html: String,
    /// Attachments in order of appearance, across all nesting levels.
    pub attachments: Vec<Attachment>,
}

impl BodyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a single-part body into the accumulator per its content type:
    /// `text/html` fills the HTML slot (plain text derived later if needed),
    /// anything else fills the text slot directly.
    pub fn add_single_part(&mut self, body: &str, content_type: &str, encoding: &str) {
        if content_type.contains("text/html") {
            self.html = decode_body(body, encoding);
            self.text = strip_html(&self.html);
        } else {
            self.text = decode_body(body, encoding);
        }
    }
}

/// Recursively collect the parts of a multipart body into `acc`.
///
/// The body is split on `--<boundary>` at line starts; the preamble before
/// the first boundary is discarded and each segment is truncated at the
/// closing `--<boundary>--` marker. Segments without a blank-line separator
/// between part headers and content are malformed and silently skipped, as
/// are segments with no content. A part that is itself `multipart/*`
/// recurses with its own boundary into the same accumulator.
pub fn collect_parts(body: &str, boundary: &str, mut acc: BodyAccumulator) -> BodyAccumulator {
    let splitter = match Regex::new(&format!(r"(?m)^--{}(?:\n|$)", regex::escape(boundary))) {
        Ok(re) => re,
        Err(err) => {
            warn!(%err, boundary, "Unusable multipart boundary, skipping body");
            return acc;
        }
    };
    let closing = format!("--{boundary}--");

    // The first segment is the preamble
    for segment in splitter.split(body).skip(1) {
        let segment = match segment.find(&closing) {
            Some(pos) => &segment[..pos],
            None => segment,
        };
        if segment.trim().is_empty() {
            continue;
        }

        // Part headers end at the first blank line; no separator → malformed
        let Some((head, content)) = segment.split_once("\n\n") else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }

        let part_type = CONTENT_TYPE_RE
            .captures(head)
            .map(|c| c[1].trim().to_lowercase())
            .unwrap_or_else(|| "text/plain".to_string());

        // Nested multipart: descend with the nested boundary
        if part_type.contains("multipart/") {
            if let Some(nested) = boundary_param(head) {
                acc = collect_parts(content, &nested, acc);
                continue;
            }
        }

        let encoding = ENCODING_RE
            .captures(head)
            .map(|c| c[1].trim().to_lowercase())
            .unwrap_or_else(|| "quoted-printable".to_string());

        let disposition = DISPOSITION_RE
            .captures(head)
            .map(|c| c[1].trim().to_lowercase())
            .unwrap_or_default();

        let filename = FILENAME_RE.captures(head).map(|c| c[1].trim().to_string());

        let decoded = decode_body(content, &encoding);

        if disposition.contains("attachment") || filename.is_some() {
            let filename = filename
                .unwrap_or_else(|| format!("attachment-{}", acc.attachments.len() + 1));
            acc.attachments.push(Attachment {
                filename,
                content_type: part_type,
                content: decoded,
            });
        } else if part_type.contains("text/plain") && acc.text.is_empty() {
            acc.text = decoded;
        } else if part_type.contains("text/html") && acc.html.is_empty() {
            acc.html = decoded;
        }
    }

    acc
}

/// Strip HTML down to plain text.
///
/// Removes tags, unescapes the fixed entity set (`&nbsp; &amp; &lt; &gt;
/// &quot;` plus numeric `&#NNN;`), collapses whitespace runs to a single
/// space, and trims the ends.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = TAG_RE.replace_all(html, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");
    let text = NUMERIC_ENTITY_RE.replace_all(&text, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags_and_entities() {
        let html = "<p>Tom &amp; Jerry &lt;3&gt;&nbsp;&quot;forever&quot;</p>";
        assert_eq!(strip_html(html), "Tom & Jerry <3> \"forever\"");
    }

    #[test]
    fn test_strip_html_numeric_entities() {
        assert_eq!(strip_html("caf&#233;"), "café");
        // Invalid code points keep the original token
        assert_eq!(strip_html("bad &#55296; char"), "bad &#55296; char");
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        let html = "<div>Hello</div>\n\n  <div>world</div>";
        assert_eq!(strip_html(html), "Hello world");
    }

    #[test]
    fn test_single_part_html_derives_text() {
        let mut acc = BodyAccumulator::new();
        acc.add_single_part("<b>Hi</b> there", "text/html", "7bit");
        assert_eq!(acc.html, "<b>Hi</b> there");
        assert_eq!(acc.text, "Hi there");
    }

    #[test]
    fn test_collect_parts_text_and_attachment() {
        let body = "preamble\n--X\nContent-Type: text/plain\nContent-Transfer-Encoding: 7bit\n\nHello body\n--X\nContent-Type: text/csv\nContent-Disposition: attachment; filename=\"a.txt\"\nContent-Transfer-Encoding: 7bit\n\ncol1,col2\n--X--\n";
        let acc = collect_parts(body, "X", BodyAccumulator::new());
        assert_eq!(acc.text.trim(), "Hello body");
        assert_eq!(acc.attachments.len(), 1);
        assert_eq!(acc.attachments[0].filename, "a.txt");
        assert_eq!(acc.attachments[0].content_type, "text/csv");
        assert_eq!(acc.attachments[0].content.trim(), "col1,col2");
    }

    #[test]
    fn test_collect_parts_first_text_wins() {
        let body = "\n--B\nContent-Type: text/plain\nContent-Transfer-Encoding: 7bit\n\nfirst\n--B\nContent-Type: text/plain\nContent-Transfer-Encoding: 7bit\n\nsecond\n--B--\n";
        let acc = collect_parts(body, "B", BodyAccumulator::new());
        assert_eq!(acc.text.trim(), "first");
    }

    #[test]
    fn test_collect_parts_nested_multipart() {
        let inner = "--inner\nContent-Type: text/plain\nContent-Transfer-Encoding: 7bit\n\nplain inner\n--inner\nContent-Type: text/html\nContent-Transfer-Encoding: 7bit\n\n<p>html inner</p>\n--inner--\n";
        let body = format!(
            "\n--outer\nContent-Type: multipart/alternative; boundary=\"inner\"\n\n{inner}\n--outer\nContent-Type: application/pdf\nContent-Disposition: attachment; filename=report.pdf\nContent-Transfer-Encoding: 7bit\n\n%PDF-fake\n--outer--\n"
        );
        let acc = collect_parts(&body, "outer", BodyAccumulator::new());
        assert_eq!(acc.text.trim(), "plain inner");
        assert!(acc.html.contains("html inner"));
        assert_eq!(acc.attachments.len(), 1);
        assert_eq!(acc.attachments[0].filename, "report.pdf");
    }

    #[test]
    fn test_collect_parts_malformed_segment_skipped() {
        // Second part has no blank line between headers and content
        let body = "\n--X\nContent-Type: text/plain\nContent-Transfer-Encoding: 7bit\n\ngood\n--X\nContent-Type: text/plain\nno separator here\n--X--\n";
        let acc = collect_parts(body, "X", BodyAccumulator::new());
        assert_eq!(acc.text.trim(), "good");
        assert!(acc.attachments.is_empty());
    }

    #[test]
    fn test_collect_parts_attachment_fallback_name() {
        let body = "\n--X\nContent-Type: image/png\nContent-Disposition: attachment\nContent-Transfer-Encoding: base64\n\naW1hZ2U=\n--X--\n";
        let acc = collect_parts(body, "X", BodyAccumulator::new());
        assert_eq!(acc.attachments.len(), 1);
        assert_eq!(acc.attachments[0].filename, "attachment-1");
        assert_eq!(acc.attachments[0].content, "image");
    }

    #[test]
    fn test_collect_parts_default_encoding_is_quoted_printable() {
        let body = "\n--X\nContent-Type: text/plain\n\nCaf=C3=A9\n--X--\n";
        let acc = collect_parts(body, "X", BodyAccumulator::new());
        assert_eq!(acc.text.trim(), "Café");
    }
}
