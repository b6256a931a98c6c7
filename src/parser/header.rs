//! RFC 5322 header handling: folding, encoded-words (RFC 2047), date parsing.

use std::sync::LazyLock;

use base64::Engine;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use tracing::debug;

/// One RFC 2047 encoded-word token: `=?charset?B|Q?payload?=`.
static ENCODED_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\?([^?]+)\?([BbQq])\?([^?]*)\?=").expect("encoded-word regex")
});

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)boundary="?([^";]+)"?"#).expect("boundary regex"));

/// Split a message block into unfolded `(name, value)` headers and the body.
///
/// The first line (the MBOX `From ` separator) is skipped. A line starting
/// with whitespace continues the previous header and is space-joined onto
/// it. The first blank line terminates the headers; everything after it is
/// the body. Returns `None` for the body when no blank line exists.
///
/// Header names are lowercased; lines without a `:` are silently dropped.
pub fn split_message(block: &str) -> (Vec<(String, String)>, Option<String>) {
    let lines: Vec<&str> = block.split('\n').collect();

    let mut raw_headers: Vec<String> = Vec::new();
    let mut body: Option<String> = None;

    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            if i + 1 < lines.len() {
                body = Some(lines[i + 1..].join("\n"));
            }
            break;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            // Continuation of the previous header
            if let Some(last) = raw_headers.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
                continue;
            }
        }
        raw_headers.push((*line).to_string());
    }

    let headers = raw_headers
        .iter()
        .filter_map(|line| {
            let colon = line.find(':')?;
            if colon == 0 {
                return None;
            }
            let name = line[..colon].trim().to_lowercase();
            let value = line[colon + 1..].trim().to_string();
            Some((name, value))
        })
        .collect();

    (headers, body)
}

/// Get the first value for a header name (case-insensitive; names are
/// already lowercased by [`split_message`]).
pub fn get_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?Q?Caf=C3=A9?="` → `"Café"`.
///
/// A single regex pass replaces each token; the charset label is ignored and
/// decoded bytes are read as UTF-8. Any failure (bad base64, invalid UTF-8)
/// leaves the original token text in place. Never errors.
pub fn decode_encoded_words(input: &str) -> String {
    ENCODED_WORD_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let encoding = &caps[2];
            let payload = &caps[3];

            let bytes = if encoding.eq_ignore_ascii_case("B") {
                match base64::engine::general_purpose::STANDARD.decode(payload.as_bytes()) {
                    Ok(b) => b,
                    Err(_) => return caps[0].to_string(),
                }
            } else {
                decode_q_encoding(payload)
            };

            match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
///
/// Escapes with invalid hex digits are kept literally.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 3 <= bytes.len() => {
                if let Some(byte) = crate::parser::encoding::hex_pair(bytes[i + 1], bytes[i + 2]) {
                    result.push(byte);
                    i += 3;
                } else {
                    result.push(b'=');
                    i += 1;
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

/// Primary content type of a `Content-Type` value: text before the first
/// `;`, lowercased and trimmed.
pub fn primary_content_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Extract the `boundary` parameter from a `Content-Type` value.
pub fn boundary_param(value: &str) -> Option<String> {
    BOUNDARY_RE
        .captures(value)
        .map(|c| c[1].trim().to_string())
}

/// Render a `Date:` header value for a record: RFC 3339 if the header
/// parses as a date, otherwise the raw value kept verbatim.
pub fn header_date_string(value: &str) -> String {
    match parse_date(value) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => value.to_string(),
    }
}

/// Parse an email date string in various common formats.
///
/// Supports RFC 2822, ISO 8601, and several broken real-world variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Remove leading day-of-week: "Thu, " or "Thu "
    let no_dow = strip_day_of_week(trimmed);

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %Z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(&no_dow, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&no_dow, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    // Replace named timezones with offsets and try again
    let replaced = replace_named_tz(&no_dow);
    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(&replaced, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    debug!(date = trimmed, "Could not parse date");
    None
}

/// Strip leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = [
        "Mon,", "Tue,", "Wed,", "Thu,", "Fri,", "Sat,", "Sun,", "Mon ", "Tue ", "Wed ", "Thu ",
        "Fri ", "Sat ", "Sun ",
    ];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim().to_string();
        }
    }
    s.to_string()
}

/// Replace well-known timezone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
        ("JST", "+0900"),
    ];
    let mut result = s.to_string();
    for (name, offset) in &tzs {
        if result.ends_with(name) {
            let pos = result.len() - name.len();
            result.replace_range(pos.., offset);
            return result;
        }
    }
    result
}
