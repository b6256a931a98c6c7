//! MBOX archive splitting.
//!
//! Operates on a whole archive held in memory. Tolerant of malformed input:
//! mixed line endings, a UTF-8 BOM, text before the first separator, and
//! `From ` tokens inside bodies (only line-start occurrences delimit).
//! Standard `>From ` escaping is deliberately NOT unescaped; this reproduces
//! the lenient split rather than a strict MBOX reader.

use tracing::debug;

/// Split a raw MBOX archive into per-message blocks.
///
/// Line endings are normalized to `\n` first. A message begins at every
/// line starting with `From ` (the RFC 4155 separator); its block is that
/// line plus everything up to, but not including, the next separator line.
/// Content before the first separator is discarded.
///
/// An archive with no separators yields an empty Vec, never an error.
pub fn split_messages(archive: &str) -> Vec<String> {
    let normalized = archive.replace("\r\n", "\n");
    // Strip BOM if present
    let text = normalized.strip_prefix('\u{feff}').unwrap_or(&normalized);

    let mut starts: Vec<usize> = Vec::new();
    if text.starts_with("From ") {
        starts.push(0);
    }
    for (pos, _) in text.match_indices("\nFrom ") {
        starts.push(pos + 1);
    }

    let mut blocks = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = match starts.get(i + 1) {
            // Exclude the newline that precedes the next separator
            Some(&next) => next - 1,
            None => text.len(),
        };
        blocks.push(text[start..end].to_string());
    }

    debug!(count = blocks.len(), "Split MBOX archive into message blocks");
    blocks
}
