//! Frontmatter helpers for memory files
//!
//! Only the small `key: value` header used by megg files is handled here.
//! Files without a header are left alone: a header is never retrofitted
//! onto a hand-written file.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Opening delimiters, CRLF first
const OPENINGS: [&str; 2] = ["---\r\n", "---\n"];

static UPDATED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^updated: [^\r\n]*").expect("updated pattern is valid"));

/// Timestamp format written into frontmatter (`2026-01-14T09:30:00.000Z`)
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A new document: `created`/`updated` stamped with `now`, then `body`
pub fn new_document(doc_type: &str, body: &str, now: DateTime<Utc>) -> String {
    let stamp = timestamp(now);
    format!(
        "---\ncreated: {stamp}\nupdated: {stamp}\ntype: {doc_type}\n---\n\n{body}"
    )
}

/// Set the `updated` field to `now`
///
/// Replaces the `updated:` line of the header, or inserts one after the
/// opening delimiter when the header lacks it, keeping the file's line
/// endings (`\n` or `\r\n`). Text with no header is returned unchanged,
/// and nothing past the header is ever rewritten.
pub fn touch_updated(text: &str, now: DateTime<Utc>) -> String {
    let Some((opening, rest)) = OPENINGS
        .iter()
        .find_map(|o| text.strip_prefix(*o).map(|rest| (*o, rest)))
    else {
        return text.to_string();
    };
    let eol = &opening["---".len()..];
    let line = format!("updated: {}", timestamp(now));

    // Header runs up to the closing delimiter; without one, to the end
    let header_end = rest.find("\n---").map(|i| i + 1).unwrap_or(rest.len());
    let (header, tail) = rest.split_at(header_end);

    if UPDATED_RE.is_match(header) {
        let header = UPDATED_RE.replace(header, regex::NoExpand(&line));
        format!("{opening}{header}{tail}")
    } else {
        format!("{opening}{line}{eol}{rest}")
    }
}
