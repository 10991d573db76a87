//! Message body sanitization and timestamp normalization.
//!
//! [`Sanitizer`] is the one total stage of the pipeline: it never fails.
//! Bodies go through an allow-list markup transformation (permitted tags
//! kept in canonical form, everything else removed outright), and every raw
//! [`Timestamp`] becomes a UTC instant or stays absent. Anything it cannot
//! normalize degrades to the safest empty default — an empty body or an
//! absent timestamp — instead of aborting the chat.
//!
//! Sanitization is idempotent: running it twice yields the same draft.

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};

use crate::chat::{ChatDraft, Timestamp};

/// Markup tags that survive sanitization, attribute-free and lowercase.
const ALLOWED_TAGS: &[&str] = &["b", "i", "em", "strong", "code", "pre", "br", "blockquote"];

/// Strips disallowed markup and normalizes timestamps.
pub struct Sanitizer {
    tag_re: Regex,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer {
    /// Creates a sanitizer with the built-in tag allow-list.
    pub fn new() -> Self {
        Self {
            // Opening, closing or self-closing tag with optional attributes.
            tag_re: Regex::new(r"</?([A-Za-z][A-Za-z0-9]*)(?:\s[^>]*)?/?>")
                .unwrap_or_else(|_| unreachable!("tag pattern is fixed")),
        }
    }

    /// Normalizes a whole draft in place: cleaned bodies and titles, UTC
    /// timestamps. Total and idempotent.
    pub fn sanitize(&self, mut draft: ChatDraft) -> ChatDraft {
        if let Some(title) = draft.title.take() {
            let clean = self.clean_body(&title);
            if !clean.trim().is_empty() {
                draft.title = Some(clean);
            }
        }

        for msg in &mut draft.messages {
            msg.body = self.clean_body(&msg.body);
            msg.timestamp = normalize_timestamp(msg.timestamp.as_ref()).map(Timestamp::Utc);
        }

        draft
    }

    /// Applies the allow-list transformation to one body.
    ///
    /// Permitted tags are rewritten to their canonical attribute-free form;
    /// all other tags are removed, not escaped. Control characters are
    /// dropped and CRLF collapses to LF.
    pub fn clean_body(&self, body: &str) -> String {
        let mut current = strip_control(body);
        // Removing a tag can splice the surrounding text into a new tag, so
        // run to a fixpoint. Each pass never grows the string.
        loop {
            let next = self
                .tag_re
                .replace_all(&current, |caps: &Captures<'_>| canonical_tag(caps))
                .into_owned();
            if next == current {
                return next;
            }
            current = next;
        }
    }
}

fn canonical_tag(caps: &Captures<'_>) -> String {
    let name = caps[1].to_lowercase();
    if !ALLOWED_TAGS.contains(&name.as_str()) {
        return String::new();
    }
    if caps[0].starts_with("</") {
        format!("</{name}>")
    } else {
        format!("<{name}>")
    }
}

fn strip_control(body: &str) -> String {
    body.replace("\r\n", "\n")
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Converts a raw export timestamp to UTC.
///
/// Returns `None` for absent or unparseable values; callers must keep the
/// timestamp absent rather than defaulting to the current time, which would
/// corrupt conversation ordering.
pub fn normalize_timestamp(raw: Option<&Timestamp>) -> Option<DateTime<Utc>> {
    match raw? {
        Timestamp::Unix(secs) => {
            if !secs.is_finite() {
                return None;
            }
            // Euclidean decomposition keeps pre-epoch fractional seconds
            // exact: -1.5 is (-2 s, 500ms), not (-1 s, 500ms).
            let whole = secs.div_euclid(1.0) as i64;
            let nanos = (secs.rem_euclid(1.0) * 1_000_000_000.0) as u32;
            DateTime::from_timestamp(whole, nanos)
        }
        Timestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
        Timestamp::Rfc3339(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Timestamp::Utc(dt) => Some(*dt),
    }
}
