//! Property-based tests for the sanitizer and draft handling.

use proptest::prelude::*;

use chatstitch::chat::{ChatDraft, DraftMessage, Timestamp};
use chatstitch::message::{MetaValue, Role};
use chatstitch::sanitize::Sanitizer;

fn arb_body() -> impl Strategy<Value = String> {
    // Mix markup-heavy strings with plain text, including splice bait.
    prop_oneof![
        "[a-zA-Z0-9 <>/=\"']{0,60}",
        prop::sample::select(vec![
            "<b>bold</b>".to_string(),
            "<script>alert(1)</script>".to_string(),
            "<<x>y>".to_string(),
            "<IMG SRC=x ONERROR=y>".to_string(),
            "plain text".to_string(),
            "a < b > c".to_string(),
            "line\r\nbreak\u{0}".to_string(),
            String::new(),
        ]),
    ]
}

fn arb_timestamp() -> impl Strategy<Value = Option<Timestamp>> {
    prop_oneof![
        Just(None),
        (0i64..2_000_000_000).prop_map(|s| Some(Timestamp::Unix(s as f64))),
        (0i64..2_000_000_000_000).prop_map(|ms| Some(Timestamp::Millis(ms))),
        Just(Some(Timestamp::Rfc3339("2024-01-15T10:30:00Z".to_string()))),
        Just(Some(Timestamp::Rfc3339("garbage".to_string()))),
    ]
}

fn arb_draft() -> impl Strategy<Value = ChatDraft> {
    prop::collection::vec((arb_body(), arb_timestamp()), 0..12).prop_map(|entries| ChatDraft {
        title: None,
        messages: entries
            .into_iter()
            .map(|(body, ts)| DraftMessage {
                role: Role::User,
                body,
                timestamp: ts,
                metadata: Default::default(),
            })
            .collect(),
        ..ChatDraft::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Sanitizing twice is the same as sanitizing once.
    #[test]
    fn sanitize_is_idempotent(draft in arb_draft()) {
        let sanitizer = Sanitizer::new();
        let once = sanitizer.sanitize(draft);
        let twice = sanitizer.sanitize(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Sanitization never reorders or drops messages.
    #[test]
    fn sanitize_preserves_count_and_order(draft in arb_draft()) {
        let sanitizer = Sanitizer::new();
        let tagged: ChatDraft = ChatDraft {
            messages: draft
                .messages
                .iter()
                .enumerate()
                .map(|(i, msg)| {
                    let mut m = msg.clone();
                    m.metadata.insert("idx".to_string(), (i as i64).into());
                    m
                })
                .collect(),
            ..draft
        };
        let count = tagged.messages.len();
        let clean = sanitizer.sanitize(tagged);
        prop_assert_eq!(clean.messages.len(), count);
        for (i, msg) in clean.messages.iter().enumerate() {
            prop_assert_eq!(msg.metadata.get("idx"), Some(&MetaValue::Int(i as i64)));
        }
    }

    /// After one pass every timestamp is UTC or absent.
    #[test]
    fn sanitize_normalizes_all_timestamps(draft in arb_draft()) {
        let sanitizer = Sanitizer::new();
        let clean = sanitizer.sanitize(draft);
        for msg in &clean.messages {
            prop_assert!(matches!(msg.timestamp, None | Some(Timestamp::Utc(_))));
        }
    }

    /// Every tag left in a cleaned body is an allowed canonical tag.
    #[test]
    fn clean_bodies_contain_only_allowed_tags(body in arb_body()) {
        let sanitizer = Sanitizer::new();
        let clean = sanitizer.clean_body(&body);
        let tag_re = regex::Regex::new(r"</?([A-Za-z][A-Za-z0-9]*)(?:\s[^>]*)?/?>").unwrap();
        let allowed = ["b", "i", "em", "strong", "code", "pre", "br", "blockquote"];
        for caps in tag_re.captures_iter(&clean) {
            let name = caps[1].to_lowercase();
            prop_assert!(allowed.contains(&name.as_str()), "tag {:?} in {:?}", &caps[0], clean);
            // Attributes are gone: the tag is exactly its canonical form.
            let expected = if caps[0].starts_with("</") {
                format!("</{name}>")
            } else {
                format!("<{name}>")
            };
            prop_assert_eq!(&caps[0], expected.as_str());
        }
    }
}
