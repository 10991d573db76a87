//! Quota semantics across the whole pipeline.

use std::sync::Arc;
use std::thread;

use chatstitch::prelude::*;
use chatstitch::store::FailingSink;

const EXPORT: &str = r#"{"messages": [{"role": "user", "content": "hello"}]}"#;

fn request(caller: Caller) -> ImportRequest {
    ImportRequest::new(
        EXPORT.as_bytes().to_vec(),
        "application/json",
        "mistral",
        caller,
    )
}

#[test]
fn one_remaining_unit_two_concurrent_imports_exactly_one_succeeds() {
    let importer = Arc::new(Importer::with_defaults(Arc::new(MemorySink::new())));
    let caller = Caller::restricted("guest-race");
    importer.quota().set_allowance(&caller.id, 1);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let importer = Arc::clone(&importer);
            let caller = caller.clone();
            thread::spawn(move || importer.import(request(caller)))
        })
        .collect();

    let outcomes: Vec<ImportOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    let exceeded = outcomes
        .iter()
        .filter(|o| matches!(o.error(), Some(ImportError::QuotaExceeded(_))))
        .count();
    assert_eq!(successes, 1, "outcomes: {outcomes:?}");
    assert_eq!(exceeded, 1, "outcomes: {outcomes:?}");
    assert_eq!(importer.quota().remaining(&caller), Some(0));
}

#[test]
fn unrestricted_imports_never_create_counters() {
    let importer = Importer::with_defaults(Arc::new(MemorySink::new()));
    let caller = Caller::unrestricted("user-1");

    for _ in 0..10 {
        assert!(importer.import(request(caller.clone())).is_success());
    }

    assert!(!importer.quota().has_counters());
    assert_eq!(importer.quota().remaining(&caller), None);
}

#[test]
fn exhausted_caller_is_rejected_without_invoking_the_parser() {
    let importer = Importer::with_defaults(Arc::new(MemorySink::new()));
    let caller = Caller::restricted("guest-0");
    importer.quota().set_allowance(&caller.id, 0);

    // The payload is garbage: if the parser ran, the outcome would be
    // MalformedContent rather than QuotaExceeded.
    let outcome = importer.import(ImportRequest::new(
        b"definitely not json".to_vec(),
        "application/json",
        "mistral",
        caller.clone(),
    ));

    assert_eq!(
        outcome.error(),
        Some(&ImportError::QuotaExceeded(caller.id.clone()))
    );
}

#[test]
fn failed_parse_is_never_charged() {
    let importer = Importer::with_defaults(Arc::new(MemorySink::new()));
    let caller = Caller::restricted("guest-1");
    importer.quota().set_allowance(&caller.id, 3);

    let outcome = importer.import(ImportRequest::new(
        b"{}".to_vec(),
        "application/json",
        "mistral",
        caller.clone(),
    ));
    assert!(matches!(
        outcome.error(),
        Some(ImportError::MalformedContent { .. })
    ));
    assert_eq!(importer.quota().remaining(&caller), Some(3));
}

#[test]
fn persistence_failure_refunds_the_committed_unit() {
    let importer = Importer::with_defaults(Arc::new(FailingSink));
    let caller = Caller::restricted("guest-2");
    importer.quota().set_allowance(&caller.id, 1);

    let outcome = importer.import(request(caller.clone()));
    assert!(matches!(
        outcome.error(),
        Some(ImportError::PersistenceError(_))
    ));
    assert_eq!(importer.quota().remaining(&caller), Some(1));
}

#[test]
fn allowance_depletes_one_per_successful_import() {
    let importer = Importer::with_defaults(Arc::new(MemorySink::new()));
    let caller = Caller::restricted("guest-3");
    importer.quota().set_allowance(&caller.id, 2);

    assert!(importer.import(request(caller.clone())).is_success());
    assert_eq!(importer.quota().remaining(&caller), Some(1));
    assert!(importer.import(request(caller.clone())).is_success());
    assert_eq!(importer.quota().remaining(&caller), Some(0));

    let outcome = importer.import(request(caller.clone()));
    assert!(matches!(
        outcome.error(),
        Some(ImportError::QuotaExceeded(_))
    ));
}
