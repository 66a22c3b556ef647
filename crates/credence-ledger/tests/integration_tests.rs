//! Integration tests for the SQLite evidence ledger

use credence_domain::traits::{
    EvidenceLedger, EvidenceQuery, OrderBy, OrderDirection, SubscriptionFilter,
};
use credence_domain::{
    AbsenceReason, ConfidenceValue, EvidenceId, EvidenceKind, NewEvidence, Provenance,
};
use credence_ledger::{LedgerError, SqliteLedger};
use std::sync::{Arc, Mutex};

fn ledger() -> SqliteLedger {
    SqliteLedger::new(":memory:").unwrap()
}

fn draft(kind: EvidenceKind) -> NewEvidence {
    NewEvidence::new(
        kind,
        serde_json::json!({"detail": "something happened"}),
        Provenance::new("indexer", "ast_walk"),
    )
}

fn derived(value: f64) -> ConfidenceValue {
    ConfidenceValue::derived(value, "extraction", vec![]).unwrap()
}

#[test]
fn test_append_assigns_id_and_timestamp() {
    let mut ledger = ledger();
    let entry = ledger.append(draft(EvidenceKind::Extraction)).unwrap();
    assert!(entry.timestamp > 0);

    let loaded = ledger.get(entry.id).unwrap().unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn test_get_unknown_id_is_none() {
    let ledger = ledger();
    assert!(ledger.get(EvidenceId::new()).unwrap().is_none());
}

#[test]
fn test_batch_append_shares_a_timestamp() {
    let mut ledger = ledger();
    let entries = ledger
        .append_batch(vec![
            draft(EvidenceKind::Extraction),
            draft(EvidenceKind::Claim),
            draft(EvidenceKind::Verification),
        ])
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.timestamp == entries[0].timestamp));

    // Default order is newest-first; same-timestamp entries fall back to
    // insert order, reversed
    let found = ledger
        .query(&EvidenceQuery {
            limit: Some(3),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].id, entries[2].id);
    assert_eq!(found[2].id, entries[0].id);
}

#[test]
fn test_default_query_is_newest_first() {
    let mut ledger = ledger();
    let first = ledger.append(draft(EvidenceKind::Extraction)).unwrap();
    let second = ledger.append(draft(EvidenceKind::Claim)).unwrap();

    let found = ledger.query(&EvidenceQuery::default()).unwrap();
    assert_eq!(found[0].id, second.id);
    assert_eq!(found[1].id, first.id);
}

#[test]
fn test_query_filters_are_conjunctive() {
    let mut ledger = ledger();
    ledger
        .append(draft(EvidenceKind::Claim).with_session("s1"))
        .unwrap();
    ledger
        .append(draft(EvidenceKind::Claim).with_session("s2"))
        .unwrap();
    ledger
        .append(draft(EvidenceKind::Retrieval).with_session("s1"))
        .unwrap();

    let found = ledger
        .query(&EvidenceQuery {
            kinds: Some(vec![EvidenceKind::Claim]),
            session_id: Some("s1".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, EvidenceKind::Claim);
    assert_eq!(found[0].session_id.as_deref(), Some("s1"));
}

#[test]
fn test_query_by_source_and_text() {
    let mut ledger = ledger();
    ledger
        .append(NewEvidence::new(
            EvidenceKind::Extraction,
            serde_json::json!({"file": "src/parse.rs"}),
            Provenance::new("indexer", "ast_walk"),
        ))
        .unwrap();
    ledger
        .append(NewEvidence::new(
            EvidenceKind::Extraction,
            serde_json::json!({"file": "src/render.rs"}),
            Provenance::new("extractor", "llm_extraction"),
        ))
        .unwrap();

    let by_source = ledger
        .query(&EvidenceQuery {
            source: Some("indexer".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_source.len(), 1);

    let by_text = ledger
        .query(&EvidenceQuery {
            text_search: Some("render".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_text.len(), 1);
    assert_eq!(by_text[0].provenance.source, "extractor");
}

#[test]
fn test_limit_and_offset() {
    let mut ledger = ledger();
    let entries = ledger
        .append_batch((0..10).map(|_| draft(EvidenceKind::ToolCall)).collect())
        .unwrap();

    let page = ledger
        .query(&EvidenceQuery {
            limit: Some(3),
            offset: Some(2),
            order_direction: OrderDirection::Ascending,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(page[0].id, entries[2].id);
}

#[test]
fn test_offset_without_limit_still_returns_rows() {
    let mut ledger = ledger();
    ledger
        .append_batch((0..5).map(|_| draft(EvidenceKind::ToolCall)).collect())
        .unwrap();

    let found = ledger
        .query(&EvidenceQuery {
            offset: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(found.len(), 3);
}

#[test]
fn test_order_by_kind() {
    let mut ledger = ledger();
    ledger.append(draft(EvidenceKind::Retrieval)).unwrap();
    ledger.append(draft(EvidenceKind::Claim)).unwrap();

    let found = ledger
        .query(&EvidenceQuery {
            order_by: OrderBy::Kind,
            order_direction: OrderDirection::Ascending,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(found[0].kind, EvidenceKind::Claim);
    assert_eq!(found[1].kind, EvidenceKind::Retrieval);
}

#[test]
fn test_chain_follows_back_references() {
    let mut ledger = ledger();
    let a = ledger
        .append(draft(EvidenceKind::Extraction).with_confidence(derived(0.9)))
        .unwrap();
    let b = ledger
        .append(
            draft(EvidenceKind::Synthesis)
                .with_confidence(derived(0.6))
                .with_related(vec![a.id]),
        )
        .unwrap();
    let c = ledger
        .append(
            draft(EvidenceKind::Claim)
                .with_confidence(derived(0.8))
                .with_related(vec![b.id]),
        )
        .unwrap();

    let chain = ledger.get_chain(c.id).unwrap();
    assert_eq!(chain.root.id, c.id);
    assert_eq!(chain.evidence.len(), 3);
    assert_eq!(chain.graph[&c.id], vec![b.id]);
    // Weakest link across the chain
    let value = chain.chain_confidence.numeric_value().unwrap();
    assert!((value - 0.6).abs() < 1e-9);
}

#[test]
fn test_chain_without_confidence_is_absent() {
    let mut ledger = ledger();
    let a = ledger
        .append(draft(EvidenceKind::Extraction).with_confidence(derived(0.9)))
        .unwrap();
    let b = ledger
        .append(draft(EvidenceKind::Claim).with_related(vec![a.id]))
        .unwrap();

    let chain = ledger.get_chain(b.id).unwrap();
    assert!(chain.chain_confidence.is_absent());
    assert_eq!(
        chain.chain_confidence.absence_reason(),
        Some(AbsenceReason::Uncalibrated)
    );
}

#[test]
fn test_chain_visits_shared_ancestors_once_and_skips_dangling_references() {
    let mut ledger = ledger();
    let ghost = EvidenceId::new();
    let a = ledger
        .append(draft(EvidenceKind::Extraction).with_related(vec![ghost]))
        .unwrap();
    // Diamond: d -> {b, c} -> a, with a dangling back-reference off a
    let b = ledger
        .append(draft(EvidenceKind::Synthesis).with_related(vec![a.id]))
        .unwrap();
    let c = ledger
        .append(draft(EvidenceKind::Synthesis).with_related(vec![a.id]))
        .unwrap();
    let d = ledger
        .append(draft(EvidenceKind::Claim).with_related(vec![b.id, c.id]))
        .unwrap();

    let chain = ledger.get_chain(d.id).unwrap();
    assert_eq!(chain.evidence.len(), 4);
    assert!(chain.graph[&a.id].contains(&ghost));
}

#[test]
fn test_chain_collects_contradiction_entries() {
    let mut ledger = ledger();
    let claim = ledger.append(draft(EvidenceKind::Claim)).unwrap();
    let contradiction = ledger
        .append(draft(EvidenceKind::Contradiction).with_related(vec![claim.id]))
        .unwrap();

    let chain = ledger.get_chain(contradiction.id).unwrap();
    assert_eq!(chain.contradictions.len(), 1);
    assert_eq!(chain.contradictions[0].id, contradiction.id);
}

#[test]
fn test_chain_for_unknown_root_fails() {
    let ledger = ledger();
    let result = ledger.get_chain(EvidenceId::new());
    assert!(matches!(result, Err(LedgerError::ClaimNotFound(_))));
}

#[test]
fn test_session_entries_are_oldest_first() {
    let mut ledger = ledger();
    let first = ledger
        .append(draft(EvidenceKind::Episode).with_session("s1"))
        .unwrap();
    ledger
        .append(draft(EvidenceKind::ToolCall).with_session("s2"))
        .unwrap();
    let second = ledger
        .append(draft(EvidenceKind::Outcome).with_session("s1"))
        .unwrap();

    let entries = ledger.get_session_entries("s1").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, first.id);
    assert_eq!(entries[1].id, second.id);
}

#[test]
fn test_subscribers_receive_matching_appends() {
    let mut ledger = ledger();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ledger.subscribe(
        SubscriptionFilter {
            kinds: Some(vec![EvidenceKind::Claim]),
            session_id: None,
        },
        Box::new(move |entry| sink.lock().unwrap().push(entry.id)),
    );

    let claim = ledger.append(draft(EvidenceKind::Claim)).unwrap();
    ledger.append(draft(EvidenceKind::Retrieval)).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![claim.id]);
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let mut ledger = ledger();
    let seen = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&seen);
    let id = ledger.subscribe(
        SubscriptionFilter::default(),
        Box::new(move |_| *sink.lock().unwrap() += 1),
    );

    ledger.append(draft(EvidenceKind::Claim)).unwrap();
    assert!(ledger.unsubscribe(id));
    assert!(!ledger.unsubscribe(id));
    ledger.append(draft(EvidenceKind::Claim)).unwrap();

    assert_eq!(*seen.lock().unwrap(), 1);
}

#[test]
fn test_panicking_subscriber_does_not_poison_the_ledger() {
    let mut ledger = ledger();
    let seen = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&seen);
    ledger.subscribe(
        SubscriptionFilter::default(),
        Box::new(|_| panic!("broken consumer")),
    );
    ledger.subscribe(
        SubscriptionFilter::default(),
        Box::new(move |_| *sink.lock().unwrap() += 1),
    );

    let entry = ledger.append(draft(EvidenceKind::Claim)).unwrap();

    // The append still persisted and the healthy subscriber still ran
    assert!(ledger.get(entry.id).unwrap().is_some());
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[test]
fn test_batch_notifies_after_commit() {
    let mut ledger = ledger();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    ledger.subscribe(
        SubscriptionFilter::default(),
        Box::new(move |entry| sink.lock().unwrap().push(entry.id)),
    );

    let entries = ledger
        .append_batch(vec![draft(EvidenceKind::Claim), draft(EvidenceKind::Outcome)])
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], entries[0].id);
}

#[test]
fn test_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let entry = {
        let mut ledger = SqliteLedger::new(&path).unwrap();
        ledger
            .append(draft(EvidenceKind::Claim).with_confidence(derived(0.7)))
            .unwrap()
    };

    let ledger = SqliteLedger::new(&path).unwrap();
    let loaded = ledger.get(entry.id).unwrap().unwrap();
    assert_eq!(loaded, entry);
}
