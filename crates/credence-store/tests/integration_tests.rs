//! Integration tests for the SQLite claim store

use credence_domain::traits::ClaimStore;
use credence_domain::{
    Claim, ClaimConfidence, ClaimId, ClaimSource, ClaimStatus, ClaimSubject, ConfidenceValue,
    Contradiction, ContradictionSeverity, ContradictionStatus, ContradictionType, Defeater,
    DefeaterId, DefeaterStatus, DefeaterType, Severity, SourceLocation, SourceType,
};
use credence_store::SqliteStore;

fn sample_claim(proposition: &str) -> Claim {
    Claim::new(
        proposition,
        "behavior",
        ClaimSubject {
            kind: "function".into(),
            identifier: "parse".into(),
            location: Some(SourceLocation {
                file: "src/parse.rs".into(),
                line: Some(42),
            }),
        },
        ClaimSource {
            source_type: SourceType::Indexer,
            id: "indexer-v1".into(),
        },
        ClaimConfidence::from_single(
            "structural",
            ConfidenceValue::derived(0.8, "ast_match", vec![]).unwrap(),
        ),
        1_700_000_000_000,
    )
}

fn sample_defeater(affected: Vec<ClaimId>) -> Defeater {
    Defeater::new(
        DefeaterType::CodeChange,
        "src/parse.rs changed",
        Severity::Partial,
        affected,
        0.3,
        true,
        1_700_000_001_000,
    )
}

#[test]
fn test_claim_round_trip() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let claim = sample_claim("parse handles utf8");
    store.upsert_claim(claim.clone()).unwrap();

    let loaded = store.get_claim(claim.id).unwrap().unwrap();
    assert_eq!(loaded, claim);
}

#[test]
fn test_get_missing_claim_is_none() {
    let store = SqliteStore::new(":memory:").unwrap();
    assert!(store.get_claim(ClaimId::new()).unwrap().is_none());
}

#[test]
fn test_upsert_updates_in_place() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let mut claim = sample_claim("parse handles utf8");
    store.upsert_claim(claim.clone()).unwrap();

    claim.status = ClaimStatus::Stale;
    claim.confidence.apply_reduction(0.2);
    store.upsert_claim(claim.clone()).unwrap();

    let loaded = store.get_claim(claim.id).unwrap().unwrap();
    assert_eq!(loaded.status, ClaimStatus::Stale);
    assert_eq!(loaded.confidence, claim.confidence);
    assert_eq!(store.claim_count().unwrap(), 1);
}

#[test]
fn test_active_claims_filters_by_status() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let active = sample_claim("parse handles utf8");
    let mut defeated = sample_claim("parse rejects binary");
    defeated.status = ClaimStatus::Defeated;
    let mut stale = sample_claim("parse skips bom");
    stale.status = ClaimStatus::Stale;
    store
        .upsert_claims(vec![active.clone(), defeated, stale])
        .unwrap();

    let found = store.active_claims().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, active.id);
    assert_eq!(store.claim_count().unwrap(), 3);
}

#[test]
fn test_batch_upsert_is_atomic_on_success() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let claims: Vec<Claim> = (0..20)
        .map(|i| sample_claim(&format!("claim number {}", i)))
        .collect();
    store.upsert_claims(claims).unwrap();
    assert_eq!(store.claim_count().unwrap(), 20);
    assert_eq!(store.active_claims().unwrap().len(), 20);
}

#[test]
fn test_defeater_round_trip_and_active_filter() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let claim = sample_claim("parse handles utf8");
    let defeater = sample_defeater(vec![claim.id]);
    store.upsert_claim(claim).unwrap();
    store.upsert_defeater(defeater.clone()).unwrap();

    let loaded = store.get_defeater(defeater.id).unwrap().unwrap();
    assert_eq!(loaded, defeater);
    assert_eq!(store.active_defeaters().unwrap().len(), 1);

    let mut resolved = defeater;
    resolved.status = DefeaterStatus::Resolved;
    store.upsert_defeater(resolved).unwrap();
    assert!(store.active_defeaters().unwrap().is_empty());
}

#[test]
fn test_get_missing_defeater_is_none() {
    let store = SqliteStore::new(":memory:").unwrap();
    assert!(store.get_defeater(DefeaterId::new()).unwrap().is_none());
}

#[test]
fn test_contradictions_filter_by_open_status() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let contradiction = Contradiction::new(
        ClaimId::new(),
        ClaimId::new(),
        ContradictionType::Direct,
        ContradictionSeverity::Blocking,
        "polarity flip",
        1_700_000_002_000,
    );
    store.record_contradiction(contradiction.clone()).unwrap();

    let open = store.unresolved_contradictions().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0], contradiction);

    let mut resolved = contradiction;
    resolved.status = ContradictionStatus::Resolved;
    store.record_contradiction(resolved).unwrap();
    assert!(store.unresolved_contradictions().unwrap().is_empty());
}

#[test]
fn test_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claims.db");
    let claim = sample_claim("parse handles utf8");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.upsert_claim(claim.clone()).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let loaded = store.get_claim(claim.id).unwrap().unwrap();
    assert_eq!(loaded, claim);
}

#[test]
fn test_active_claims_ordered_by_created_at() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let mut newer = sample_claim("newer claim here");
    newer.created_at = 2_000;
    let mut older = sample_claim("older claim here");
    older.created_at = 1_000;
    store.upsert_claims(vec![newer.clone(), older.clone()]).unwrap();

    let found = store.active_claims().unwrap();
    assert_eq!(found[0].id, older.id);
    assert_eq!(found[1].id, newer.id);
}
