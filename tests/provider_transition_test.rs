//! Cross-version provider-transition enforcement at the draft-update seam.

mod common;

use common::TestEnv;
use registrar_core::models::{PidAttrs, PidsMap};
use registrar_core::PidStatus;

#[tokio::test]
async fn test_managed_doi_cannot_become_external_in_next_version() {
    let env = TestEnv::new();
    let (mut v1, mut parent) = env.draft();
    env.publish(&mut v1, &mut parent).await.unwrap();

    let mut v2 = env.record_component.new_version(&v1);
    let mut incoming = PidsMap::new();
    incoming.insert(
        "doi".to_string(),
        PidAttrs::new("10.9999/replacement", "external"),
    );

    let rows_before = env.store.count().await.unwrap();
    let issues = env
        .record_component
        .update_draft(&mut v2, incoming, Some(&v1), false)
        .await
        .unwrap();

    assert!(issues.iter().any(|i| i.field == "pids.doi"));
    // a rejected draft update never touches identifier rows
    assert_eq!(env.store.count().await.unwrap(), rows_before);
    let v1_doi = env
        .store
        .get("doi", &v1.pids["doi"].identifier)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v1_doi.status, PidStatus::Reserved);
}

#[tokio::test]
async fn test_managed_doi_cannot_be_dropped_in_next_version() {
    let env = TestEnv::new();
    let (mut v1, mut parent) = env.draft();
    env.publish(&mut v1, &mut parent).await.unwrap();

    let mut v2 = env.record_component.new_version(&v1);
    let issues = env
        .record_component
        .update_draft(&mut v2, PidsMap::new(), Some(&v1), false)
        .await
        .unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "pids.doi");
    assert!(issues[0].message.contains("cannot be removed"));
}

#[tokio::test]
async fn test_override_permission_bypasses_the_transition_check() {
    let env = TestEnv::new();
    let (mut v1, mut parent) = env.draft();
    env.publish(&mut v1, &mut parent).await.unwrap();

    let mut v2 = env.record_component.new_version(&v1);
    let issues = env
        .record_component
        .update_draft(&mut v2, PidsMap::new(), Some(&v1), true)
        .await
        .unwrap();

    assert!(issues.is_empty());
}

#[tokio::test]
async fn test_external_doi_can_be_upgraded_to_managed() {
    let env = TestEnv::new();
    let (mut v1, mut parent) = env.draft();
    let mut supplied = PidsMap::new();
    supplied.insert(
        "doi".to_string(),
        PidAttrs::new("10.9999/legacy", "external"),
    );
    env.record_component
        .create_draft(&mut v1, supplied)
        .await
        .unwrap();
    env.publish(&mut v1, &mut parent).await.unwrap();

    let mut v2 = env.record_component.new_version(&v1);
    let mut incoming = PidsMap::new();
    incoming.insert(
        "doi".to_string(),
        PidAttrs::new("10.1234/minted", "datacite"),
    );

    let issues = env
        .record_component
        .update_draft(&mut v2, incoming, Some(&v1), false)
        .await
        .unwrap();
    assert!(issues.is_empty());
}

#[tokio::test]
async fn test_external_doi_cannot_be_dropped_in_next_version() {
    let env = TestEnv::new();
    let (mut v1, mut parent) = env.draft();
    let mut supplied = PidsMap::new();
    supplied.insert(
        "doi".to_string(),
        PidAttrs::new("10.9999/legacy", "external"),
    );
    env.record_component
        .create_draft(&mut v1, supplied)
        .await
        .unwrap();
    env.publish(&mut v1, &mut parent).await.unwrap();

    let mut v2 = env.record_component.new_version(&v1);
    let issues = env
        .record_component
        .update_draft(&mut v2, PidsMap::new(), Some(&v1), false)
        .await
        .unwrap();

    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("externally supplied"));
}
