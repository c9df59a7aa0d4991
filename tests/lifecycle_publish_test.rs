//! Publish-path integration: required schemes, synchronous vs asynchronous
//! registration, external pass-through and parent concept identifiers.

mod common;

use common::TestEnv;
use registrar_core::models::{PidAttrs, PidsMap};
use registrar_core::{PidStatus, RegistrationOutcome};

#[tokio::test]
async fn test_publish_mints_required_schemes() {
    let env = TestEnv::new();
    let (mut record, mut parent) = env.draft();

    // create draft with an empty placeholder map
    let issues = env
        .record_component
        .create_draft(&mut record, PidsMap::new())
        .await
        .unwrap();
    assert!(issues.is_empty());
    assert!(record.pids.is_empty());

    env.publish(&mut record, &mut parent).await.unwrap();

    assert_eq!(record.pids.len(), 2);
    assert!(record.is_published);

    // oai registers synchronously, doi waits for the async worker
    let oai = env
        .store
        .get("oai", &record.pids["oai"].identifier)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(oai.status, PidStatus::Registered);

    let doi = env
        .store
        .get("doi", &record.pids["doi"].identifier)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doi.status, PidStatus::Reserved);

    // publish itself never contacted the authority
    assert!(env.client.calls().is_empty());
}

#[tokio::test]
async fn test_worker_completes_doi_registration() {
    let env = TestEnv::new();
    let (mut record, mut parent) = env.draft();
    env.publish(&mut record, &mut parent).await.unwrap();

    let outcomes = env.run_scheduled().await;
    assert!(outcomes.contains(&RegistrationOutcome::Registered));

    let doi = env
        .store
        .get("doi", &record.pids["doi"].identifier)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doi.status, PidStatus::Registered);

    // the record DOI and the concept DOI were both published remotely
    assert_eq!(env.client.call_count("publish"), 2);
}

#[tokio::test]
async fn test_parent_concept_doi_stable_across_versions() {
    let env = TestEnv::new();
    let (mut v1, mut parent) = env.draft();
    env.publish(&mut v1, &mut parent).await.unwrap();

    let concept_doi = parent.pids["doi"].identifier.clone();

    let mut v2 = env.record_component.new_version(&v1);
    assert!(v2.pids.is_empty(), "record-level pids are never inherited");

    env.publish(&mut v2, &mut parent).await.unwrap();

    assert_eq!(parent.pids["doi"].identifier, concept_doi);
    assert_ne!(v1.pids["doi"].identifier, v2.pids["doi"].identifier);

    // one concept row exists, not one per version
    let rows = env
        .store
        .list_for_subject(&parent.subject())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_externally_supplied_doi_is_tracked_but_never_registered() {
    let env = TestEnv::new();
    let (mut record, mut parent) = env.draft();

    let mut incoming = PidsMap::new();
    incoming.insert(
        "doi".to_string(),
        PidAttrs::new("10.9999/supplied-elsewhere", "external"),
    );
    let issues = env
        .record_component
        .create_draft(&mut record, incoming)
        .await
        .unwrap();
    assert!(issues.is_empty());

    env.publish(&mut record, &mut parent).await.unwrap();

    // the pass-through value claims a local row, already registered
    let row = env
        .store
        .get("doi", "10.9999/supplied-elsewhere")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, PidStatus::Registered);
    assert_eq!(row.provider_name, "external");

    // an external DOI does not force a concept DOI onto the parent
    assert!(parent.pids.is_empty());

    // the scheduled doi job finds nothing to do
    let outcomes = env.run_scheduled().await;
    assert!(outcomes.contains(&RegistrationOutcome::Skipped));
    assert_eq!(env.client.call_count("publish"), 0);
}

#[tokio::test]
async fn test_duplicate_external_doi_is_rejected_across_records() {
    let env = TestEnv::new();

    let (mut first, mut first_parent) = env.draft();
    let mut supplied = PidsMap::new();
    supplied.insert("doi".to_string(), PidAttrs::new("10.9999/dup", "external"));
    env.record_component
        .create_draft(&mut first, supplied.clone())
        .await
        .unwrap();
    env.publish(&mut first, &mut first_parent).await.unwrap();

    // a second record supplying the identical DOI is flagged at draft time
    let (mut second, mut second_parent) = env.draft();
    let issues = env
        .record_component
        .create_draft(&mut second, supplied)
        .await
        .unwrap();
    assert!(
        issues
            .iter()
            .any(|i| i.field == "pids.doi.identifier" && i.message.contains("already in use")),
        "unexpected issues: {issues:?}"
    );

    // and publish refuses outright
    let err = env.publish(&mut second, &mut second_parent).await.unwrap_err();
    assert!(matches!(err, registrar_core::RegistrarError::Validation(_)));
    assert!(!second.is_published);
}

#[tokio::test]
async fn test_edit_keeps_published_identifiers() {
    let env = TestEnv::new();
    let (mut record, mut parent) = env.draft();
    env.publish(&mut record, &mut parent).await.unwrap();

    let draft = env.record_component.edit(&record);
    assert_eq!(draft.pids, record.pids);

    // attempting to change the managed DOI in the edit draft is flagged
    let mut mutated = draft.pids.clone();
    mutated.insert("doi".to_string(), PidAttrs::new("10.9999/other", "external"));
    let mut draft = draft;
    let issues = env
        .record_component
        .update_draft(&mut draft, mutated, Some(&record), false)
        .await
        .unwrap();
    assert!(issues.iter().any(|i| i.field == "pids.doi"));
}
