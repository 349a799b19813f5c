//! Tests for the profile service.

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::always;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{DocumentFields, DocumentStoreError, MockDocumentStore};
use crate::domain::{DisplayName, EmailAddress, ErrorCode};

#[fixture]
fn owner() -> Account {
    Account::new(
        UserId::new("owner01").expect("id"),
        EmailAddress::new("ada@example.com").expect("email"),
        DisplayName::new("Ada").expect("name"),
        Utc::now(),
    )
}

fn object(value: Value) -> DocumentFields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn stored(id: &str, fields: Value) -> Document {
    Document {
        id: DocumentId::new(id).expect("doc id"),
        fields: object(fields),
        permissions: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

fn service(store: MockDocumentStore) -> ProfileService<MockDocumentStore> {
    ProfileService::new(Arc::new(store))
}

fn owned_by(owner: &str) -> impl Fn(&DocumentFilter) -> bool + Send + 'static {
    let expected = DocumentFilter::all().equal("userId", owner);
    move |filter| *filter == expected
}

#[rstest]
#[tokio::test]
async fn first_save_creates_a_public_document_owned_by_the_caller(owner: Account) {
    let mut store = MockDocumentStore::new();
    store
        .expect_find()
        .withf(owned_by("owner01"))
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    store
        .expect_create()
        .withf(|doc| {
            doc.id == NewDocumentId::Unique
                && doc.fields["userId"] == "owner01"
                && doc.fields["userName"] == "Ada"
                && doc.fields["skills"] == "React, Node.js"
                && doc
                    .permissions
                    .iter()
                    .map(ToString::to_string)
                    .eq([r#"read("any")"#, r#"update("user:owner01")"#, r#"delete("user:owner01")"#])
        })
        .times(1)
        .return_once(|doc| Ok(stored("doc1", Value::Object(doc.fields))));
    store.expect_update().never();

    let profile = service(store)
        .upsert_profile(Some(&owner), ProfileDraft::new("", "React, Node.js", ""))
        .await
        .expect("profile saved");

    assert_eq!(profile.document_id().as_ref(), "doc1");
    assert_eq!(
        profile.skills_offered().labels().collect::<Vec<_>>(),
        ["React", "Node.js"]
    );
}

#[rstest]
#[tokio::test]
async fn later_saves_update_only_editable_fields(owner: Account) {
    let mut store = MockDocumentStore::new();
    store.expect_find().times(1).return_once(|_| {
        Ok(vec![stored(
            "doc1",
            json!({ "userId": "owner01", "userName": "Ada", "bio": "old" }),
        )])
    });
    store
        .expect_update()
        .withf(|id, fields| {
            id.as_ref() == "doc1"
                && !fields.contains_key("userId")
                && !fields.contains_key("userName")
                && fields["bio"] == "new"
        })
        .times(1)
        .return_once(|_, fields| {
            let mut merged = object(json!({ "userId": "owner01", "userName": "Ada" }));
            merged.extend(fields);
            Ok(stored("doc1", Value::Object(merged)))
        });
    store.expect_create().never();

    let profile = service(store)
        .upsert_profile(Some(&owner), ProfileDraft::new("new", "Go", "Rust"))
        .await
        .expect("profile saved");

    assert_eq!(profile.bio(), "new");
    assert_eq!(profile.display_name().as_ref(), "Ada");
}

#[rstest]
#[tokio::test]
async fn duplicate_documents_update_the_first(owner: Account) {
    let mut store = MockDocumentStore::new();
    store.expect_find().times(1).return_once(|_| {
        Ok(vec![
            stored("first", json!({ "userId": "owner01", "userName": "Ada" })),
            stored("second", json!({ "userId": "owner01", "userName": "Ada" })),
        ])
    });
    store
        .expect_update()
        .withf(|id, _| id.as_ref() == "first")
        .times(1)
        .return_once(|_, _| Ok(stored("first", json!({ "userId": "owner01", "userName": "Ada" }))));

    let profile = service(store)
        .upsert_profile(Some(&owner), ProfileDraft::default())
        .await
        .expect("profile saved");
    assert_eq!(profile.document_id().as_ref(), "first");
}

#[rstest]
#[tokio::test]
async fn anonymous_saves_fail_before_touching_the_store() {
    let mut store = MockDocumentStore::new();
    store.expect_find().never();
    store.expect_create().never();
    store.expect_update().never();

    let err = service(store)
        .upsert_profile(None, ProfileDraft::new("bio", "Rust", ""))
        .await
        .expect_err("owner required");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn failed_existence_check_writes_nothing(owner: Account) {
    let mut store = MockDocumentStore::new();
    store
        .expect_find()
        .times(1)
        .return_once(|_| Err(DocumentStoreError::transport("connection reset")));
    store.expect_create().never();
    store.expect_update().never();

    let err = service(store)
        .upsert_profile(Some(&owner), ProfileDraft::default())
        .await
        .expect_err("lookup failure surfaces");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(err.message(), "connection reset");
    assert!(err.is_transient());
}

#[rstest]
#[tokio::test]
async fn write_rejections_surface_the_store_message(owner: Account) {
    let mut store = MockDocumentStore::new();
    store.expect_find().return_once(|_| Ok(Vec::new()));
    store
        .expect_create()
        .return_once(|_| Err(DocumentStoreError::rejected("Invalid document structure")));

    let err = service(store)
        .upsert_profile(Some(&owner), ProfileDraft::default())
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "Invalid document structure");
    assert!(!err.is_transient());
}

#[rstest]
#[case(None, &["doc1", "doc2", "doc3"])]
#[case(Some("  "), &["doc1", "doc2", "doc3"])]
#[case(Some("react"), &["doc1", "doc3"])]
#[case(Some("SPANISH"), &["doc2"])]
#[case(Some("cobol"), &[])]
#[tokio::test]
async fn explore_filters_on_either_skill_list(
    #[case] search: Option<&'static str>,
    #[case] expected: &'static [&'static str],
) {
    let mut store = MockDocumentStore::new();
    store
        .expect_find()
        .withf(|filter| filter.conditions().is_empty())
        .return_once(|_| {
            Ok(vec![
                stored("doc1", json!({ "userId": "a", "userName": "A", "skills": "React" })),
                stored("doc2", json!({ "userId": "b", "userName": "B", "skillsNeeded": "Spanish" })),
                stored("doc3", json!({ "userId": "c", "userName": "C", "skillsNeeded": "React Native" })),
            ])
        });

    let profiles = service(store).explore(search).await.expect("explore");
    let ids = profiles
        .iter()
        .map(|profile| profile.document_id().as_ref())
        .collect::<Vec<_>>();
    assert_eq!(ids, expected);
}

#[rstest]
#[tokio::test]
async fn explore_skips_undecodable_documents() {
    let mut store = MockDocumentStore::new();
    store.expect_find().return_once(|_| {
        Ok(vec![
            stored("broken", json!({ "skills": "React" })),
            stored("ok", json!({ "userId": "a", "userName": "A" })),
        ])
    });

    let profiles = service(store).explore(None).await.expect("explore");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].document_id().as_ref(), "ok");
}

#[rstest]
#[tokio::test]
async fn missing_profiles_are_not_found() {
    let mut store = MockDocumentStore::new();
    store.expect_get().with(always()).return_once(|_| Ok(None));

    let err = service(store)
        .profile(&DocumentId::new("nope").expect("doc id"))
        .await
        .expect_err("not found");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn profile_for_owner_is_none_without_a_document() {
    let mut store = MockDocumentStore::new();
    store
        .expect_find()
        .withf(owned_by("owner01"))
        .return_once(|_| Ok(Vec::new()));

    let found = service(store)
        .profile_for_owner(&UserId::new("owner01").expect("id"))
        .await
        .expect("lookup");
    assert!(found.is_none());
}

#[rstest]
#[tokio::test]
async fn delete_maps_permission_failures() {
    let mut store = MockDocumentStore::new();
    store
        .expect_delete()
        .return_once(|_| Err(DocumentStoreError::unauthorized("missing scope")));

    let err = service(store)
        .delete_profile(&DocumentId::new("doc1").expect("doc id"))
        .await
        .expect_err("denied");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}
