//! Integration tests for `DocumentRepository` over an in-memory collection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tenantdb_core::entity::Entity;
use tenantdb_core::error::DomainError;
use tenantdb_core::paging::FindPagingQuery;
use tenantdb_core::repository::Repository;
use tenantdb_document::DocumentRepository;
use tenantdb_filter::{Combinator, FilterEvent, Operand, Operator};
use tenantdb_test_support::{InMemoryCollection, ScriptedParser};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    id: String,
    tenant_id: String,
    name: String,
    age: i64,
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

fn user(tenant_id: &str, id: &str, name: &str, age: i64) -> User {
    User {
        id: id.to_owned(),
        tenant_id: tenant_id.to_owned(),
        name: name.to_owned(),
        age,
    }
}

fn parser() -> ScriptedParser {
    ScriptedParser::new()
        .with(
            "age=gt=30",
            vec![FilterEvent::comparison("age", Operator::Gt, Operand::scalar(30))],
        )
        .with(
            "(name=like=ad,id=in=(u3))",
            vec![
                FilterEvent::GroupStart(Combinator::Or),
                FilterEvent::comparison("name", Operator::Like, Operand::scalar("ad")),
                FilterEvent::comparison("id", Operator::In, Operand::list(["u3"])),
                FilterEvent::GroupEnd,
            ],
        )
        .with(
            "(age=gt=1",
            vec![
                FilterEvent::GroupStart(Combinator::And),
                FilterEvent::comparison("age", Operator::Gt, Operand::scalar(1)),
            ],
        )
}

async fn seeded() -> (Arc<InMemoryCollection>, DocumentRepository<User>) {
    let collection = Arc::new(InMemoryCollection::new());
    let repository = DocumentRepository::new(collection.clone(), Arc::new(parser()));
    let seed = vec![
        user("t1", "u1", "Ada", 36),
        user("t1", "u2", "Grace", 45),
        user("t1", "u3", "Linus", 28),
        user("t2", "u4", "Adele", 50),
    ];
    let inserted = repository.insert_many(seed).await;
    assert!(inserted.is_found());
    (collection, repository)
}

#[tokio::test]
async fn test_insert_stores_id_under_native_key() {
    // Arrange
    let collection = Arc::new(InMemoryCollection::new());
    let repository: DocumentRepository<User> =
        DocumentRepository::new(collection.clone(), Arc::new(parser()));

    // Act
    let outcome = repository.insert(user("t1", "u1", "Ada", 36)).await;

    // Assert
    assert!(outcome.is_found());
    assert_eq!(
        Value::Object(collection.documents()[0].clone()),
        json!({"_id": "u1", "tenantId": "t1", "name": "Ada", "age": 36})
    );
}

#[tokio::test]
async fn test_insert_with_empty_tenant_fails_before_backend() {
    let collection = Arc::new(InMemoryCollection::new());
    let repository: DocumentRepository<User> =
        DocumentRepository::new(collection.clone(), Arc::new(parser()));

    let outcome = repository.insert(user("", "u1", "Ada", 36)).await;

    assert!(matches!(outcome.error(), Some(DomainError::PreconditionFailed(_))));
    assert!(collection.documents().is_empty());
}

#[tokio::test]
async fn test_find_by_id_is_scoped_to_tenant() {
    let (collection, repository) = seeded().await;

    let own = repository.find_by_id("t1", "u1").await;
    let foreign = repository.find_by_id("t1", "u4").await;

    assert_eq!(own.data().map(|u| u.name.as_str()), Some("Ada"));
    assert!(!foreign.is_found());
    assert!(foreign.error().is_none());
    assert_eq!(
        Value::Object(collection.filters().last().cloned().unwrap()),
        json!({"_id": "u4", "tenantId": "t1"})
    );
}

#[tokio::test]
async fn test_find_by_id_miss_can_be_turned_into_not_found_error() {
    let (_, repository) = seeded().await;

    let result = repository
        .find_by_id("t1", "missing")
        .await
        .on_success(|_| panic!("nothing should match"))
        .on_not_found(|| DomainError::NotFound("user missing".into()))
        .into_result();

    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_find_list_applies_filter_and_tenant() {
    // Arrange
    let (collection, repository) = seeded().await;

    // Act
    let outcome = repository.find_list("t1", "age=gt=30").await;

    // Assert
    let names: Vec<&str> = outcome
        .data()
        .unwrap()
        .iter()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(names, ["Ada", "Grace"]);
    assert_eq!(
        Value::Object(collection.filters().last().cloned().unwrap()),
        json!({"age": {"$gt": 30}, "tenantId": "t1"})
    );
}

#[tokio::test]
async fn test_find_list_or_group_carries_tenant_inside_disjunction() {
    let (collection, repository) = seeded().await;

    let outcome = repository.find_list("t1", "(name=like=ad,id=in=(u3))").await;

    assert_eq!(
        Value::Object(collection.filters().last().cloned().unwrap()),
        json!({"$or": [
            {"name": {"$regex": "ad", "$options": "im"}},
            {"_id": {"$in": ["u3"]}},
            {"tenantId": "t1"}
        ]})
    );
    // The tenant term sits inside the disjunction, so every t1 entity matches
    // along with the foreign "Adele".
    assert_eq!(outcome.data().unwrap().len(), 4);
}

#[tokio::test]
async fn test_find_list_with_unclosed_group_is_a_contract_violation() {
    let (collection, repository) = seeded().await;
    let calls_before = collection.filters().len();

    let outcome = repository.find_list("t1", "(age=gt=1").await;

    assert!(matches!(outcome.error(), Some(DomainError::ContractViolation(_))));
    assert_eq!(collection.filters().len(), calls_before);
}

#[tokio::test]
async fn test_find_list_with_unparseable_filter_is_invalid() {
    let (_, repository) = seeded().await;

    let outcome = repository.find_list("t1", "name==").await;

    assert!(matches!(outcome.error(), Some(DomainError::InvalidFilter(_))));
}

#[tokio::test]
async fn test_find_all_and_find_by_ids() {
    let (_, repository) = seeded().await;

    let all = repository.find_all("t1").await;
    let some = repository
        .find_by_ids("t1", &["u2".to_owned(), "u4".to_owned()])
        .await;
    let none = repository.find_all("t3").await;

    assert_eq!(all.data().unwrap().len(), 3);
    assert_eq!(some.data().unwrap(), &vec![user("t1", "u2", "Grace", 45)]);
    assert!(!none.is_found());
    assert!(none.error().is_none());
}

#[tokio::test]
async fn test_update_replaces_matching_entity_only() {
    let (_, repository) = seeded().await;

    let updated = repository.update(user("t1", "u1", "Ada Lovelace", 37)).await;
    let foreign = repository.update(user("t1", "u4", "Hijack", 1)).await;

    assert!(updated.is_found());
    assert!(!foreign.is_found());
    assert!(foreign.error().is_none());
    let reloaded = repository.find_by_id("t1", "u1").await.into_result().unwrap();
    assert_eq!(reloaded.unwrap().name, "Ada Lovelace");
    let untouched = repository.find_by_id("t2", "u4").await.into_result().unwrap();
    assert_eq!(untouched.unwrap().name, "Adele");
}

#[tokio::test]
async fn test_update_many_skips_unmatched_entities() {
    let (_, repository) = seeded().await;

    let outcome = repository
        .update_many(vec![
            user("t1", "u2", "Grace Hopper", 46),
            user("t1", "nobody", "Ghost", 0),
        ])
        .await;

    assert_eq!(outcome.data().unwrap().len(), 1);
}

#[tokio::test]
async fn test_deletes_report_counts() {
    let (collection, repository) = seeded().await;

    let by_id = repository.delete_by_id("t1", "u1").await;
    let by_ids = repository
        .delete_by_ids("t1", &["u2".to_owned(), "u4".to_owned()])
        .await;
    let rest = repository.delete_all("t1").await;
    let nothing = repository.delete_all("t1").await;

    assert_eq!(by_id.data(), Some(&1));
    assert_eq!(by_ids.data(), Some(&1));
    assert_eq!(rest.data(), Some(&1));
    assert!(!nothing.is_found());
    assert_eq!(collection.documents().len(), 1);
}

#[tokio::test]
async fn test_delete_with_empty_tenant_is_precondition_failure() {
    let (collection, repository) = seeded().await;

    let outcome = repository.delete_all(" ").await;

    assert!(matches!(outcome.error(), Some(DomainError::PreconditionFailed(_))));
    assert_eq!(collection.documents().len(), 4);
}

#[tokio::test]
async fn test_find_paging_sorts_windows_and_counts() {
    // Arrange
    let (_, repository) = seeded().await;
    let query = FindPagingQuery::new("t1").with_sort("-age").with_page(1, 2);

    // Act
    let page = repository.find_paging(&query).await;

    // Assert
    assert!(page.is_found());
    assert_eq!(page.total_rows(), 3);
    assert_eq!(page.total_pages(), 1);
    assert_eq!(page.page_num(), 1);
    assert_eq!(page.page_size(), 2);
    assert_eq!(page.sort(), "-age");
    assert_eq!(page.data().unwrap(), &[user("t1", "u3", "Linus", 28)]);
}

#[tokio::test]
async fn test_find_paging_with_bad_sort_is_invalid() {
    let (_, repository) = seeded().await;
    let query = FindPagingQuery::new("t1").with_sort("age:sideways");

    let page = repository.find_paging(&query).await;

    assert!(matches!(page.error(), Some(DomainError::InvalidFilter(_))));
    assert!(!page.is_found());
}

#[tokio::test]
async fn test_backend_errors_pass_through_unchanged() {
    let (collection, repository) = seeded().await;
    collection.fail_with("socket closed");

    let outcome = repository.find_all("t1").await;

    match outcome.error() {
        Some(DomainError::Backend(source)) => assert_eq!(source.to_string(), "socket closed"),
        other => panic!("expected backend error, got {other:?}"),
    }
    assert!(!outcome.is_found());
}

#[tokio::test]
async fn test_delete_by_filter_removes_matching_entities_of_tenant_only() {
    // Arrange
    let (collection, repository) = seeded().await;

    // Act
    let outcome = repository.delete_by_filter("t1", "age=gt=30").await;

    // Assert
    assert_eq!(outcome.data(), Some(&2));
    assert_eq!(
        Value::Object(collection.filters().last().cloned().unwrap()),
        json!({"age": {"$gt": 30}, "tenantId": "t1"})
    );
    let remaining: Vec<String> = collection
        .documents()
        .iter()
        .map(|document| document["_id"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(remaining, ["u3", "u4"]);
}

#[tokio::test]
async fn test_delete_by_filter_rejects_empty_tenant_and_bad_filter() {
    let (collection, repository) = seeded().await;

    let no_tenant = repository.delete_by_filter("", "age=gt=30").await;
    let bad_filter = repository.delete_by_filter("t1", "name==").await;

    assert!(matches!(no_tenant.error(), Some(DomainError::PreconditionFailed(_))));
    assert!(matches!(bad_filter.error(), Some(DomainError::InvalidFilter(_))));
    assert_eq!(collection.documents().len(), 4);
}

#[tokio::test]
async fn test_find_paging_rejects_negative_page_size() {
    // Arrange
    let (collection, repository) = seeded().await;
    let calls_before = collection.filters().len();
    let query = FindPagingQuery::new("t1").with_page(0, -5);

    // Act
    let page = repository.find_paging(&query).await;

    // Assert
    assert!(matches!(page.error(), Some(DomainError::InvalidFilter(_))));
    assert!(!page.is_found());
    assert_eq!(collection.filters().len(), calls_before);
}

#[tokio::test]
async fn test_find_paging_with_overflowing_page_is_invalid() {
    let (collection, repository) = seeded().await;
    let calls_before = collection.filters().len();
    let query = FindPagingQuery::new("t1").with_page(i64::MAX / 2, 10);

    let page = repository.find_paging(&query).await;

    assert!(matches!(page.error(), Some(DomainError::InvalidFilter(_))));
    assert_eq!(collection.filters().len(), calls_before);
}
