//! Integration tests for the User repository using in-memory SurrealDB.

use rankit_core::error::RankError;
use rankit_core::models::user::CreateUser;
use rankit_core::repository::UserRepository;
use rankit_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> SurrealUserRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rankit_db::run_migrations(&db).await.unwrap();
    SurrealUserRepository::new(db)
}

fn alice() -> CreateUser {
    CreateUser {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password_hash: "$argon2id$fake".into(),
    }
}

#[tokio::test]
async fn create_and_lookup() {
    let repo = setup().await;
    let user = repo.create(alice()).await.unwrap();
    assert!(user.groups_joined.is_empty());

    let by_id = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(by_id.username, "alice");

    let by_name = repo.get_by_username("alice").await.unwrap();
    assert_eq!(by_name.id, user.id);

    // Email lookup normalizes case and whitespace.
    let by_email = repo.get_by_email("  Alice@Example.COM ").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let repo = setup().await;
    repo.create(alice()).await.unwrap();

    let err = repo
        .create(CreateUser {
            username: "alice".into(),
            email: "other@example.com".into(),
            password_hash: "$argon2id$fake".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::AlreadyExists { .. }));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let repo = setup().await;
    repo.create(alice()).await.unwrap();

    let err = repo
        .create(CreateUser {
            username: "alice2".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$fake".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::AlreadyExists { .. }));
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let repo = setup().await;
    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));
    let err = repo.get_by_username("ghost").await.unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));
}

#[tokio::test]
async fn group_list_add_is_idempotent() {
    let repo = setup().await;
    let user = repo.create(alice()).await.unwrap();
    let group = Uuid::new_v4();

    repo.add_group(user.id, group).await.unwrap();
    repo.add_group(user.id, group).await.unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.groups_joined, vec![group]);

    repo.remove_group(user.id, group).await.unwrap();
    // Removing again is a no-op.
    repo.remove_group(user.id, group).await.unwrap();
    assert!(repo.get_by_id(user.id).await.unwrap().groups_joined.is_empty());
}

#[tokio::test]
async fn add_group_to_missing_user_is_not_found() {
    let repo = setup().await;
    let err = repo
        .add_group(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));
}
