//! Integration tests for the rating submission flow.

use rankit_core::error::RankError;
use rankit_core::models::user::CreateUser;
use rankit_core::repository::{ItemRepository, UserRepository};
use rankit_db::repository::{
    SurrealGroupRepository, SurrealItemRepository, SurrealRatingRepository,
    SurrealUserRepository,
};
use rankit_engine::{EngineConfig, ItemService, MembershipService, RatingService};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    db: Surreal<Db>,
    ratings:
        RatingService<SurrealGroupRepository<Db>, SurrealItemRepository<Db>, SurrealRatingRepository<Db>>,
    alice: Uuid,
    bob: Uuid,
    group: Uuid,
    item: Uuid,
}

/// In-memory DB with a group owned by alice, bob as member, one item.
async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rankit_db::run_migrations(&db).await.unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let alice = user_repo
        .create(CreateUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$fake".into(),
        })
        .await
        .unwrap()
        .id;
    let bob = user_repo
        .create(CreateUser {
            username: "bob".into(),
            email: "bob@example.com".into(),
            password_hash: "$argon2id$fake".into(),
        })
        .await
        .unwrap()
        .id;

    let membership = MembershipService::new(
        SurrealGroupRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
        EngineConfig::default(),
    );
    let group = membership
        .create_group("Coffee Club", "desc", alice)
        .await
        .unwrap()
        .id;
    membership.join_group(group, bob).await.unwrap();

    let items = ItemService::new(
        SurrealGroupRepository::new(db.clone()),
        SurrealItemRepository::new(db.clone()),
        SurrealRatingRepository::new(db.clone()),
        EngineConfig::default(),
    );
    let item = items
        .add_item(group, "Flat White", "silky", alice)
        .await
        .unwrap()
        .id;

    let ratings = RatingService::new(
        SurrealGroupRepository::new(db.clone()),
        SurrealItemRepository::new(db.clone()),
        SurrealRatingRepository::new(db.clone()),
    );

    Fixture {
        db,
        ratings,
        alice,
        bob,
        group,
        item,
    }
}

#[tokio::test]
async fn first_rating_updates_statistics() {
    let f = setup().await;

    let item = f
        .ratings
        .submit_rating(f.bob, f.group, f.item, 3)
        .await
        .unwrap();
    assert_eq!(item.rating_count, 1);
    assert_eq!(item.rating_sum, 3);
    assert_eq!(item.avg_rating, 3.0);
}

#[tokio::test]
async fn resubmission_replaces_previous_score() {
    let f = setup().await;

    f.ratings
        .submit_rating(f.bob, f.group, f.item, 3)
        .await
        .unwrap();
    let item = f
        .ratings
        .submit_rating(f.bob, f.group, f.item, 5)
        .await
        .unwrap();

    assert_eq!(item.rating_count, 1);
    assert_eq!(item.rating_sum, 5);
    assert_eq!(item.avg_rating, 5.0);

    let rating = f.ratings.get_rating(f.bob, f.item).await.unwrap().unwrap();
    assert_eq!(rating.score, 5);
}

#[tokio::test]
async fn ratings_from_two_users_average() {
    let f = setup().await;

    f.ratings
        .submit_rating(f.alice, f.group, f.item, 4)
        .await
        .unwrap();
    let item = f
        .ratings
        .submit_rating(f.bob, f.group, f.item, 5)
        .await
        .unwrap();

    assert_eq!(item.rating_count, 2);
    assert_eq!(item.rating_sum, 9);
    assert_eq!(item.avg_rating, 4.5);
}

#[tokio::test]
async fn out_of_range_score_mutates_nothing() {
    let f = setup().await;

    for bad in [0i64, 6, -1] {
        let err = f
            .ratings
            .submit_rating(f.bob, f.group, f.item, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, RankError::InvalidScore { .. }));
    }

    let item = SurrealItemRepository::new(f.db.clone())
        .get_by_id(f.item)
        .await
        .unwrap();
    assert_eq!(item.rating_count, 0);
    assert_eq!(item.rating_sum, 0);
    assert!(f.ratings.get_rating(f.bob, f.item).await.unwrap().is_none());
}

#[tokio::test]
async fn non_members_cannot_rate() {
    let f = setup().await;
    let outsider = SurrealUserRepository::new(f.db.clone())
        .create(CreateUser {
            username: "mallory".into(),
            email: "mallory@example.com".into(),
            password_hash: "$argon2id$fake".into(),
        })
        .await
        .unwrap()
        .id;

    let err = f
        .ratings
        .submit_rating(outsider, f.group, f.item, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::NotAuthorized { .. }));
    assert!(
        f.ratings
            .get_rating(outsider, f.item)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn item_outside_group_scope_is_not_found() {
    let f = setup().await;

    let err = f
        .ratings
        .submit_rating(f.bob, Uuid::new_v4(), f.item, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));

    let err = f
        .ratings
        .submit_rating(f.bob, f.group, Uuid::new_v4(), 4)
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));
}
