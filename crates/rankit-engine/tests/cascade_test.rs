//! Integration tests for cascade deletion.

use rankit_core::error::RankError;
use rankit_core::models::item::SortKey;
use rankit_core::models::user::CreateUser;
use rankit_core::repository::{
    GroupRepository, ItemRepository, RatingRepository, UserRepository,
};
use rankit_db::repository::{
    SurrealGroupRepository, SurrealItemRepository, SurrealRatingRepository,
    SurrealUserRepository,
};
use rankit_engine::{CascadeService, EngineConfig, ItemService, MembershipService, RatingService};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    db: Surreal<Db>,
    cascade: CascadeService<
        SurrealGroupRepository<Db>,
        SurrealItemRepository<Db>,
        SurrealRatingRepository<Db>,
        SurrealUserRepository<Db>,
    >,
    alice: Uuid, // owner
    bob: Uuid,   // member
    group: Uuid,
    item_a: Uuid,
    item_b: Uuid,
}

/// A group owned by alice with bob as member, two items, ratings on both.
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
    let item_a = items.add_item(group, "Espresso", "", alice).await.unwrap().id;
    let item_b = items.add_item(group, "Drip", "", alice).await.unwrap().id;

    let ratings = RatingService::new(
        SurrealGroupRepository::new(db.clone()),
        SurrealItemRepository::new(db.clone()),
        SurrealRatingRepository::new(db.clone()),
    );
    ratings.submit_rating(alice, group, item_a, 5).await.unwrap();
    ratings.submit_rating(bob, group, item_a, 4).await.unwrap();
    ratings.submit_rating(bob, group, item_b, 2).await.unwrap();

    let cascade = CascadeService::new(
        SurrealGroupRepository::new(db.clone()),
        SurrealItemRepository::new(db.clone()),
        SurrealRatingRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
    );

    Fixture {
        db,
        cascade,
        alice,
        bob,
        group,
        item_a,
        item_b,
    }
}

#[tokio::test]
async fn delete_group_removes_everything() {
    let f = setup().await;

    f.cascade.delete_group(f.group, f.alice).await.unwrap();

    let groups = SurrealGroupRepository::new(f.db.clone());
    assert!(matches!(
        groups.get_by_id(f.group).await.unwrap_err(),
        RankError::NotFound { .. }
    ));

    let items = SurrealItemRepository::new(f.db.clone());
    assert!(items.list_by_group(f.group, SortKey::New).await.unwrap().is_empty());

    let ratings = SurrealRatingRepository::new(f.db.clone());
    assert_eq!(ratings.stats_for_item(f.item_a).await.unwrap(), (0, 0));
    assert_eq!(ratings.stats_for_item(f.item_b).await.unwrap(), (0, 0));

    // Former members no longer list the deleted group.
    let users = SurrealUserRepository::new(f.db.clone());
    for user in [f.alice, f.bob] {
        let stored = users.get_by_id(user).await.unwrap();
        assert!(!stored.groups_joined.contains(&f.group));
    }
}

#[tokio::test]
async fn only_owner_can_delete_group() {
    let f = setup().await;

    let err = f.cascade.delete_group(f.group, f.bob).await.unwrap_err();
    assert!(matches!(err, RankError::NotAuthorized { .. }));

    // Everything is still intact.
    let groups = SurrealGroupRepository::new(f.db.clone());
    assert!(groups.get_by_id(f.group).await.is_ok());
    let ratings = SurrealRatingRepository::new(f.db.clone());
    assert_eq!(ratings.stats_for_item(f.item_a).await.unwrap(), (2, 9));
}

#[tokio::test]
async fn delete_missing_group_is_not_found() {
    let f = setup().await;
    let err = f
        .cascade
        .delete_group(Uuid::new_v4(), f.alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));
}

#[tokio::test]
async fn delete_item_removes_its_ratings_only() {
    let f = setup().await;

    f.cascade.delete_item(f.item_a, f.alice).await.unwrap();

    let items = SurrealItemRepository::new(f.db.clone());
    assert!(matches!(
        items.get_by_id(f.item_a).await.unwrap_err(),
        RankError::NotFound { .. }
    ));
    // The sibling item and its rating survive.
    assert!(items.get_by_id(f.item_b).await.is_ok());
    let ratings = SurrealRatingRepository::new(f.db.clone());
    assert_eq!(ratings.stats_for_item(f.item_b).await.unwrap(), (1, 2));
}

#[tokio::test]
async fn plain_members_cannot_delete_items() {
    let f = setup().await;

    let err = f.cascade.delete_item(f.item_a, f.bob).await.unwrap_err();
    assert!(matches!(err, RankError::NotAuthorized { .. }));

    let items = SurrealItemRepository::new(f.db.clone());
    assert!(items.get_by_id(f.item_a).await.is_ok());
    let ratings = SurrealRatingRepository::new(f.db.clone());
    assert_eq!(ratings.stats_for_item(f.item_a).await.unwrap(), (2, 9));
}
