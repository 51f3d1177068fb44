//! Integration tests for the leaderboard view.

use rankit_core::error::RankError;
use rankit_core::models::item::SortKey;
use rankit_core::models::user::CreateUser;
use rankit_core::repository::{ItemRepository, UserRepository};
use rankit_db::repository::{
    SurrealGroupRepository, SurrealItemRepository, SurrealRatingRepository,
    SurrealUserRepository,
};
use rankit_engine::{
    EngineConfig, ItemService, LeaderboardService, MembershipService, RatingService,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    db: Surreal<Db>,
    board: LeaderboardService<
        SurrealGroupRepository<Db>,
        SurrealItemRepository<Db>,
        SurrealRatingRepository<Db>,
    >,
    alice: Uuid,
    bob: Uuid,
    group: Uuid,
    popular: Uuid, // avg 4.5 from 10 ratings
    niche: Uuid,   // avg 4.5 from 3 ratings
    unrated: Uuid, // no ratings
}

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
    let popular = items.add_item(group, "Espresso", "", alice).await.unwrap().id;
    let niche = items.add_item(group, "Cortado", "", alice).await.unwrap().id;
    let unrated = items.add_item(group, "Decaf", "", alice).await.unwrap().id;

    // Same average, different rating counts; the unrated item stays at 0.
    let item_repo = SurrealItemRepository::new(db.clone());
    item_repo.set_stats(popular, 10, 45).await.unwrap();
    item_repo.set_stats(niche, 2, 9).await.unwrap();

    let board = LeaderboardService::new(
        SurrealGroupRepository::new(db.clone()),
        SurrealItemRepository::new(db.clone()),
        SurrealRatingRepository::new(db.clone()),
    );

    Fixture {
        db,
        board,
        alice,
        bob,
        group,
        popular,
        niche,
        unrated,
    }
}

#[tokio::test]
async fn equal_averages_break_ties_by_rating_count() {
    let f = setup().await;

    let board = f.board.rank(f.group, SortKey::Rating, None).await.unwrap();
    let order: Vec<Uuid> = board.iter().map(|e| e.item.id).collect();
    assert_eq!(order, vec![f.popular, f.niche, f.unrated]);

    // Ranks are 1-based and consecutive, even for the tied averages.
    let ranks: Vec<u64> = board.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn zero_rated_items_appear_last_not_hidden() {
    let f = setup().await;

    let board = f.board.rank(f.group, SortKey::Rating, None).await.unwrap();
    assert_eq!(board.len(), 3);
    let last = board.last().unwrap();
    assert_eq!(last.item.id, f.unrated);
    assert_eq!(last.item.avg_rating, 0.0);
}

#[tokio::test]
async fn viewer_scores_are_attached() {
    let f = setup().await;
    let ratings = RatingService::new(
        SurrealGroupRepository::new(f.db.clone()),
        SurrealItemRepository::new(f.db.clone()),
        SurrealRatingRepository::new(f.db.clone()),
    );
    ratings
        .submit_rating(f.bob, f.group, f.unrated, 2)
        .await
        .unwrap();

    let board = f
        .board
        .rank(f.group, SortKey::Rating, Some(f.bob))
        .await
        .unwrap();
    let decaf = board.iter().find(|e| e.item.id == f.unrated).unwrap();
    assert_eq!(decaf.viewer_score, Some(2));
    let espresso = board.iter().find(|e| e.item.id == f.popular).unwrap();
    assert_eq!(espresso.viewer_score, None);

    // Another viewer sees no scores of bob's.
    let board = f
        .board
        .rank(f.group, SortKey::Rating, Some(f.alice))
        .await
        .unwrap();
    assert!(board.iter().all(|e| e.viewer_score.is_none()));
}

#[tokio::test]
async fn alternative_sort_keys_keep_ranks_positional() {
    let f = setup().await;

    let board = f.board.rank(f.group, SortKey::Name, None).await.unwrap();
    let names: Vec<&str> = board.iter().map(|e| e.item.name.as_str()).collect();
    assert_eq!(names, vec!["Cortado", "Decaf", "Espresso"]);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[2].rank, 3);
}

#[tokio::test]
async fn missing_group_is_not_found() {
    let f = setup().await;
    let err = f
        .board
        .rank(Uuid::new_v4(), SortKey::Rating, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RankError::NotFound { .. }));
}
