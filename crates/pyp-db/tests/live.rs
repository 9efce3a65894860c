//! Live integration tests for pyp-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/pyp-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. Run with `cargo test -- --ignored` and `DATABASE_URL`
//! pointing at a server the tests may create databases on.

use pyp_core::{fallback_catalog, Collection, Product, Role, SiteConfig};
use pyp_db::{
    create_user, delete_document, delete_otps_for, find_live_otp, find_user_by_email,
    get_document, get_site_config, increment_otp_attempts, insert_document, list_documents,
    list_documents_as, place_order, purge_expired_otps, replace_otp, seed_catalog,
    update_document, update_password, upsert_site_config, DbError, NewUser,
};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Generic documents
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn insert_then_list_returns_documents_oldest_first(pool: sqlx::PgPool) {
    insert_document(&pool, Collection::Categories, object(json!({"id": "a", "name": "A"})))
        .await
        .expect("insert a");
    let generated = insert_document(&pool, Collection::Categories, object(json!({"name": "B"})))
        .await
        .expect("insert b");

    let docs = list_documents(&pool, Collection::Categories)
        .await
        .expect("list");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["id"], "a");
    assert_eq!(docs[1]["id"], generated["id"]);
    assert!(list_documents(&pool, Collection::Banners)
        .await
        .expect("list banners")
        .is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn update_merges_top_level_fields(pool: sqlx::PgPool) {
    insert_document(
        &pool,
        Collection::Products,
        object(json!({"id": "p1", "name": "Mango", "price": 350, "stockQuantity": 5})),
    )
    .await
    .expect("insert");

    let merged = update_document(
        &pool,
        Collection::Products,
        "p1",
        object(json!({"price": 299, "id": "hijack"})),
    )
    .await
    .expect("update");

    assert_eq!(merged["id"], "p1");
    assert_eq!(merged["name"], "Mango");
    assert_eq!(merged["price"], 299);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn update_missing_document_is_not_found(pool: sqlx::PgPool) {
    let err = update_document(&pool, Collection::Products, "nope", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn duplicate_coupon_code_conflicts(pool: sqlx::PgPool) {
    insert_document(
        &pool,
        Collection::Coupons,
        object(json!({"code": "NEWPICK20", "discountPercent": 20})),
    )
    .await
    .expect("first coupon");
    let err = insert_document(
        &pool,
        Collection::Coupons,
        object(json!({"code": "NEWPICK20", "discountPercent": 5})),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn delete_reports_whether_anything_matched(pool: sqlx::PgPool) {
    insert_document(&pool, Collection::Banners, object(json!({"id": "b1"})))
        .await
        .expect("insert");
    assert!(delete_document(&pool, Collection::Banners, "b1")
        .await
        .expect("delete"));
    assert!(!delete_document(&pool, Collection::Banners, "b1")
        .await
        .expect("second delete"));
    assert!(get_document(&pool, Collection::Banners, "b1")
        .await
        .expect("get")
        .is_none());
}

// ---------------------------------------------------------------------------
// Section 2: Orders and stock
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn placing_an_order_decrements_stock_floored_at_zero(pool: sqlx::PgPool) {
    insert_document(
        &pool,
        Collection::Products,
        object(json!({"id": "1", "name": "Mango", "price": 350, "category": "pickles", "stockQuantity": 5})),
    )
    .await
    .expect("product 1");
    insert_document(
        &pool,
        Collection::Products,
        object(json!({"id": "2", "name": "Chips", "price": 220, "category": "snacks", "stockQuantity": 1})),
    )
    .await
    .expect("product 2");

    place_order(
        &pool,
        object(json!({
            "id": "ORD-1",
            "userId": "u",
            "status": "processing",
            "items": [{"id": "1", "quantity": 2}, {"id": "2", "quantity": 3}]
        })),
    )
    .await
    .expect("place order");

    let products: Vec<Product> = list_documents_as(&pool, Collection::Products)
        .await
        .expect("products");
    let stock = |id: &str| {
        products
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.stock_quantity)
    };
    assert_eq!(stock("1"), Some(3));
    assert_eq!(stock("2"), Some(0));
    assert!(get_document(&pool, Collection::Orders, "ORD-1")
        .await
        .expect("get order")
        .is_some());
}

// ---------------------------------------------------------------------------
// Section 3: Users and OTPs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn users_are_unique_by_email(pool: sqlx::PgPool) {
    let new = NewUser {
        name: "Asha",
        email: "asha@example.com",
        password_hash: "hash",
        role: Role::Customer,
        phone: None,
    };
    create_user(&pool, new.clone()).await.expect("create");
    let err = create_user(&pool, new).await.unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));

    update_password(&pool, "asha@example.com", "new-hash")
        .await
        .expect("update password");
    let row = find_user_by_email(&pool, "asha@example.com")
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.password_hash.as_deref(), Some("new-hash"));
    assert!(matches!(
        update_password(&pool, "ghost@example.com", "x").await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn replacing_an_otp_keeps_only_the_newest(pool: sqlx::PgPool) {
    replace_otp(&pool, "a@b.co", "first").await.expect("first");
    let second = replace_otp(&pool, "a@b.co", "second").await.expect("second");
    increment_otp_attempts(&pool, second.id)
        .await
        .expect("increment");

    let live = find_live_otp(&pool, "a@b.co")
        .await
        .expect("find")
        .expect("live otp");
    assert_eq!(live.otp_hash, "second");
    assert_eq!(live.attempts, 1);

    assert_eq!(delete_otps_for(&pool, "a@b.co").await.expect("delete"), 1);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn purge_removes_only_expired_otps(pool: sqlx::PgPool) {
    replace_otp(&pool, "fresh@b.co", "h").await.expect("fresh");
    sqlx::query(
        "INSERT INTO otps (email, otp_hash, created_at) VALUES ($1, 'h', NOW() - INTERVAL '11 minutes')",
    )
    .bind("stale@b.co")
    .execute(&pool)
    .await
    .expect("stale otp");

    assert!(find_live_otp(&pool, "stale@b.co")
        .await
        .expect("find stale")
        .is_none());
    assert_eq!(purge_expired_otps(&pool).await.expect("purge"), 1);
    assert!(find_live_otp(&pool, "fresh@b.co")
        .await
        .expect("find fresh")
        .is_some());
}

// ---------------------------------------------------------------------------
// Section 4: Site config and seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn site_config_upsert_replaces_the_singleton(pool: sqlx::PgPool) {
    assert!(get_site_config(&pool).await.expect("get").is_none());

    let mut config = SiteConfig::default();
    upsert_site_config(&pool, &config).await.expect("first");
    config.marquee_speed = 35;
    config.payment_methods.cod = false;
    upsert_site_config(&pool, &config).await.expect("second");

    let stored = get_site_config(&pool).await.expect("get").expect("stored");
    assert_eq!(stored.marquee_speed, 35);
    assert!(!stored.payment_methods.cod);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn seeding_fills_empty_collections_once(pool: sqlx::PgPool) {
    let seed = fallback_catalog().expect("seed catalog");

    let first = seed_catalog(&pool, &seed).await.expect("first seed");
    assert_eq!(first.products, 6);
    assert_eq!(first.reviews, 4);
    assert!(first.config);

    let second = seed_catalog(&pool, &seed).await.expect("second seed");
    assert_eq!(second.total(), 0);
    assert!(!second.config);

    let products: Vec<Product> = list_documents_as(&pool, Collection::Products)
        .await
        .expect("products");
    let mango = products.iter().find(|p| p.id == "1").expect("mango");
    assert_eq!(mango.offer_price, Some(Decimal::from(299)));
}
