//! Live integration tests for storefront-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/storefront-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::collections::HashSet;

use rust_decimal::Decimal;
use storefront_core::CatalogQuery;
use storefront_db::{
    add_product_image, create_category, create_product, delete_category,
    delete_expired_refresh_tokens, delete_product, get_product_detail, get_product_for_sheet,
    list_categories, list_product_images, list_products_for_sheet, list_products_page,
    list_reviews, update_product, upsert_review, NewProduct, ProductPatch,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_user(pool: &sqlx::PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO users (email, name) VALUES ($1, $2) RETURNING id")
        .bind(format!("{}@example.com", name.to_lowercase().replace(' ', ".")))
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("insert_test_user failed for '{name}': {e}"))
}

async fn insert_test_category(pool: &sqlx::PgPool, name: &str) -> Uuid {
    create_category(pool, name, &format!("{name} things"))
        .await
        .unwrap_or_else(|e| panic!("create_category failed for '{name}': {e}"))
        .id
}

async fn insert_test_product(
    pool: &sqlx::PgPool,
    owner: Uuid,
    category: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> Uuid {
    create_product(
        pool,
        NewProduct {
            name,
            description: "test product",
            price: Decimal::new(price, 0),
            stock,
            category_id: category,
            user_id: owner,
        },
    )
    .await
    .unwrap_or_else(|e| panic!("create_product failed for '{name}': {e}"))
    .id
}

// ---------------------------------------------------------------------------
// Catalog query engine
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cursor_walk_returns_every_product_once(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Books").await;
    let mut expected = HashSet::new();
    for i in 0..7 {
        expected.insert(insert_test_product(&pool, owner, category, &format!("Book {i}"), 10, 1).await);
    }

    for page_size in [1_i64, 2, 3, 7, 10] {
        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let mut query = CatalogQuery::new(Some(page_size));
            query.cursor = cursor;
            let page = list_products_page(&pool, &query).await.expect("page");
            seen.extend(page.items.iter().map(|p| p.id));
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }
        let unique: HashSet<Uuid> = seen.iter().copied().collect();
        assert_eq!(seen.len(), unique.len(), "no repeats for page_size {page_size}");
        assert_eq!(unique, expected, "no omissions for page_size {page_size}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_catalog_returns_terminal_page(pool: sqlx::PgPool) {
    let page = list_products_page(&pool, &CatalogQuery::new(None))
        .await
        .expect("page");
    assert!(page.items.is_empty());
    assert!(page.next_cursor.is_none());
    assert!(!page.has_more);
}

#[sqlx::test(migrations = "../../migrations")]
async fn min_price_filter_keeps_products_at_or_above_bound(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Gadgets").await;
    insert_test_product(&pool, owner, category, "Ten", 10, 1).await;
    insert_test_product(&pool, owner, category, "Twenty", 20, 1).await;
    insert_test_product(&pool, owner, category, "Thirty", 30, 1).await;

    let mut query = CatalogQuery::new(None);
    query.min_price = Some(Decimal::new(15, 0));
    let page = list_products_page(&pool, &query).await.expect("page");

    let mut prices: Vec<Decimal> = page.items.iter().map(|p| p.price).collect();
    prices.sort();
    assert_eq!(prices, vec![Decimal::new(20, 0), Decimal::new(30, 0)]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_is_case_insensitive_prefix(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Phones").await;
    insert_test_product(&pool, owner, category, "Smartphone X", 500, 3).await;
    insert_test_product(&pool, owner, category, "Old smartphone", 50, 3).await;

    let query = CatalogQuery::new(None).with_search(Some("SMART"));
    let page = list_products_page(&pool, &query).await.expect("page");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Smartphone X");
    assert_eq!(page.items[0].category_name, "Phones");
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_and_stock_filters_combine(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let books = insert_test_category(&pool, "Books").await;
    let toys = insert_test_category(&pool, "Toys").await;
    let stocked = insert_test_product(&pool, owner, books, "Novel", 12, 4).await;
    let sold_out = insert_test_product(&pool, owner, books, "Atlas", 40, 0).await;
    insert_test_product(&pool, owner, toys, "Kite", 15, 2).await;

    let mut query = CatalogQuery::new(None);
    query.category_id = Some(books);
    query.in_stock = Some(true);
    let page = list_products_page(&pool, &query).await.expect("page");
    assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![stocked]);

    query.in_stock = Some(false);
    let page = list_products_page(&pool, &query).await.expect("page");
    assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![sold_out]);
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_applies_only_present_fields(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Garden").await;
    let id = insert_test_product(&pool, owner, category, "Rake", 50, 3).await;

    let patch = ProductPatch {
        stock: Some(0),
        ..ProductPatch::default()
    };
    let row = update_product(&pool, id, &patch)
        .await
        .expect("update")
        .expect("product exists");

    assert_eq!(row.stock, 0);
    assert_eq!(row.price, Decimal::new(50, 0));
    assert_eq!(row.name, "Rake");
    assert!(row.updated_at >= row.created_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_missing_product_returns_none(pool: sqlx::PgPool) {
    let patch = ProductPatch {
        name: Some("Ghost".to_string()),
        ..ProductPatch::default()
    };
    let result = update_product(&pool, Uuid::new_v4(), &patch)
        .await
        .expect("update");
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn product_detail_aggregates_reviews(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let alice = insert_test_user(&pool, "Alice").await;
    let bob = insert_test_user(&pool, "Bob").await;
    let category = insert_test_category(&pool, "Kitchen").await;
    let id = insert_test_product(&pool, owner, category, "Kettle", 30, 5).await;

    let detail = get_product_detail(&pool, id).await.expect("detail").expect("exists");
    assert_eq!(detail.reviews_count, 0);
    assert!(detail.average_rating.abs() < f64::EPSILON);

    upsert_review(&pool, alice, id, 5, Some("great")).await.expect("review");
    upsert_review(&pool, bob, id, 2, None).await.expect("review");
    // Resubmitting replaces the earlier review rather than adding one.
    upsert_review(&pool, bob, id, 4, Some("better now")).await.expect("review");

    let detail = get_product_detail(&pool, id).await.expect("detail").expect("exists");
    assert_eq!(detail.reviews_count, 2);
    assert!((detail.average_rating - 4.5).abs() < 1e-9);
    assert_eq!(list_reviews(&pool, id).await.expect("reviews").len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn images_are_appended_in_order(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Art").await;
    let id = insert_test_product(&pool, owner, category, "Print", 25, 1).await;

    add_product_image(&pool, id, "https://cdn.example.com/a.png").await.expect("image");
    add_product_image(&pool, id, "https://cdn.example.com/b.png").await.expect("image");

    let images = list_product_images(&pool, id).await.expect("images");
    let positions: Vec<i32> = images.iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![1, 2]);
    assert_eq!(images[1].url, "https://cdn.example.com/b.png");
}

#[sqlx::test(migrations = "../../migrations")]
async fn image_positions_are_unique_per_product(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Art").await;
    let id = insert_test_product(&pool, owner, category, "Print", 25, 1).await;
    add_product_image(&pool, id, "https://cdn.example.com/a.png").await.expect("image");

    let err = sqlx::query("INSERT INTO product_images (product_id, url, position) VALUES ($1, $2, 1)")
        .bind(id)
        .bind("https://cdn.example.com/dup.png")
        .execute(&pool)
        .await
        .map_err(storefront_db::DbError::from)
        .expect_err("duplicate position");
    assert!(err.is_unique_violation());

    let (a, b) = tokio::join!(
        add_product_image(&pool, id, "https://cdn.example.com/b.png"),
        add_product_image(&pool, id, "https://cdn.example.com/c.png"),
    );
    let mut positions = vec![a.expect("image b").position, b.expect("image c").position];
    positions.sort_unstable();
    assert_eq!(positions, vec![2, 3]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sheet_rows_carry_category_and_owner_names(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Dana Seller").await;
    let category = insert_test_category(&pool, "Sports").await;
    let id = insert_test_product(&pool, owner, category, "Ball", 9, 12).await;

    let row = get_product_for_sheet(&pool, id).await.expect("row").expect("exists");
    assert_eq!(row.category_name.as_deref(), Some("Sports"));
    assert_eq!(row.owner_name.as_deref(), Some("Dana Seller"));

    assert_eq!(list_products_for_sheet(&pool).await.expect("rows").len(), 1);
    assert!(delete_product(&pool, id).await.expect("delete"));
    assert!(!delete_product(&pool, id).await.expect("delete again"));
    assert!(list_products_for_sheet(&pool).await.expect("rows").is_empty());
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn category_names_are_unique_case_insensitively(pool: sqlx::PgPool) {
    insert_test_category(&pool, "Electronics").await;
    let err = create_category(&pool, "electronics", "dup")
        .await
        .expect_err("duplicate name must fail");
    assert!(err.is_unique_violation(), "unexpected error: {err}");
    assert_eq!(list_categories(&pool).await.expect("list").len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn referenced_category_cannot_be_deleted(pool: sqlx::PgPool) {
    let owner = insert_test_user(&pool, "Owner").await;
    let category = insert_test_category(&pool, "Tools").await;
    insert_test_product(&pool, owner, category, "Hammer", 20, 1).await;

    let err = delete_category(&pool, category)
        .await
        .expect_err("category in use");
    assert!(err.is_foreign_key_violation(), "unexpected error: {err}");
}

// ---------------------------------------------------------------------------
// Refresh tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn expired_refresh_tokens_are_deleted(pool: sqlx::PgPool) {
    let user = insert_test_user(&pool, "Owner").await;
    for (token, offset) in [("old", "-1 hour"), ("older", "-2 days"), ("fresh", "1 hour")] {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token, expires_at) \
             VALUES ($1, $2, NOW() + $3::INTERVAL)",
        )
        .bind(user)
        .bind(token)
        .bind(offset)
        .execute(&pool)
        .await
        .expect("insert token");
    }

    assert_eq!(delete_expired_refresh_tokens(&pool).await.expect("cleanup"), 2);
    assert_eq!(delete_expired_refresh_tokens(&pool).await.expect("cleanup"), 0);
}
