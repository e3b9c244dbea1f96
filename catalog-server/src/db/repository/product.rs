//! Product Repository

use super::{RepoError, RepoResult};
use crate::db::query::{BindValue, ProductQuery};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::query::QuerySpec;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, discounted_price, sku, photo_url, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Run a listing query: page of matching products plus the total match count
pub async fn search(pool: &SqlitePool, spec: &QuerySpec) -> RepoResult<(Vec<Product>, u64)> {
    let query = ProductQuery::from_spec(spec);

    let select_sql = query.select_sql(PRODUCT_COLUMNS);
    let mut select = sqlx::query_as::<_, Product>(&select_sql);
    for bind in query.binds() {
        select = match bind {
            BindValue::Text(s) => select.bind(s.clone()),
            BindValue::Real(f) => select.bind(*f),
        };
    }
    let data = select
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool)
        .await?;

    let count_sql = query.count_sql();
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in query.binds() {
        count = match bind {
            BindValue::Text(s) => count.bind(s.clone()),
            BindValue::Real(f) => count.bind(*f),
        };
    }
    let total = count.fetch_one(pool).await?;

    Ok((data, total.max(0) as u64))
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    validate_create(&data)?;

    let now = now_millis();
    let mut attempts = 0;
    loop {
        let id = snowflake_id();
        let result = sqlx::query(
            "INSERT INTO products (id, name, description, price, discounted_price, sku, photo_url, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.price)
        .bind(data.discounted_price)
        .bind(data.sku.trim())
        .bind(&data.photo_url)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await;

        match result {
            Ok(_) => {
                return find_by_id(pool, id)
                    .await?
                    .ok_or_else(|| RepoError::Database("Failed to create product".into()));
            }
            // Retry with a fresh id if the 12 random bits collide within one millisecond
            Err(e) => match RepoError::from(e) {
                RepoError::Duplicate(msg) if msg.contains("products.id") && attempts < 3 => {
                    attempts += 1;
                }
                RepoError::Duplicate(_) => {
                    return Err(RepoError::Duplicate(format!(
                        "Product with sku '{}' already exists",
                        data.sku.trim()
                    )));
                }
                other => return Err(other),
            },
        }
    }
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    validate_update(&data)?;

    let now = now_millis();
    let result = sqlx::query(
        "UPDATE products SET name = COALESCE(?, name), description = COALESCE(?, description), price = COALESCE(?, price), discounted_price = COALESCE(?, discounted_price), sku = COALESCE(?, sku), photo_url = COALESCE(?, photo_url), updated_at = ? WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.price)
    .bind(data.discounted_price)
    .bind(data.sku.as_deref().map(str::trim))
    .bind(&data.photo_url)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "Product with sku '{}' already exists",
            data.sku.as_deref().unwrap_or_default().trim()
        )),
        other => other,
    })?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Explicitly set or clear the photo association.
///
/// Unlike [`update`], a `None` here writes NULL: a detached photo stays
/// detached.
pub async fn set_photo(
    pool: &SqlitePool,
    id: i64,
    photo_url: Option<String>,
) -> RepoResult<Product> {
    let now = now_millis();
    let result = sqlx::query("UPDATE products SET photo_url = ?, updated_at = ? WHERE id = ?")
        .bind(&photo_url)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Hard delete. Returns the removed product so the caller can clean up the
/// attached photo file.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<Product> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(existing)
}

fn validate_create(data: &ProductCreate) -> RepoResult<()> {
    if data.name.trim().is_empty() {
        return Err(RepoError::Validation("name must not be empty".into()));
    }
    if data.sku.trim().is_empty() {
        return Err(RepoError::Validation("sku must not be empty".into()));
    }
    validate_prices(Some(data.price), data.discounted_price)
}

fn validate_update(data: &ProductUpdate) -> RepoResult<()> {
    if let Some(name) = &data.name
        && name.trim().is_empty()
    {
        return Err(RepoError::Validation("name must not be empty".into()));
    }
    if let Some(sku) = &data.sku
        && sku.trim().is_empty()
    {
        return Err(RepoError::Validation("sku must not be empty".into()));
    }
    validate_prices(data.price, data.discounted_price)
}

fn validate_prices(price: Option<f64>, discounted_price: Option<f64>) -> RepoResult<()> {
    if let Some(price) = price
        && !(price.is_finite() && price > 0.0)
    {
        return Err(RepoError::Validation("price must be positive".into()));
    }
    // discounted_price is only checked for positivity; it may exceed price
    if let Some(discounted) = discounted_price
        && !(discounted.is_finite() && discounted > 0.0)
    {
        return Err(RepoError::Validation(
            "discountedPrice must be positive".into(),
        ));
    }
    Ok(())
}
