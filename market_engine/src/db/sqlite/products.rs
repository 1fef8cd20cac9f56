use sqlx::SqliteConnection;

use crate::db_types::{CatalogEntry, Money, NewProduct, ProductId};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<ProductId, sqlx::Error> {
    let id = sqlx::query(
        r#"
            INSERT INTO products (seller_id, title, price, is_available)
            VALUES ($1, $2, $3, $4);
        "#,
    )
    .bind(product.seller_id)
    .bind(product.title)
    .bind(product.price)
    .bind(product.is_available)
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(ProductId(id))
}

pub async fn fetch_catalog_entry(
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<CatalogEntry>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT id as product_id, price as unit_price, is_available
            FROM products
            WHERE id = $1;
        "#,
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await
}

/// Returns true if the product exists.
pub async fn update_price(
    product_id: ProductId,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(price)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns true if the product exists.
pub async fn update_availability(
    product_id: ProductId,
    is_available: bool,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE products SET is_available = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(is_available)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
