use sqlx::SqliteConnection;

use crate::db_types::{CartLine, ProductId, UserId};

/// Returns the id of the user's cart, creating the cart if the user does not have one yet.
pub async fn fetch_or_create_cart_id(user_id: &UserId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1").bind(user_id).fetch_one(conn).await
}

/// The user's cart lines in insertion order. Users without a cart have an empty one.
pub async fn fetch_cart_lines(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT cart_items.product_id, cart_items.quantity
            FROM cart_items JOIN carts ON carts.id = cart_items.cart_id
            WHERE carts.user_id = $1
            ORDER BY cart_items.id ASC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}

/// Inserts the line, or adds its quantity to the existing line for the same product.
pub async fn upsert_item(cart_id: i64, line: CartLine, conn: &mut SqliteConnection) -> Result<CartLine, sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET
                quantity = cart_items.quantity + excluded.quantity,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(cart_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .execute(&mut *conn)
    .await?;
    sqlx::query_as("SELECT product_id, quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(line.product_id)
        .fetch_one(conn)
        .await
}

/// Sets the quantity of an existing line. Returns `None` if the product is not in the user's cart.
pub async fn update_quantity(
    user_id: &UserId,
    line: CartLine,
    conn: &mut SqliteConnection,
) -> Result<Option<CartLine>, sqlx::Error> {
    let updated = sqlx::query(
        r#"
            UPDATE cart_items SET quantity = $1, updated_at = CURRENT_TIMESTAMP
            WHERE product_id = $2 AND cart_id = (SELECT id FROM carts WHERE user_id = $3);
        "#,
    )
    .bind(line.quantity)
    .bind(line.product_id)
    .bind(user_id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok((updated > 0).then_some(line))
}

/// Returns the number of lines deleted.
pub async fn delete_item(
    user_id: &UserId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM cart_items WHERE product_id = $1 AND cart_id = (SELECT id FROM carts WHERE user_id = $2)",
    )
    .bind(product_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes every line in the user's cart and returns exactly what was deleted.
///
/// Being a write, this takes the database write lock as the first statement of a checkout transaction, so that
/// concurrent checkouts of the same cart are serialized.
pub async fn take_all_items(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as(
        r#"
            DELETE FROM cart_items
            WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)
            RETURNING product_id, quantity;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}
