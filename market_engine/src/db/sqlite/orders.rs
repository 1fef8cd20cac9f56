use std::collections::HashMap;

use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{NewOrder, NewOrderLine, Order, OrderId, OrderLine, OrderStatusType, UserId};

const ORDER_COLUMNS: &str = "id, user_id, status, total_price, shipping_address, billing_address, payment_method, \
                             created_at, updated_at";

/// Inserts a new order with status `pending` using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<OrderId, sqlx::Error> {
    let id = sqlx::query(
        r#"
            INSERT INTO orders (
                user_id,
                status,
                total_price,
                shipping_address,
                billing_address,
                payment_method
            ) VALUES ($1, $2, $3, $4, $5, $6);
        "#,
    )
    .bind(&order.user_id)
    .bind(OrderStatusType::Pending.as_str())
    .bind(order.total_price)
    .bind(order.shipping_address.as_str())
    .bind(order.billing_address.as_str())
    .bind(order.payment_method.as_str())
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(OrderId(id))
}

pub async fn insert_order_line(
    order_id: OrderId,
    line: &NewOrderLine,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_order_lines(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT id, order_id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC;
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

/// Fetches the order and its lines, regardless of who owns it.
pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order: Option<Order> = sqlx::query_as(&sql).bind(order_id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.lines = fetch_order_lines(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Fetches the order and its lines, if it is owned by `user_id`.
pub async fn fetch_order_for_user(
    user_id: &UserId,
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = fetch_order(order_id, conn).await?;
    Ok(order.filter(|o| &o.user_id == user_id))
}

/// All the user's orders with their lines, newest first.
pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC");
    let mut orders: Vec<Order> = sqlx::query_as(&sql).bind(user_id).fetch_all(&mut *conn).await?;
    let lines: Vec<OrderLine> = sqlx::query_as(
        r#"
            SELECT order_items.id, order_items.order_id, order_items.product_id, order_items.quantity,
                   order_items.unit_price
            FROM order_items JOIN orders ON orders.id = order_items.order_id
            WHERE orders.user_id = $1
            ORDER BY order_items.id ASC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    let mut lines_by_order = lines.into_iter().fold(HashMap::<OrderId, Vec<OrderLine>>::new(), |mut acc, line| {
        acc.entry(line.order_id).or_default().push(line);
        acc
    });
    orders.iter_mut().for_each(|o| o.lines = lines_by_order.remove(&o.id).unwrap_or_default());
    trace!("🗃️ Fetched {} orders for {user_id}", orders.len());
    Ok(orders)
}

pub async fn update_order_status(
    order_id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status.as_str())
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}
