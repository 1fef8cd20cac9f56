use sqlx::SqliteConnection;

use crate::db_types::{NewPayment, OrderId, Payment, PaymentId, PaymentStatusType};

const PAYMENT_COLUMNS: &str = "id, order_id, amount, currency, status, payment_method, gateway_intent_id, error, \
                               created_at, updated_at";

/// Inserts a `pending` payment. Fails with a unique-constraint violation if the intent id is already recorded.
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let sql = format!(
        r#"
            INSERT INTO payments (order_id, amount, currency, status, payment_method, gateway_intent_id)
            VALUES ($1, $2, $3, $4, $5, $6);
        "#
    );
    let id = sqlx::query(&sql)
        .bind(payment.order_id)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(PaymentStatusType::Pending.as_str())
        .bind(payment.payment_method.as_str())
        .bind(payment.gateway_intent_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
    fetch_payment(PaymentId(id), conn).await
}

pub async fn fetch_payment(id: PaymentId, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
    sqlx::query_as(&sql).bind(id).fetch_one(conn).await
}

pub async fn fetch_payment_by_intent_id(
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway_intent_id = $1");
    sqlx::query_as(&sql).bind(intent_id).fetch_optional(conn).await
}

pub async fn fetch_payments_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY id ASC");
    sqlx::query_as(&sql).bind(order_id).fetch_all(conn).await
}

/// Sets the payment status. The error detail is only overwritten when `error` is provided.
pub async fn update_payment_status(
    id: PaymentId,
    status: PaymentStatusType,
    error: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let sql = format!(
        r#"
            UPDATE payments SET
                status = $1,
                error = COALESCE($2, error),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3;
        "#
    );
    sqlx::query(&sql).bind(status.as_str()).bind(error).bind(id).execute(&mut *conn).await?;
    fetch_payment(id, conn).await
}
