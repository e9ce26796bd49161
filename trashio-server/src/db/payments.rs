//! Payment persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use trashio_common::Result;
use uuid::Uuid;

use super::{parse_enum, parse_opt_time, parse_time, parse_uuid, to_db_time};
use crate::models::Payment;

pub async fn insert_payment(pool: &SqlitePool, payment: &Payment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, report_id, user_id, amount, payment_type, status, created_at, issued_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payment.id.to_string())
    .bind(payment.report_id.to_string())
    .bind(payment.user_id.to_string())
    .bind(payment.amount)
    .bind(payment.payment_type.as_str())
    .bind(payment.status.as_str())
    .bind(to_db_time(&payment.created_at))
    .bind(payment.issued_at.as_ref().map(to_db_time))
    .execute(pool)
    .await?;

    Ok(())
}

/// Payments recorded against a report, oldest first
pub async fn list_for_report(pool: &SqlitePool, report_id: Uuid) -> Result<Vec<Payment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, report_id, user_id, amount, payment_type, status, created_at, issued_at
        FROM payments
        WHERE report_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(report_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(payment_from_row).collect()
}

fn payment_from_row(row: &SqliteRow) -> Result<Payment> {
    let id: String = row.get("id");
    let report_id: String = row.get("report_id");
    let user_id: String = row.get("user_id");
    let payment_type: String = row.get("payment_type");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(Payment {
        id: parse_uuid(&id, "id")?,
        report_id: parse_uuid(&report_id, "report_id")?,
        user_id: parse_uuid(&user_id, "user_id")?,
        amount: row.get("amount"),
        payment_type: parse_enum(&payment_type)?,
        status: parse_enum(&status)?,
        created_at: parse_time(&created_at, "created_at")?,
        issued_at: parse_opt_time(row.get("issued_at"), "issued_at")?,
    })
}
