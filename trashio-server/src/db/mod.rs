//! Database access for trashio-server
//!
//! SQLite through sqlx. Ids are UUID text, timestamps RFC 3339 text
//! (microsecond precision, `Z` suffix, so they sort lexically).

pub mod notifications;
pub mod payments;
pub mod reports;
pub mod users;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use trashio_common::{Error, Result};
use uuid::Uuid;

/// Open (creating if needed) the report database and its tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            lat REAL,
            lng REAL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            citizen_id TEXT NOT NULL REFERENCES users(id),
            description TEXT NOT NULL,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            before_image_url TEXT NOT NULL,
            before_image_thumb_url TEXT,
            after_image_url TEXT,
            after_image_thumb_url TEXT,
            status TEXT NOT NULL,
            priority TEXT,
            severity REAL,
            ai_decision TEXT,
            ai_reason TEXT,
            ai_flags TEXT NOT NULL DEFAULT '[]',
            ai_locked INTEGER NOT NULL DEFAULT 0,
            before_image_hash TEXT,
            after_image_hash TEXT,
            verified_by_admin_id TEXT,
            verified_by_automation INTEGER NOT NULL DEFAULT 0,
            verified_at TEXT,
            assigned_worker_id TEXT,
            assigned_by_admin_id TEXT,
            assigned_by_automation INTEGER NOT NULL DEFAULT 0,
            assigned_at TEXT,
            cleaned_at TEXT,
            cleaning_verified_by_admin_id TEXT,
            cleaning_verified_by_automation INTEGER NOT NULL DEFAULT 0,
            cleaning_verified_at TEXT,
            rejected_reason TEXT,
            reclean_required INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status)",
        "CREATE INDEX IF NOT EXISTS idx_reports_citizen ON reports(citizen_id)",
        "CREATE INDEX IF NOT EXISTS idx_reports_worker ON reports(assigned_worker_id)",
        "CREATE INDEX IF NOT EXISTS idx_reports_before_hash ON reports(before_image_hash)",
        "CREATE INDEX IF NOT EXISTS idx_reports_after_hash ON reports(after_image_hash)",
    ] {
        sqlx::query(index).execute(pool).await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            meta TEXT NOT NULL DEFAULT '{}',
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            report_id TEXT NOT NULL REFERENCES reports(id),
            user_id TEXT NOT NULL REFERENCES users(id),
            amount REAL NOT NULL,
            payment_type TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            issued_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_report ON payments(report_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (users, reports, notifications, payments)");

    Ok(())
}

pub(crate) fn to_db_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_time(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse {field}: {e}")))
}

pub(crate) fn parse_opt_time(raw: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_time(&s, field)).transpose()
}

pub(crate) fn parse_uuid(raw: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Failed to parse {field}: {e}")))
}

pub(crate) fn parse_opt_uuid(raw: Option<String>, field: &str) -> Result<Option<Uuid>> {
    raw.map(|s| parse_uuid(&s, field)).transpose()
}

pub(crate) fn parse_enum<T: FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse().map_err(Error::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_db_time_is_fixed_width_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(to_db_time(&dt), "2024-05-01T09:30:00.000000Z");
        assert_eq!(parse_time(&to_db_time(&dt), "t").unwrap(), dt);
    }

    #[test]
    fn test_bad_uuid_is_internal_error() {
        assert!(matches!(parse_uuid("nope", "id"), Err(Error::Internal(_))));
    }
}
