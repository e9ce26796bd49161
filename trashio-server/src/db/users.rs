//! User account persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use trashio_common::{Error, Result};
use uuid::Uuid;

use super::{parse_enum, parse_time, parse_uuid, to_db_time};
use crate::models::{GeoPoint, Role, User};

const USER_COLUMNS: &str = "id, full_name, email, role, is_active, lat, lng, created_at";

/// Insert a new account; a taken email is a `Conflict`
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (id, full_name, email, role, is_active, lat, lng, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(user.location.map(|l| l.lat))
    .bind(user.location.map(|l| l.lng))
    .bind(to_db_time(&user.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::Conflict(format!("email '{}' already registered", user.email)),
        ),
        Err(e) => Err(e.into()),
    }
}

pub async fn load_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Load a user or fail with `NotFound`
pub async fn require_user(pool: &SqlitePool, user_id: Uuid) -> Result<User> {
    load_user(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {user_id}")))
}

/// Active workers ordered by id, optionally leaving one out
pub async fn list_active_workers(pool: &SqlitePool, exclude: Option<Uuid>) -> Result<Vec<User>> {
    let exclude = exclude.map(|id| id.to_string());

    let rows = sqlx::query(&format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE role = ? AND is_active = 1 AND (? IS NULL OR id != ?)
        ORDER BY id
        "#
    ))
    .bind(Role::Worker.as_str())
    .bind(&exclude)
    .bind(&exclude)
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let lat: Option<f64> = row.get("lat");
    let lng: Option<f64> = row.get("lng");
    let created_at: String = row.get("created_at");

    Ok(User {
        id: parse_uuid(&id, "id")?,
        full_name: row.get("full_name"),
        email: row.get("email"),
        role: parse_enum(&role)?,
        is_active: row.get("is_active"),
        location: lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng)),
        created_at: parse_time(&created_at, "created_at")?,
    })
}
