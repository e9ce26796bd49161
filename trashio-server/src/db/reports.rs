//! Report persistence
//!
//! Transitions are written with a status guard: the update only lands when
//! the stored status still equals the status the caller read.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeSet;
use trashio_common::{Error, Result};
use uuid::Uuid;

use super::{parse_enum, parse_opt_time, parse_opt_uuid, parse_time, parse_uuid, to_db_time};
use crate::models::{GeoPoint, Report, ReportStatus};

const REPORT_COLUMNS: &str = r#"
    id, citizen_id, description, lat, lng,
    before_image_url, before_image_thumb_url, after_image_url, after_image_thumb_url,
    status, priority, severity,
    ai_decision, ai_reason, ai_flags, ai_locked, before_image_hash, after_image_hash,
    verified_by_admin_id, verified_by_automation, verified_at,
    assigned_worker_id, assigned_by_admin_id, assigned_by_automation, assigned_at,
    cleaned_at, cleaning_verified_by_admin_id, cleaning_verified_by_automation,
    cleaning_verified_at, rejected_reason, reclean_required, created_at, updated_at
"#;

/// Optional filters for report scans; all set fields must match
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub citizen_id: Option<Uuid>,
    pub assigned_worker_id: Option<Uuid>,
}

pub async fn insert_report(pool: &SqlitePool, report: &Report) -> Result<()> {
    let flags = flags_to_json(&report.ai_flags)?;

    sqlx::query(
        r#"
        INSERT INTO reports (
            id, citizen_id, description, lat, lng,
            before_image_url, before_image_thumb_url, status, ai_flags,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.id.to_string())
    .bind(report.citizen_id.to_string())
    .bind(&report.description)
    .bind(report.location.lat)
    .bind(report.location.lng)
    .bind(&report.before_image_url)
    .bind(&report.before_image_thumb_url)
    .bind(report.status.as_str())
    .bind(flags)
    .bind(to_db_time(&report.created_at))
    .bind(to_db_time(&report.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_report(pool: &SqlitePool, report_id: Uuid) -> Result<Option<Report>> {
    let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?"))
        .bind(report_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(report_from_row).transpose()
}

/// Load a report or fail with `NotFound`
pub async fn require_report(pool: &SqlitePool, report_id: Uuid) -> Result<Report> {
    load_report(pool, report_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("report {report_id}")))
}

/// Reports matching `filter`, newest first
pub async fn list_reports(pool: &SqlitePool, filter: &ReportFilter) -> Result<Vec<Report>> {
    let status = filter.status.map(|s| s.as_str());
    let citizen_id = filter.citizen_id.map(|id| id.to_string());
    let worker_id = filter.assigned_worker_id.map(|id| id.to_string());

    let rows = sqlx::query(&format!(
        r#"
        SELECT {REPORT_COLUMNS} FROM reports
        WHERE (? IS NULL OR status = ?)
          AND (? IS NULL OR citizen_id = ?)
          AND (? IS NULL OR assigned_worker_id = ?)
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(status)
    .bind(status)
    .bind(&citizen_id)
    .bind(&citizen_id)
    .bind(&worker_id)
    .bind(&worker_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(report_from_row).collect()
}

/// Other reports whose before-image has this fingerprint
pub async fn count_by_before_hash_excluding(
    pool: &SqlitePool,
    hash: &str,
    exclude_id: Uuid,
) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE before_image_hash = ? AND id != ?")
            .bind(hash)
            .bind(exclude_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Other reports whose after-image has this fingerprint
pub async fn count_by_after_hash_excluding(
    pool: &SqlitePool,
    hash: &str,
    exclude_id: Uuid,
) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE after_image_hash = ? AND id != ?")
            .bind(hash)
            .bind(exclude_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Current workload: reports in `Assigned` held by this worker
pub async fn count_assigned_to(pool: &SqlitePool, worker_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE assigned_worker_id = ? AND status = 'Assigned'",
    )
    .bind(worker_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Write every mutable field of `report`, but only if the stored status is
/// still `expected`
///
/// Zero affected rows means the report moved (or vanished) since it was
/// read; that is reported as `Conflict` and nothing is written.
pub async fn update_report_if_status(
    pool: &SqlitePool,
    report: &Report,
    expected: ReportStatus,
) -> Result<()> {
    let flags = flags_to_json(&report.ai_flags)?;

    let result = sqlx::query(
        r#"
        UPDATE reports SET
            after_image_url = ?,
            after_image_thumb_url = ?,
            status = ?,
            priority = ?,
            severity = ?,
            ai_decision = ?,
            ai_reason = ?,
            ai_flags = ?,
            ai_locked = ?,
            before_image_hash = ?,
            after_image_hash = ?,
            verified_by_admin_id = ?,
            verified_by_automation = ?,
            verified_at = ?,
            assigned_worker_id = ?,
            assigned_by_admin_id = ?,
            assigned_by_automation = ?,
            assigned_at = ?,
            cleaned_at = ?,
            cleaning_verified_by_admin_id = ?,
            cleaning_verified_by_automation = ?,
            cleaning_verified_at = ?,
            rejected_reason = ?,
            reclean_required = ?,
            updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(&report.after_image_url)
    .bind(&report.after_image_thumb_url)
    .bind(report.status.as_str())
    .bind(report.priority.map(|p| p.as_str()))
    .bind(report.severity)
    .bind(report.ai_decision.map(|d| d.as_str()))
    .bind(&report.ai_reason)
    .bind(flags)
    .bind(report.ai_locked)
    .bind(&report.before_image_hash)
    .bind(&report.after_image_hash)
    .bind(report.verified_by_admin_id.map(|id| id.to_string()))
    .bind(report.verified_by_automation)
    .bind(report.verified_at.as_ref().map(to_db_time))
    .bind(report.assigned_worker_id.map(|id| id.to_string()))
    .bind(report.assigned_by_admin_id.map(|id| id.to_string()))
    .bind(report.assigned_by_automation)
    .bind(report.assigned_at.as_ref().map(to_db_time))
    .bind(report.cleaned_at.as_ref().map(to_db_time))
    .bind(report.cleaning_verified_by_admin_id.map(|id| id.to_string()))
    .bind(report.cleaning_verified_by_automation)
    .bind(report.cleaning_verified_at.as_ref().map(to_db_time))
    .bind(&report.rejected_reason)
    .bind(report.reclean_required)
    .bind(to_db_time(&Utc::now()))
    .bind(report.id.to_string())
    .bind(expected.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(format!(
            "report {} is no longer {}",
            report.id, expected
        )));
    }

    Ok(())
}

fn flags_to_json(flags: &BTreeSet<String>) -> Result<String> {
    serde_json::to_string(flags)
        .map_err(|e| Error::Internal(format!("Failed to serialize ai_flags: {e}")))
}

fn report_from_row(row: &SqliteRow) -> Result<Report> {
    let id: String = row.get("id");
    let citizen_id: String = row.get("citizen_id");
    let status: String = row.get("status");
    let priority: Option<String> = row.get("priority");
    let ai_decision: Option<String> = row.get("ai_decision");
    let flags: String = row.get("ai_flags");
    let ai_flags: BTreeSet<String> = serde_json::from_str(&flags)
        .map_err(|e| Error::Internal(format!("Failed to deserialize ai_flags: {e}")))?;
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Report {
        id: parse_uuid(&id, "id")?,
        citizen_id: parse_uuid(&citizen_id, "citizen_id")?,
        description: row.get("description"),
        location: GeoPoint::new(row.get("lat"), row.get("lng")),
        before_image_url: row.get("before_image_url"),
        before_image_thumb_url: row.get("before_image_thumb_url"),
        after_image_url: row.get("after_image_url"),
        after_image_thumb_url: row.get("after_image_thumb_url"),
        status: parse_enum(&status)?,
        priority: priority.as_deref().map(parse_enum).transpose()?,
        severity: row.get("severity"),
        ai_decision: ai_decision.as_deref().map(parse_enum).transpose()?,
        ai_reason: row.get("ai_reason"),
        ai_flags,
        ai_locked: row.get("ai_locked"),
        before_image_hash: row.get("before_image_hash"),
        after_image_hash: row.get("after_image_hash"),
        verified_by_admin_id: parse_opt_uuid(row.get("verified_by_admin_id"), "verified_by_admin_id")?,
        verified_by_automation: row.get("verified_by_automation"),
        verified_at: parse_opt_time(row.get("verified_at"), "verified_at")?,
        assigned_worker_id: parse_opt_uuid(row.get("assigned_worker_id"), "assigned_worker_id")?,
        assigned_by_admin_id: parse_opt_uuid(row.get("assigned_by_admin_id"), "assigned_by_admin_id")?,
        assigned_by_automation: row.get("assigned_by_automation"),
        assigned_at: parse_opt_time(row.get("assigned_at"), "assigned_at")?,
        cleaned_at: parse_opt_time(row.get("cleaned_at"), "cleaned_at")?,
        cleaning_verified_by_admin_id: parse_opt_uuid(
            row.get("cleaning_verified_by_admin_id"),
            "cleaning_verified_by_admin_id",
        )?,
        cleaning_verified_by_automation: row.get("cleaning_verified_by_automation"),
        cleaning_verified_at: parse_opt_time(row.get("cleaning_verified_at"), "cleaning_verified_at")?,
        rejected_reason: row.get("rejected_reason"),
        reclean_required: row.get("reclean_required"),
        created_at: parse_time(&created_at, "created_at")?,
        updated_at: parse_time(&updated_at, "updated_at")?,
    })
}
