//! Worker assignment
//!
//! Two tiers: nearest worker by great-circle distance when locations are
//! known, otherwise the least-loaded worker. Candidates are always scanned
//! in ascending id order so equal distances or loads resolve the same way
//! every time.

use sqlx::SqlitePool;
use trashio_common::Result;
use uuid::Uuid;

use crate::db;
use crate::models::{GeoPoint, User};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Closest worker with a known location; first strict minimum wins
pub fn nearest_worker(target: GeoPoint, workers: &[User]) -> Option<&User> {
    let mut best: Option<(&User, f64)> = None;
    for worker in workers {
        let Some(location) = worker.location else {
            continue;
        };
        let distance = haversine_km(target, location);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((worker, distance));
        }
    }
    best.map(|(worker, _)| worker)
}

/// Worker with the fewest open tasks, ties to the smaller id string
pub fn least_loaded(loads: &[(Uuid, i64)]) -> Option<Uuid> {
    loads
        .iter()
        .min_by(|(a_id, a_load), (b_id, b_load)| {
            a_load
                .cmp(b_load)
                .then_with(|| a_id.to_string().cmp(&b_id.to_string()))
        })
        .map(|(id, _)| *id)
}

/// Picks a worker for a report
#[derive(Clone)]
pub struct WorkerSelector {
    db: SqlitePool,
}

impl WorkerSelector {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Best active worker for `target`, never `exclude`
    ///
    /// Returns `None` only when no active worker is left after exclusion.
    pub async fn select(&self, target: Option<GeoPoint>, exclude: Option<Uuid>) -> Result<Option<User>> {
        let mut workers = db::users::list_active_workers(&self.db, exclude).await?;
        workers.sort_by_key(|w| w.id.to_string());

        if workers.is_empty() {
            tracing::debug!("No active workers available");
            return Ok(None);
        }

        if let Some(target) = target {
            if let Some(worker) = nearest_worker(target, &workers) {
                tracing::debug!(worker_id = %worker.id, "Selected nearest worker");
                return Ok(Some(worker.clone()));
            }
        }

        let mut loads = Vec::with_capacity(workers.len());
        for worker in &workers {
            loads.push((worker.id, db::reports::count_assigned_to(&self.db, worker.id).await?));
        }

        let chosen = least_loaded(&loads);
        tracing::debug!(worker_id = ?chosen, "Selected least-loaded worker");
        Ok(chosen.and_then(|id| workers.into_iter().find(|w| w.id == id)))
    }
}
