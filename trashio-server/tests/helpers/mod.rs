//! Shared test fixtures for trashio-server integration tests
//!
//! A temp-file database, seeded accounts and a scripted stand-in for the
//! scoring service.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use trashio_common::scoring::{
    AfterAnalysisRequest, AfterAnalysisResponse, BeforeAnalysisRequest, BeforeAnalysisResponse,
    BeforeDecision, CleaningDecision, Priority, MODEL_VERSION,
};
use trashio_server::config::RewardsConfig;
use trashio_server::db;
use trashio_server::models::{GeoPoint, NewUser, Report, ReportStatus, Role, User};
use trashio_server::services::{
    LifecycleConfig, LifecycleController, ScoringError, ScoringService,
};
use trashio_server::AppState;
use uuid::Uuid;

pub const WORKER_PAYMENT: f64 = 50.0;
pub const SUBMITTER_REWARD: f64 = 10.0;

/// Scoring service that replays queued responses
///
/// An empty queue answers with a network error, which the lifecycle treats
/// as "scoring unavailable".
#[derive(Default)]
pub struct ScriptedScoring {
    before: Mutex<VecDeque<BeforeAnalysisResponse>>,
    after: Mutex<VecDeque<AfterAnalysisResponse>>,
    before_requests: Mutex<Vec<BeforeAnalysisRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedScoring {
    pub fn push_before(&self, response: BeforeAnalysisResponse) {
        self.before.lock().unwrap().push_back(response);
    }

    pub fn push_after(&self, response: AfterAnalysisResponse) {
        self.after.lock().unwrap().push_back(response);
    }

    /// Sleep this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn before_requests(&self) -> Vec<BeforeAnalysisRequest> {
        self.before_requests.lock().unwrap().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ScoringService for ScriptedScoring {
    async fn analyze_before(
        &self,
        request: &BeforeAnalysisRequest,
    ) -> Result<BeforeAnalysisResponse, ScoringError> {
        self.before_requests.lock().unwrap().push(request.clone());
        self.pause().await;
        self.before
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ScoringError::Network("connection refused".to_string()))
    }

    async fn analyze_after(
        &self,
        _request: &AfterAnalysisRequest,
    ) -> Result<AfterAnalysisResponse, ScoringError> {
        self.pause().await;
        self.after
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ScoringError::Network("connection refused".to_string()))
    }
}

pub fn approve(hash: &str) -> BeforeAnalysisResponse {
    BeforeAnalysisResponse {
        decision: BeforeDecision::Approve,
        trash_present: true,
        severity: 0.72,
        priority: Priority::High,
        confidence: 0.92,
        reason: None,
        image_hash: Some(hash.to_string()),
        flags: Vec::new(),
        model_version: MODEL_VERSION.to_string(),
    }
}

pub fn reject(reason: Option<&str>, hash: &str) -> BeforeAnalysisResponse {
    BeforeAnalysisResponse {
        decision: BeforeDecision::Reject,
        trash_present: false,
        severity: 0.1,
        priority: Priority::Low,
        confidence: 0.8,
        reason: reason.map(str::to_string),
        image_hash: Some(hash.to_string()),
        flags: Vec::new(),
        model_version: MODEL_VERSION.to_string(),
    }
}

pub fn cleaning(decision: CleaningDecision, before_hash: &str, after_hash: &str) -> AfterAnalysisResponse {
    AfterAnalysisResponse {
        decision,
        cleaned: decision == CleaningDecision::Accept,
        confidence: 0.8,
        before_image_hash: Some(before_hash.to_string()),
        after_image_hash: Some(after_hash.to_string()),
        diff_score: 0.4,
        after_trash_score: 0.1,
        flags: Vec::new(),
        model_version: MODEL_VERSION.to_string(),
    }
}

/// Test database, scoring stub and wired application state
///
/// `_temp_dir` must outlive the pool.
pub struct TestEnv {
    pub _temp_dir: TempDir,
    pub pool: SqlitePool,
    pub scoring: Arc<ScriptedScoring>,
    pub upload_dir: PathBuf,
    pub state: AppState,
}

impl TestEnv {
    pub async fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(5)).await
    }

    pub async fn with_timeout(scoring_timeout: Duration) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let pool = db::init_database_pool(&temp_dir.path().join("test_trashio.db")).await?;
        let upload_dir = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir)?;

        let scoring = Arc::new(ScriptedScoring::default());
        let state = AppState::new(
            pool.clone(),
            scoring.clone(),
            lifecycle_config(scoring_timeout, upload_dir.clone()),
            vec!["http://localhost:5173".to_string()],
        );

        Ok(Self {
            _temp_dir: temp_dir,
            pool,
            scoring,
            upload_dir,
            state,
        })
    }

    /// A second controller over the same database, for stale-write tests
    pub fn controller(&self) -> LifecycleController {
        LifecycleController::new(
            self.pool.clone(),
            self.scoring.clone(),
            lifecycle_config(Duration::from_secs(5), self.upload_dir.clone()),
        )
    }

    pub async fn seed_user(&self, role: Role, location: Option<GeoPoint>) -> Result<User> {
        let user = NewUser {
            full_name: format!("Test {role}"),
            email: format!("{}@example.org", Uuid::new_v4()),
            role,
            location,
        }
        .into_user()?;
        db::users::insert_user(&self.pool, &user).await?;
        Ok(user)
    }

    /// Put an `Assigned` report on `worker`'s queue without scoring
    pub async fn seed_assigned_report(&self, citizen: &User, worker: &User) -> Result<Report> {
        let mut report = Report::new(
            citizen.id,
            "Seeded task".to_string(),
            GeoPoint::new(0.0, 0.0),
            "https://img.example.org/seed.jpg".to_string(),
            None,
        );
        db::reports::insert_report(&self.pool, &report).await?;

        report.status = ReportStatus::Assigned;
        report.assigned_worker_id = Some(worker.id);
        db::reports::update_report_if_status(&self.pool, &report, ReportStatus::Pending).await?;
        Ok(db::reports::require_report(&self.pool, report.id).await?)
    }

    pub async fn deactivate(&self, user: &User) -> Result<()> {
        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn lifecycle_config(scoring_timeout: Duration, upload_dir: PathBuf) -> LifecycleConfig {
    LifecycleConfig {
        scoring_timeout,
        rewards: RewardsConfig {
            submitter_reward_amount: SUBMITTER_REWARD,
            worker_payment_amount: WORKER_PAYMENT,
        },
        upload_dir,
    }
}
