//! Payments issued on verified cleanings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    SubmitterReward,
    WorkerPayment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::SubmitterReward => "submitter_reward",
            PaymentType::WorkerPayment => "worker_payment",
        }
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitter_reward" => Ok(PaymentType::SubmitterReward),
            "worker_payment" => Ok(PaymentType::WorkerPayment),
            other => Err(format!("unknown payment type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Issued,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Issued => "Issued",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Issued" => Ok(PaymentStatus::Issued),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub report_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Payment created and issued in one step; there is no disbursement stage
    pub fn issued(report_id: Uuid, user_id: Uuid, amount: f64, payment_type: PaymentType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            report_id,
            user_id,
            amount,
            payment_type,
            status: PaymentStatus::Issued,
            created_at: now,
            issued_at: Some(now),
        }
    }
}
