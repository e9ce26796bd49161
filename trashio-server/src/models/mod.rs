//! Data models for trashio-server

pub mod notification;
pub mod payment;
pub mod report;
pub mod user;

pub use notification::{Notification, NotificationKind};
pub use payment::{Payment, PaymentStatus, PaymentType};
pub use report::{AiDecision, GeoPoint, Report, ReportStatus};
pub use user::{NewUser, Role, User};
