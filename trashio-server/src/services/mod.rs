//! Business logic services

pub mod assignment;
pub mod duplicates;
pub mod effects;
pub mod image_refs;
pub mod lifecycle;
pub mod report_actions;
pub mod scoring_client;
pub mod verdict;

pub use assignment::WorkerSelector;
pub use duplicates::DuplicateDetector;
pub use effects::{DispatchReport, EffectExecutor, SideEffect};
pub use lifecycle::{EvaluationOutcome, LifecycleConfig, LifecycleController, Transition};
pub use report_actions::ReportActions;
pub use scoring_client::{HttpScoringClient, ScoringError, ScoringService};
pub use verdict::{BeforeVerdict, CleaningVerdict};
