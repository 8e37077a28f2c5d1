//! Claim transaction pipeline: parameter validation, gas estimation, orchestration
//! and error classification.

pub mod classifier;
pub mod gas;
pub mod orchestrator;
pub mod validator;

pub use classifier::{classify, classify_error, ClassifiedError, ErrorKind, RevertArgs};
pub use gas::{estimate_cost, GasEstimator};
pub use orchestrator::{ClaimFailure, ClaimOrchestrator, ClaimStatus};
pub use validator::{validate, validate_at};
