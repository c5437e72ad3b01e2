pub mod config;
pub mod models;
pub mod triage; // Factor vocabulary, question framework, rules engine
pub mod response; // Response/model builder
pub mod session; // Per-thread accumulation and sequencing

use tracing_subscriber::EnvFilter;

pub use models::{Factor, FactorCode, FactorWrite, NextActionKind, RiskBand};
pub use response::{build_response_model, ResponseModel, ResponseOptions, TransparencyInfo};
pub use session::{Extraction, FactorExtractor, SessionRegistry, TriageSession};
pub use triage::{assess, choose_next_follow_up, has_any_factor, FollowUpPlan, StateSnapshot};

/// Install the fmt subscriber, honouring `RUST_LOG`.
///
/// Safe to call more than once: later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} triage core v{}", config::APP_NAME, config::APP_VERSION);
    }
}
