/// Application-level constants
pub const APP_NAME: &str = "Starbound";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard cap on clarifying questions within one follow-up thread.
pub const MAX_FOLLOWUPS_PER_THREAD: u32 = 2;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "starbound_lib=info"
}

/// Confidence recorded for factors written by the triage core itself.
pub mod confidence {
    /// Duration, severity, progression and context chips.
    pub const CHOICE: f32 = 0.95;

    /// Body-region chips mapping to a symptom.
    pub const LOCATION: f32 = 0.9;

    /// Chips picked directly from the vocabulary (no interpretation).
    pub const CHIP: f32 = 1.0;
}
