//! Triage core: factors in, routing decision out.
//!
//! Every function here is pure and synchronous. The caller owns the factor
//! list and the follow-up counter across turns and must not run two passes
//! for the same thread at once (see `crate::session::SessionRegistry`).

pub mod engine;
pub mod followup;
pub mod rules;
pub mod types;
pub mod vocabulary;

pub use engine::{assess, assess_at};
pub use followup::choose_next_follow_up;
pub use types::*;
pub use vocabulary::has_any_factor;
