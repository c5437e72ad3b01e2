//! Response/model builder: turns a triage outcome into what the UI shows.

pub mod builder;
pub mod guidance;
pub mod types;

pub use builder::{build_response_model, ResponseOptions};
pub use guidance::{guidance_steps, phrase_intention};
pub use types::*;
