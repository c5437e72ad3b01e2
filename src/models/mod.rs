pub mod enums;
pub mod factor;

pub use enums::*;
pub use factor::*;
