// Re-export all model types
pub use self::booking::*;
pub use self::dish::*;
pub use self::errors::*;

mod booking;
mod dish;
mod errors;
pub mod validation;
