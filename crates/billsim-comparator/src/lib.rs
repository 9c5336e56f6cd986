pub mod bridge;
pub mod error;

pub use bridge::{ComparatorBridge, ComparatorCell};
pub use error::ComparatorError;
