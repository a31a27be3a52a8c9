pub mod types;
pub mod errors;
pub mod tree;

pub use types::*;
pub use errors::*;
pub use tree::*;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
