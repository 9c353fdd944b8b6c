pub mod cache;
pub mod invalidation;
pub mod ttl_cache;

pub use cache::*;
pub use invalidation::*;
pub use ttl_cache::*;

// Re-export common types for convenience
pub use formlens_core::{FormLensError, Result};
