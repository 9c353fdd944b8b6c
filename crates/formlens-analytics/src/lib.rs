//! Field-level response analytics.
//!
//! Raw answers are pulled out of stored responses ([`extraction`]), routed to a
//! per-field-type analyzer ([`analyzers`]) and cached per form by the
//! [`FieldAnalyticsService`].

pub mod analyzers;
pub mod extraction;
pub mod memory;
pub mod results;
pub mod service;
pub mod stats;

pub use analyzers::*;
pub use extraction::*;
pub use memory::*;
pub use results::*;
pub use service::*;

pub use formlens_core::{FormLensError, Result};
