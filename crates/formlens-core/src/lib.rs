pub mod config_manager;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config_manager::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;
