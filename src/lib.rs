pub mod config;
pub mod discovery;
pub mod executor;
pub mod harvest;
pub mod kubectl;
pub mod model;
pub mod snapshot;
pub mod traits;

// Re-export common types for convenience
pub use config::HarvestConfig;
pub use executor::*;
pub use model::*;
pub use traits::*;
