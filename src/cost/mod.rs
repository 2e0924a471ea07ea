//! Cost estimation
//!
//! Regional price tables and the engine that turns tier statistics into
//! monthly and one-time costs.

pub mod engine;
pub mod loader;
pub mod models;

pub use engine::{read_volume, CostEngine, BYTES_PER_GB};
pub use loader::{builtin_price_table, list_regions, load_price_table, DEFAULT_REGION};
pub use models::*;
