pub mod classify;
pub mod config;
pub mod types;

pub use classify::classify_identifier;
pub use config::Config;
pub use types::*;
