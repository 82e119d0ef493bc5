//! Command implementations.

pub mod config;
pub mod disposition;
pub mod grade;
pub mod tiers;

pub use self::config::execute_config;
pub use self::disposition::execute_disposition;
pub use self::grade::execute_grade;
pub use self::tiers::execute_tiers;
