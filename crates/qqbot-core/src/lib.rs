pub mod config;
pub mod error;
pub mod flexible;
pub mod superuser;

pub use config::BotConfig;
pub use error::{CoreError, Result};
pub use superuser::is_superuser;
