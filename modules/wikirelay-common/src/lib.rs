pub mod config;
pub mod error;
pub mod linking;
pub mod locale;
pub mod types;

pub use config::BotConfig;
pub use error::RelayError;
pub use linking::LinkBuilder;
pub use locale::Locale;
pub use types::*;
