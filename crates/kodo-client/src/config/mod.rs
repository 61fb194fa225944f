//! On-disk configuration: known servers, accounts, and client tuning, stored
//! as `config.toml` under the platform config directory.

pub mod account_config;
pub mod kodo_config;
pub mod server_config;

pub use account_config::AccountConfig;
pub use kodo_config::{ConfigError, KodoConfig};
pub use server_config::ServerConfig;
