pub mod config;
pub mod error;
pub mod github;
pub mod policy;
pub mod webhooks;

pub use error::GatekeeperError;
