use thiserror::Error;

mod auth;
mod cache;
mod database;
mod invites;
mod logging;
mod server;

pub use auth::Auth;
pub use cache::Cache;
pub use database::{Database, DbPoolConfig};
pub use invites::Invites;
pub use logging::{InvalidLoggingStyle, Logging, LoggingStyle};
pub use server::Server;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
