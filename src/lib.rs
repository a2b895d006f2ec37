pub mod app;
pub mod cache;
pub mod config;
pub mod database;
pub mod http;
pub mod logging;
pub mod models;
pub mod projection;
pub mod schema;
pub mod types;
pub mod util;

pub use app::App;
