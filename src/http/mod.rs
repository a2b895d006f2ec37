pub mod actor;
pub mod controllers;
pub mod error;
pub mod jwt;
pub mod openapi;
pub mod util;

pub use actor::{Actor, Viewer};
pub use error::Error;
