pub mod error;
pub mod permissions;

pub use error::Error;
pub use permissions::{Permission, PermissionScope};
