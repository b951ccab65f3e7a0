//! Database models split into domain-specific modules.

pub mod guide;
pub mod user;

pub use guide::*;
pub use user::*;
