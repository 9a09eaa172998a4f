pub mod error;
pub mod platform;
pub mod policy;
pub mod traits;
