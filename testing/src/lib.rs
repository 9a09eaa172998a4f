#[cfg(feature = "ac")]
pub mod ac;
pub mod core;

pub fn is_send_sync<T: Send + Sync>(_: &T) {}
