#[cfg(feature = "memory")]
pub mod memory;
pub mod record;
pub mod remote;
