//! Background Tasks Module
//!
//! # Tasks
//! - Cleanup: purges expired cached responses and idle rate-limiter keys at
//!   the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
