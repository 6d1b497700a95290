//! Built-in time systems

mod utc;

pub use utc::UtcTimeSystem;
