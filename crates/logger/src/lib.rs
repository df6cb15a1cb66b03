//! Tracing setup shared by the Linkwatch binaries.

mod subscriber;

pub use subscriber::{LogFormat, init, try_init};
