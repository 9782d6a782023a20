//! Progress forwarding for in-flight items.

mod reporter;
mod throttle;

pub(crate) use reporter::ItemProgressReporter;
pub use throttle::ProgressThrottle;
