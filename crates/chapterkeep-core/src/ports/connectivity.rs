//! Connectivity port.

/// Reports whether the network is reachable.
///
/// Only used as a fail-fast precondition; fetch failures are still
/// handled per item.
pub trait ConnectivityPort: Send + Sync {
    /// Whether the device currently has connectivity.
    fn is_online(&self) -> bool;
}

/// Connectivity source for hosts without a reachability signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityPort for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}
