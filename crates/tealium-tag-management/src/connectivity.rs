//! Network reachability oracle consulted before every load.

/// Reports the device's current connectivity.
#[cfg_attr(test, mockall::automock)]
pub trait Connectivity: Send + Sync {
    /// Returns `true` when any network is reachable.
    fn is_connected(&self) -> bool;

    /// Returns `true` when the active network is Wi-Fi.
    fn is_connected_wifi(&self) -> bool;
}

/// Connectivity that always reports a Wi-Fi connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConnected;

impl Connectivity for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }

    fn is_connected_wifi(&self) -> bool {
        true
    }
}
