//! Library settings and the channel that announces changes to them.
//!
//! Components that react to settings (the tag-management surface in
//! particular) subscribe once when they are constructed and receive every
//! subsequent [`LibrarySettings`] value published on the [`SettingsBus`].
//! Subscriptions are RAII handles: dropping a [`Subscription`] detaches the
//! listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_REFRESH_INTERVAL_SECS;

/// Remotely adjustable behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Only load remote content while connected over Wi-Fi.
    #[serde(default)]
    pub wifi_only: bool,
    /// Seconds after which a loaded page is considered stale.
    #[serde(default = "crate::defaults::default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl LibrarySettings {
    /// Returns the refresh interval as a [`Duration`].
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            wifi_only: false,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

/// Callback invoked with every published settings value.
pub type SettingsListener = Arc<dyn Fn(&LibrarySettings) + Send + Sync>;

#[derive(Default)]
struct BusState {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, SettingsListener)>>,
    current: Mutex<LibrarySettings>,
}

/// Publish/subscribe channel for [`LibrarySettings`].
///
/// Cloning the bus yields another handle onto the same channel.
#[derive(Clone, Default)]
pub struct SettingsBus {
    state: Arc<BusState>,
}

impl std::fmt::Debug for SettingsBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsBus")
            .field("current", &self.current())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SettingsBus {
    /// Creates a bus whose current value is `initial`.
    #[must_use]
    pub fn new(initial: LibrarySettings) -> Self {
        let bus = Self::default();
        *bus.lock_current() = initial;
        bus
    }

    /// Registers a listener for future updates.
    ///
    /// The listener is not invoked with the current value; read it with
    /// [`SettingsBus::current`] when subscribing.
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn subscribe(&self, listener: SettingsListener) -> Subscription {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Stores `settings` as the current value and notifies every listener.
    ///
    /// Listeners run on the caller's thread, outside the bus locks, so they
    /// may publish or subscribe re-entrantly.
    pub fn publish(&self, settings: LibrarySettings) {
        *self.lock_current() = settings;
        let listeners: Vec<SettingsListener> = self
            .state
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&settings);
        }
    }

    /// Returns the most recently published settings.
    #[must_use]
    pub fn current(&self) -> LibrarySettings {
        *self.lock_current()
    }

    /// Returns the number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, LibrarySettings> {
        self.state
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle keeping a settings listener attached.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    state: Weak<BusState>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}
