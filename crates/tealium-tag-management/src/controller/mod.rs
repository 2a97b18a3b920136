//! Lifecycle of the embedded tag-management surface.
//!
//! [`EmbeddedSurfaceController`] owns at most one [`WebSurface`] and drives
//! it through `Unloaded → Loading → Loaded`, with `Error` reachable from any
//! in-flight or loaded state and left again by the next load. Loads are gated
//! on connectivity and on the Wi-Fi-only setting; a load requested while one
//! is in flight is ignored. Navigations to the bridge scheme are cancelled
//! and forwarded to a [`RemoteCommandSender`], and command answers are
//! evaluated back into the page.
//!
//! Every call into the surface is posted to the [`MainExecutor`]; callers
//! never block on the surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tealium_config::{LibrarySettings, SettingsBus, Subscription};
use tealium_dispatcher::{BRIDGE_SCHEME, is_bridge_url};
use tealium_remote_commands::{Response, ResponseHandler};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::connectivity::Connectivity;
use crate::error::{LoadFailure, SurfaceError};
use crate::executor::MainExecutor;
use crate::script::{config_extraction_script, response_script};
use crate::state::{StateCell, SurfaceState};
use crate::surface::{
    ConsoleLevel, InterceptedResponse, SurfaceFactory, SurfaceSettings, WebSurface, is_favicon,
};

/// Tracing target for surface lifecycle events.
pub(crate) const SURFACE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::surface");

/// Query parameter appended to every load to defeat caches.
pub const CACHE_BUSTER_PARAM: &str = "timestamp_unix";

/// Receives bridge URLs raised by the page.
pub trait RemoteCommandSender: Send + Sync {
    /// Forwards `url` for dispatch; answers go through `handler`.
    fn send_remote_command(&self, url: &str, handler: Arc<dyn ResponseHandler>);
}

impl<F> RemoteCommandSender for F
where
    F: Fn(&str, Arc<dyn ResponseHandler>) + Send + Sync,
{
    fn send_remote_command(&self, url: &str, handler: Arc<dyn ResponseHandler>) {
        self(url, handler);
    }
}

/// Result of a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadAttempt {
    /// Navigation to `url` was scheduled.
    Started {
        /// Cache-busted URL being loaded.
        url: String,
    },
    /// No network is reachable.
    SkippedOffline,
    /// Wi-Fi only is active and the device is not on Wi-Fi.
    SkippedWifiUnavailable,
    /// A load is already in flight.
    AlreadyLoading,
}

impl LoadAttempt {
    /// Returns `true` when navigation was scheduled.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// Collaborators the controller drives.
#[derive(Clone)]
pub struct SurfaceCollaborators {
    /// Builds surfaces.
    pub factory: Arc<dyn SurfaceFactory>,
    /// Connectivity oracle.
    pub connectivity: Arc<dyn Connectivity>,
    /// Context that owns the surface.
    pub executor: Arc<dyn MainExecutor>,
    /// Destination of bridge URLs.
    pub sender: Arc<dyn RemoteCommandSender>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl SurfaceCollaborators {
    /// Bundles collaborators using the system clock.
    #[must_use]
    pub fn new(
        factory: Arc<dyn SurfaceFactory>,
        connectivity: Arc<dyn Connectivity>,
        executor: Arc<dyn MainExecutor>,
        sender: Arc<dyn RemoteCommandSender>,
    ) -> Self {
        Self {
            factory,
            connectivity,
            executor,
            sender,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

struct Inner {
    url: String,
    scheme: String,
    parts: SurfaceCollaborators,
    state: StateCell,
    generation: AtomicU64,
    surface: Mutex<Option<Arc<dyn WebSurface>>>,
    settings: Mutex<LibrarySettings>,
    last_load: Mutex<Option<SystemTime>>,
    last_error: Mutex<Option<SurfaceError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn current_surface(&self) -> Option<Arc<dyn WebSurface>> {
        lock(&self.surface).clone()
    }

    fn create_surface(self: &Arc<Self>, generation: u64) {
        let client = SurfaceClient {
            inner: Arc::downgrade(self),
            generation,
        };
        match self.parts.factory.create(&SurfaceSettings::default(), client) {
            Ok(surface) => {
                let previous = lock(&self.surface).replace(Arc::from(surface));
                if let Some(previous) = previous {
                    previous.destroy();
                }
                info!(target: SURFACE_TARGET, generation, "surface created");
            }
            Err(error) => {
                self.state.fail();
                warn!(target: SURFACE_TARGET, error = %error, "surface creation failed");
                *lock(&self.last_error) = Some(error);
            }
        }
    }

    fn destroy_surface(&self) {
        let taken = lock(&self.surface).take();
        if let Some(surface) = taken {
            surface.destroy();
            debug!(target: SURFACE_TARGET, "surface destroyed");
        }
    }

    fn initialize(self: &Arc<Self>) -> LoadAttempt {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if self.state.abandon_load() == SurfaceState::Loading {
            debug!(target: SURFACE_TARGET, generation, "abandoning load of the replaced surface");
        }
        let inner = Arc::clone(self);
        self.parts
            .executor
            .post(Box::new(move || inner.create_surface(generation)));
        self.load()
    }

    fn load(self: &Arc<Self>) -> LoadAttempt {
        let wifi_only = lock(&self.settings).wifi_only;
        if !self.parts.connectivity.is_connected() {
            debug!(target: SURFACE_TARGET, "offline; load skipped");
            return LoadAttempt::SkippedOffline;
        }
        if wifi_only && !self.parts.connectivity.is_connected_wifi() {
            debug!(target: SURFACE_TARGET, "wifi only and not on wifi; load skipped");
            return LoadAttempt::SkippedWifiUnavailable;
        }
        let Some(previous) = self.state.try_begin_load() else {
            debug!(target: SURFACE_TARGET, "load already in flight");
            return LoadAttempt::AlreadyLoading;
        };

        let url = self.cache_busted_url();
        info!(target: SURFACE_TARGET, url = %url, previous = %previous, "loading tag management page");
        let inner = Arc::clone(self);
        let target = url.clone();
        self.parts
            .executor
            .post(Box::new(move || inner.navigate(&target)));
        LoadAttempt::Started { url }
    }

    fn navigate(&self, url: &str) {
        if let Some(surface) = self.current_surface() {
            surface.load_url(url);
            return;
        }
        self.state.fail();
        let error = SurfaceError::Unavailable {
            url: url.to_owned(),
        };
        warn!(target: SURFACE_TARGET, error = %error, "navigation dropped");
        *lock(&self.last_error) = Some(error);
    }

    fn cache_busted_url(&self) -> String {
        let seconds = self
            .parts
            .clock
            .now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{CACHE_BUSTER_PARAM}={seconds}", self.url)
    }

    fn evaluate(self: &Arc<Self>, script: String) {
        let inner = Arc::clone(self);
        self.parts.executor.post(Box::new(move || {
            if let Some(surface) = inner.current_surface() {
                surface.evaluate_javascript(&script);
            }
        }));
    }

    fn record_failure(&self, url: &str, failure: LoadFailure) {
        if self.state.fail() == SurfaceState::Error {
            debug!(target: SURFACE_TARGET, url = %url, "load error already reported");
            return;
        }
        *lock(&self.last_load) = Some(self.parts.clock.now());
        let error = SurfaceError::Load {
            url: url.to_owned(),
            failure,
        };
        warn!(target: SURFACE_TARGET, error = %error, "tag management page failed to load");
        *lock(&self.last_error) = Some(error);
    }

    fn apply_settings(self: &Arc<Self>, settings: &LibrarySettings) -> LoadAttempt {
        *lock(&self.settings) = *settings;
        debug!(
            target: SURFACE_TARGET,
            wifi_only = settings.wifi_only,
            refresh_interval_secs = settings.refresh_interval_secs,
            "library settings updated"
        );
        self.load()
    }
}

/// Callback sink handed to each surface.
///
/// A client belongs to one surface instance; once the controller replaces
/// that surface, the client's callbacks are ignored.
#[derive(Clone)]
pub struct SurfaceClient {
    inner: Weak<Inner>,
    generation: u64,
}

impl std::fmt::Debug for SurfaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceClient")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl SurfaceClient {
    fn live(&self) -> Option<Arc<Inner>> {
        let inner = self.inner.upgrade()?;
        if inner.generation.load(Ordering::Acquire) == self.generation {
            Some(inner)
        } else {
            debug!(
                target: SURFACE_TARGET,
                generation = self.generation,
                "ignoring callback from a replaced surface"
            );
            None
        }
    }

    /// Returns the surface generation this client serves.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The page finished loading.
    ///
    /// Marks the surface loaded and injects the metadata script, unless the
    /// load already failed.
    pub fn on_page_finished(&self, url: &str) {
        let Some(inner) = self.live() else {
            return;
        };
        *lock(&inner.last_load) = Some(inner.parts.clock.now());
        if inner.state.complete_load() == SurfaceState::Error {
            debug!(target: SURFACE_TARGET, url = %url, "page finished after a load error");
            return;
        }
        info!(target: SURFACE_TARGET, url = %url, "tag management page loaded");
        inner.evaluate(config_extraction_script(&inner.scheme));
    }

    /// A resource failed to load. Favicon misses are ignored.
    pub fn on_received_error(&self, url: &str, code: i32, description: &str) {
        if is_favicon(url) {
            return;
        }
        if let Some(inner) = self.live() {
            inner.record_failure(
                url,
                LoadFailure::General {
                    code,
                    description: description.to_owned(),
                },
            );
        }
    }

    /// The server answered with an HTTP error. Favicon misses are ignored.
    pub fn on_received_http_error(&self, url: &str, status: u16) {
        if is_favicon(url) {
            return;
        }
        if let Some(inner) = self.live() {
            inner.record_failure(url, LoadFailure::Http { status });
        }
    }

    /// TLS negotiation failed.
    pub fn on_received_ssl_error(&self, url: &str, description: &str) {
        if let Some(inner) = self.live() {
            inner.record_failure(
                url,
                LoadFailure::Ssl {
                    description: description.to_owned(),
                },
            );
        }
    }

    /// The rendering process terminated.
    ///
    /// Destroys the surface and reinitializes it from scratch. Always
    /// returns `true` to report the termination as handled.
    pub fn on_render_process_gone(&self, crashed: bool) -> bool {
        let Some(inner) = self.live() else {
            return true;
        };
        inner.state.fail();
        let error = SurfaceError::RenderProcessGone { crashed };
        warn!(target: SURFACE_TARGET, error = %error, "restarting surface");
        *lock(&inner.last_error) = Some(error);
        let teardown = Arc::clone(&inner);
        inner
            .parts
            .executor
            .post(Box::new(move || teardown.destroy_surface()));
        inner.initialize();
        true
    }

    /// Decides whether the surface should skip a navigation.
    ///
    /// Bridge URLs are cancelled and forwarded for dispatch; every other
    /// navigation proceeds.
    pub fn should_override_url_loading(&self, url: &str) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        if !is_bridge_url(url, &inner.scheme) {
            return false;
        }
        if self.live().is_some() {
            debug!(target: SURFACE_TARGET, url = %url, "forwarding bridge invocation");
            let handler: Arc<dyn ResponseHandler> = Arc::new(SurfaceResponder {
                inner: Arc::downgrade(&inner),
            });
            inner.parts.sender.send_remote_command(url, handler);
        }
        true
    }

    /// Serves requests locally instead of from the network.
    ///
    /// Only the site icon is intercepted.
    #[must_use]
    pub fn should_intercept_request(&self, url: &str) -> Option<InterceptedResponse> {
        is_favicon(url).then(InterceptedResponse::empty_png)
    }

    /// A console message was emitted by the page.
    pub fn on_console_message(&self, level: ConsoleLevel, message: &str, source: &str, line: u32) {
        debug!(
            target: SURFACE_TARGET,
            level = %level,
            source = %source,
            line,
            "console: {message}"
        );
    }
}

struct SurfaceResponder {
    inner: Weak<Inner>,
}

impl ResponseHandler for SurfaceResponder {
    fn on_handle(&self, response: &Response) {
        let Some(script) = response_script(response) else {
            debug!(
                target: SURFACE_TARGET,
                command = %response.command_name(),
                "response has no response id; not delivered"
            );
            return;
        };
        if let Some(inner) = self.inner.upgrade() {
            inner.evaluate(script);
        }
    }
}

/// Owns the embedded tag-management surface.
///
/// Holds the settings subscription for its whole lifetime.
pub struct EmbeddedSurfaceController {
    inner: Arc<Inner>,
    _subscription: Subscription,
}

impl std::fmt::Debug for EmbeddedSurfaceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedSurfaceController")
            .field("url", &self.inner.url)
            .field("state", &self.inner.state.get())
            .finish_non_exhaustive()
    }
}

impl EmbeddedSurfaceController {
    /// Creates a controller for `url` and subscribes it to `settings`.
    ///
    /// No surface exists until [`EmbeddedSurfaceController::initialize`] is
    /// called.
    #[must_use]
    pub fn new(url: impl Into<String>, parts: SurfaceCollaborators, settings: &SettingsBus) -> Self {
        Self::with_scheme(url, BRIDGE_SCHEME, parts, settings)
    }

    /// Creates a controller that intercepts bridge URLs under `scheme`.
    #[must_use]
    pub fn with_scheme(
        url: impl Into<String>,
        scheme: impl Into<String>,
        parts: SurfaceCollaborators,
        settings: &SettingsBus,
    ) -> Self {
        let inner = Arc::new(Inner {
            url: url.into(),
            scheme: scheme.into(),
            parts,
            state: StateCell::new(),
            generation: AtomicU64::new(0),
            surface: Mutex::new(None),
            settings: Mutex::new(settings.current()),
            last_load: Mutex::new(None),
            last_error: Mutex::new(None),
        });
        let weak = Arc::downgrade(&inner);
        let subscription = settings.subscribe(Arc::new(move |updated: &LibrarySettings| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_settings(updated);
            }
        }));
        Self {
            inner,
            _subscription: subscription,
        }
    }

    /// Creates the surface and starts the first load.
    pub fn initialize(&self) -> LoadAttempt {
        self.inner.initialize()
    }

    /// Loads the tag-management page if policy allows.
    ///
    /// Skipped loads are not queued; the next call, settings update or
    /// staleness refresh tries again.
    pub fn load(&self) -> LoadAttempt {
        self.inner.load()
    }

    /// Applies new settings and immediately attempts a load under them.
    pub fn on_library_settings_updated(&self, settings: &LibrarySettings) -> LoadAttempt {
        self.inner.apply_settings(settings)
    }

    /// Reloads when the last load is older than the refresh interval.
    ///
    /// Returns `None` when the page is still fresh.
    pub fn refresh_if_stale(&self) -> Option<LoadAttempt> {
        let interval = self.refresh_interval();
        let last_load = *lock(&self.inner.last_load);
        let stale = last_load.is_none_or(|loaded| {
            self.inner
                .parts
                .clock
                .now()
                .duration_since(loaded)
                .is_ok_and(|age| age >= interval)
        });
        stale.then(|| self.load())
    }

    /// Destroys the current surface and returns to
    /// [`SurfaceState::Unloaded`]. The next
    /// [`EmbeddedSurfaceController::initialize`] builds a fresh one.
    pub fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.state.reset();
        let inner = Arc::clone(&self.inner);
        self.inner
            .parts
            .executor
            .post(Box::new(move || inner.destroy_surface()));
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SurfaceState {
        self.inner.state.get()
    }

    /// Returns when the page last finished or failed loading.
    #[must_use]
    pub fn last_load(&self) -> Option<SystemTime> {
        *lock(&self.inner.last_load)
    }

    /// Returns the most recent surface error.
    #[must_use]
    pub fn last_error(&self) -> Option<SurfaceError> {
        lock(&self.inner.last_error).clone()
    }

    /// Returns the page URL without the cache buster.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns whether loads require Wi-Fi.
    #[must_use]
    pub fn wifi_only(&self) -> bool {
        lock(&self.inner.settings).wifi_only
    }

    /// Returns the stored refresh interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        lock(&self.inner.settings).refresh_interval()
    }
}
