//! Test doubles for the bootstrap suite.

use std::ffi::OsString;
use std::fs;
use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use tealium_config::Config;
use tealium_tag_management::{
    LoadAttempt, MainExecutor, SurfaceClient, SurfaceError, SurfaceFactory, SurfaceSettings, Task,
    WebSurface,
};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::LifecycleReporter;

/// Lifecycle events captured by [`RecordingLifecycleReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    TagManagementStarted { url: String, started: bool },
}

#[derive(Default)]
pub struct RecordingLifecycleReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingLifecycleReporter {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    fn push(&self, event: LifecycleEvent) {
        self.events.lock().expect("events mutex poisoned").push(event);
    }
}

impl LifecycleReporter for RecordingLifecycleReporter {
    fn bootstrap_starting(&self) {
        self.push(LifecycleEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.push(LifecycleEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.push(LifecycleEvent::BootstrapFailed(error.to_string()));
    }

    fn tag_management_started(&self, url: &str, attempt: &LoadAttempt) {
        self.push(LifecycleEvent::TagManagementStarted {
            url: url.to_owned(),
            started: attempt.is_started(),
        });
    }
}

/// Loader that provisions an asset directory holding `firebase.json`.
pub struct TestConfigLoader {
    assets: TempDir,
    tag_management_enabled: bool,
}

impl TestConfigLoader {
    pub fn new() -> Self {
        let assets = TempDir::new().expect("failed to create temporary asset directory");
        fs::write(
            assets.path().join("firebase.json"),
            r#"{
                "config": {"analytics_enabled": true},
                "mappings": {"order_id": "purchase.order_id", "tealium_event": "event_name"},
                "commands": {"purchase": "logPurchase"}
            }"#,
        )
        .expect("failed to write firebase.json");
        Self {
            assets,
            tag_management_enabled: true,
        }
    }

    pub fn without_tag_management(mut self) -> Self {
        self.tag_management_enabled = false;
        self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let directory = Utf8PathBuf::from_path_buf(self.assets.path().to_path_buf())
            .expect("temporary asset path was not valid UTF-8");
        Ok(Config {
            account: "acme".to_owned(),
            profile: "main".to_owned(),
            asset_directory: Some(directory),
            tag_management_enabled: self.tag_management_enabled,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("tealium"),
            OsString::from("--refresh-interval-secs"),
            OsString::from("soon"),
        ];
        Config::load_from_iter(args)
    }
}

/// Executor that runs every task on the posting thread.
pub struct InlineExecutor;

impl MainExecutor for InlineExecutor {
    fn post(&self, task: Task) {
        task();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Load(String),
    Eval(String),
}

struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl WebSurface for RecordingSurface {
    fn load_url(&self, url: &str) {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(SurfaceCall::Load(url.to_owned()));
    }

    fn evaluate_javascript(&self, script: &str) {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(SurfaceCall::Eval(script.to_owned()));
    }

    fn destroy(&self) {}
}

/// Factory that hands out recording surfaces and keeps their clients.
#[derive(Default)]
pub struct RecordingSurfaceFactory {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    clients: Mutex<Vec<SurfaceClient>>,
}

impl RecordingSurfaceFactory {
    pub fn client(&self) -> SurfaceClient {
        self.clients
            .lock()
            .expect("clients mutex poisoned")
            .last()
            .cloned()
            .expect("no surface was created")
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Eval(script) => Some(script),
                SurfaceCall::Load(_) => None,
            })
            .collect()
    }
}

impl SurfaceFactory for RecordingSurfaceFactory {
    fn create(
        &self,
        _settings: &SurfaceSettings,
        client: SurfaceClient,
    ) -> Result<Box<dyn WebSurface>, SurfaceError> {
        self.clients
            .lock()
            .expect("clients mutex poisoned")
            .push(client);
        Ok(Box::new(RecordingSurface {
            calls: Arc::clone(&self.calls),
        }))
    }
}
