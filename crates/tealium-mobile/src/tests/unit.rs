//! Unit tests for the SDK bootstrap.

use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use tealium_config::{Config, LibrarySettings};
use tealium_dispatcher::{Dispatch, TealiumEvent};
use tealium_remote_commands::{Payload, RemoteCommand, RemoteCommandFn, Response};
use tealium_tag_management::{AlwaysConnected, SurfaceState};

use super::support::{
    FailingConfigLoader, InlineExecutor, LifecycleEvent, RecordingLifecycleReporter,
    RecordingSurfaceFactory, SurfaceCall, TestConfigLoader,
};
use crate::{BootstrapError, StaticConfigLoader, SurfaceBinding, Tealium, bootstrap_with};

const PAGE: &str = "https://tags.tiqcdn.com/utag/acme/main/prod/mobile.html";

struct Running {
    sdk: Tealium,
    // Owns the temporary asset directory for the lifetime of the test.
    _loader: TestConfigLoader,
    factory: Arc<RecordingSurfaceFactory>,
    reporter: Arc<RecordingLifecycleReporter>,
}

fn binding(factory: &Arc<RecordingSurfaceFactory>) -> SurfaceBinding {
    SurfaceBinding {
        factory: factory.clone(),
        connectivity: Arc::new(AlwaysConnected),
        executor: Some(Arc::new(InlineExecutor)),
    }
}

#[fixture]
fn running() -> Running {
    let factory = Arc::new(RecordingSurfaceFactory::default());
    let reporter = Arc::new(RecordingLifecycleReporter::default());
    let loader = TestConfigLoader::new();
    let sdk = bootstrap_with(&loader, reporter.clone(), Some(binding(&factory)))
        .expect("bootstrap should succeed");
    Running {
        sdk,
        _loader: loader,
        factory,
        reporter,
    }
}

fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[rstest]
fn bootstrap_starts_surface_and_reports_lifecycle(running: Running) {
    let events = running.reporter.events();

    assert_eq!(events.first(), Some(&LifecycleEvent::BootstrapStarting));
    assert!(events.contains(&LifecycleEvent::TagManagementStarted {
        url: PAGE.to_owned(),
        started: true,
    }));
    assert_eq!(events.last(), Some(&LifecycleEvent::BootstrapSucceeded));

    let controller = running.sdk.tag_management().expect("surface running");
    assert_eq!(controller.state(), SurfaceState::Loading);
    match running.factory.calls().first() {
        Some(SurfaceCall::Load(url)) => assert!(url.starts_with(&format!("{PAGE}?timestamp_unix="))),
        other => panic!("expected initial load, got {other:?}"),
    }
}

#[test]
fn bootstrap_without_binding_skips_surface() {
    let reporter = Arc::new(RecordingLifecycleReporter::default());

    let sdk = bootstrap_with(&TestConfigLoader::new(), reporter.clone(), None)
        .expect("bootstrap should succeed");

    assert!(sdk.tag_management().is_none());
    assert!(
        !reporter
            .events()
            .iter()
            .any(|event| matches!(event, LifecycleEvent::TagManagementStarted { .. }))
    );
}

#[test]
fn disabled_tag_management_ignores_binding() {
    let factory = Arc::new(RecordingSurfaceFactory::default());

    let sdk = bootstrap_with(
        &TestConfigLoader::new().without_tag_management(),
        Arc::new(RecordingLifecycleReporter::default()),
        Some(binding(&factory)),
    )
    .expect("bootstrap should succeed");

    assert!(sdk.tag_management().is_none());
    assert!(factory.calls().is_empty());
}

#[test]
fn failing_loader_reports_configuration_error() {
    let reporter = Arc::new(RecordingLifecycleReporter::default());

    let error = bootstrap_with(&FailingConfigLoader, reporter.clone(), None)
        .expect_err("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Configuration { .. }));
    assert!(
        reporter
            .events()
            .iter()
            .any(|event| matches!(event, LifecycleEvent::BootstrapFailed(_)))
    );
}

#[test]
fn tag_management_without_profile_is_rejected() {
    let factory = Arc::new(RecordingSurfaceFactory::default());

    let error = bootstrap_with(
        &StaticConfigLoader::new(Config::default()),
        Arc::new(RecordingLifecycleReporter::default()),
        Some(binding(&factory)),
    )
    .expect_err("bootstrap should fail");

    assert!(matches!(error, BootstrapError::MissingProfile));
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[rstest]
fn tracked_event_reaches_asset_configured_command(running: Running) {
    let calls = Arc::new(Mutex::new(Vec::<Response>::new()));
    let sink = Arc::clone(&calls);
    let firebase: Arc<dyn RemoteCommand> = Arc::new(RemoteCommandFn::new("firebase", move |response| {
        sink.lock().expect("calls mutex poisoned").push(response);
        Ok(())
    }));
    running
        .sdk
        .add_remote_command(firebase, Some("firebase.json"))
        .expect("register firebase");
    let event = TealiumEvent::new("purchase", object(json!({"order_id": "ord-1", "coupon": "X"})));

    let report = running.sdk.track(&event);

    assert_eq!(report.invoked(), vec!["firebase"]);
    let calls = calls.lock().expect("calls mutex poisoned");
    assert_eq!(
        calls[0].request_payload(),
        &object(json!({
            "purchase": {"order_id": "ord-1"},
            "event_name": "purchase",
            "command_name": "logPurchase",
            "analytics_enabled": true
        }))
    );
    assert_eq!(event.event_name(), "purchase");
}

#[rstest]
fn page_bridge_call_is_answered_in_page(running: Running) {
    let bgcolor: Arc<dyn RemoteCommand> = Arc::new(RemoteCommandFn::new("bgcolor", |mut response| {
        let colour = response.request_payload()["color"].clone();
        response.set_body(format!("set {colour}"));
        response.send();
        Ok(())
    }));
    running
        .sdk
        .add_remote_command(bgcolor, None)
        .expect("register bgcolor");
    let client = running.factory.client();

    let cancelled = client.should_override_url_loading(
        r#"tealium://bgcolor?request={"config":{"response_id":"9"},"payload":{"color":"red"}}"#,
    );

    assert!(cancelled);
    assert_eq!(
        running.factory.scripts().last().map(String::as_str),
        Some(
            r#"try { utag.mobile.remote_api.response["bgcolor"]["9"](200, "set \"red\""); } catch (err) { console.error(err); }"#
        )
    );
}

#[rstest]
fn unknown_page_command_is_answered_with_not_found(running: Running) {
    let client = running.factory.client();

    client.should_override_url_loading(
        r#"tealium://missing?request={"config":{"response_id":"3"},"payload":{}}"#,
    );

    let last = running.factory.scripts().pop().expect("answer script");
    assert!(last.contains(r#"["missing"]["3"](404, "#));
}

#[rstest]
fn injected_metadata_is_recorded(running: Running) {
    let client = running.factory.client();
    client.on_page_finished(PAGE);
    assert!(
        running
            .factory
            .scripts()
            .iter()
            .any(|script| script.contains("tealium://_config"))
    );

    client.should_override_url_loading(
        "tealium://_config?request=%7B%22payload%22%3A%7B%22trace_id%22%3A%22t-42%22%7D%7D",
    );

    assert_eq!(running.sdk.tag_metadata().trace_id(), Some("t-42"));
    assert_eq!(
        running.sdk.tag_management().map(|surface| surface.state()),
        Some(SurfaceState::Loaded)
    );
}

#[rstest]
fn settings_updates_reach_surface(running: Running) {
    running.sdk.update_settings(LibrarySettings {
        wifi_only: true,
        refresh_interval_secs: 120,
    });

    let controller = running.sdk.tag_management().expect("surface running");
    assert!(controller.wifi_only());
    assert_eq!(controller.refresh_interval().as_secs(), 120);
    assert_eq!(running.sdk.settings().current().refresh_interval_secs, 120);
}
