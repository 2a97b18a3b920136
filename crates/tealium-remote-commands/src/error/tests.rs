//! Unit tests for remote-command error types.

use rstest::rstest;

use super::*;

#[test]
fn already_registered_message_includes_name() {
    let error = CommandError::AlreadyRegistered {
        name: "firebase".into(),
    };
    let message = error.to_string();
    assert!(message.contains("firebase"), "expected name in message: {message}");
    assert!(
        message.contains("already registered"),
        "expected reason in message: {message}"
    );
}

#[rstest]
#[case::reserved(CommandError::ReservedName { name: "_config".into() }, "_config")]
#[case::invocation(CommandError::invocation("appsflyer", "sdk not started"), "sdk not started")]
#[case::asset_dir(
    CommandError::MissingAssetDirectory { name: "x".into(), filename: "x.json".into() },
    "x.json"
)]
fn messages_carry_context(#[case] error: CommandError, #[case] needle: &str) {
    let message = error.to_string();
    assert!(message.contains(needle), "expected '{needle}' in: {message}");
}

#[test]
fn malformed_error_keeps_parser_message() {
    let parse_error = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
    let error = ConfigError::malformed("remotecommand.json", &parse_error);
    let message = error.to_string();
    assert!(message.contains("remotecommand.json"));
    assert!(message.contains("EOF"), "expected parser detail in: {message}");
}
