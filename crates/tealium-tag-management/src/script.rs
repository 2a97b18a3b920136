//! Scripts evaluated inside the tag-management page.

use serde_json::Value;
use tealium_remote_commands::Response;

/// Builds the script that reports page metadata through the `_config`
/// bridge command.
///
/// The script reads the publish stamp embedded in the page's leading comment
/// (`ut4.<n>.<yyyyMMddHHmm>`) and the `trace_id` cookie, then navigates to
/// `<scheme>://_config?request=<json>`.
pub(crate) fn config_extraction_script(scheme: &str) -> String {
    format!(
        r#"(function(){{
    var payload = {{}};
    try {{
        var ts = new RegExp("ut[0-9]+\\.[0-9]+\\.[0-9]{{12}}").exec(document.childNodes[0].textContent)[0];
        ts = ts.substring(ts.length - 12, ts.length);
        var t = Date.UTC(+ts.substring(0, 4), +ts.substring(4, 6) - 1, +ts.substring(6, 8), +ts.substring(8, 10), +ts.substring(10, 12));
        if (!isNaN(t)) {{
            payload.published = t;
        }}
    }} catch (e) {{}}
    var f = document.cookie.indexOf('trace_id=');
    if (f >= 0) {{
        payload.trace_id = document.cookie.substring(f + 9).split(';')[0];
    }}
    window.open('{scheme}://_config?request=' + encodeURIComponent(JSON.stringify({{ payload: payload }})), '_self');
}})()"#
    )
}

/// Builds the script that hands `response` to the page's callback registry.
///
/// Returns `None` when the page did not ask for an answer.
pub(crate) fn response_script(response: &Response) -> Option<String> {
    let response_id = response.response_id()?;
    let command = Value::String(response.command_name().to_owned());
    let id = Value::String(response_id.to_owned());
    let body = response
        .body()
        .map_or(Value::Null, |body| Value::String(body.to_owned()));
    let status = response.status();
    Some(format!(
        "try {{ utag.mobile.remote_api.response[{command}][{id}]({status}, {body}); }} catch (err) {{ console.error(err); }}"
    ))
}
