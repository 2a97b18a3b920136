//! Dispatch of tracked events and bridge URLs to remote commands.
//!
//! [`RemoteCommandDispatcher`] owns the command registry. Tracked calls
//! implementing [`Dispatch`] fan out to JSON-configured commands; bridge URLs
//! of the form `tealium://<command>?request=<json>` raised by the
//! tag-management page reach exactly one command and carry a handler used
//! to answer the page.

mod bridge;
mod dispatcher;
mod errors;
mod event;
mod metadata;

pub use bridge::{BRIDGE_SCHEME, BridgeInvocation, BridgeRequest, REQUEST_PARAM, is_bridge_url};
pub use dispatcher::{CommandOutcome, DispatchReport, InvocationStatus, RemoteCommandDispatcher};
pub use errors::DispatchError;
pub use event::{Dispatch, EVENT_TYPE_KEY, SCREEN_TITLE_KEY, TealiumEvent, TealiumView};
pub use metadata::TagMetadata;
