//! Remote command model for the dispatch layer.
//!
//! A *remote command* is a named handler for a vendor integration. Events
//! reach it in one of two ways: the dispatcher maps an analytics event's flat
//! payload through the command's lookup table, or script running in the
//! tag-management surface names the command in a bridge URL. Either way the
//! command receives a [`Response`] carrying the request payload and, for
//! bridge invocations, a handler that answers the calling script.
//!
//! This crate holds the pieces both paths share:
//!
//! - [`mapper`]: the pure lookup-table payload transformation;
//! - [`RemoteCommand`] and [`Response`]: the invocation contract;
//! - [`CommandConfig`], [`CommandConfigSource`], and [`ConfigRetriever`]:
//!   per-command configuration and its lazy, cached retrieval;
//! - [`CommandRegistry`]: registration and lookup in registration order.

mod command;
mod config;
pub mod error;
pub mod mapper;
pub mod registry;
mod response;
mod retriever;
mod source;

/// Flat or nested key/value payload.
pub type Payload = serde_json::Map<String, serde_json::Value>;

pub use self::command::{RemoteCommand, RemoteCommandFn};
pub use self::config::CommandConfig;
pub use self::error::{CommandError, ConfigError};
pub use self::mapper::{COMMAND_NAME_KEY, EVENT_NAME_KEY, LookupTable, map_payload};
pub use self::registry::{CONFIG_COMMAND, CommandKind, CommandRegistry, RegisteredCommand};
pub use self::response::{
    RESPONSE_ID_KEY, Response, ResponseHandler, STATUS_BAD_REQUEST, STATUS_NOT_FOUND, STATUS_OK,
    STATUS_SERVER_ERROR,
};
pub use self::retriever::ConfigRetriever;
pub use self::source::{AssetConfigSource, CommandConfigSource, StaticConfigSource};
