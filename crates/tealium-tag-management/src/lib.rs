//! Embedded tag-management surface.
//!
//! The tag-management page runs inside an off-screen web surface. Scripts on
//! that page invoke native remote commands by navigating to bridge URLs,
//! which [`EmbeddedSurfaceController`] intercepts and forwards. Platform
//! bindings supply the surface through [`SurfaceFactory`], connectivity
//! through [`Connectivity`], and the surface-owning context through
//! [`MainExecutor`].

mod clock;
mod connectivity;
mod controller;
mod error;
mod executor;
mod script;
mod state;
mod surface;

pub use clock::{Clock, SystemClock};
pub use connectivity::{AlwaysConnected, Connectivity};
pub use controller::{
    CACHE_BUSTER_PARAM, EmbeddedSurfaceController, LoadAttempt, RemoteCommandSender,
    SurfaceClient, SurfaceCollaborators,
};
pub use error::{LoadFailure, SurfaceError};
pub use executor::{MainExecutor, Task, ThreadExecutor};
pub use state::SurfaceState;
pub use surface::{ConsoleLevel, InterceptedResponse, SurfaceFactory, SurfaceSettings, WebSurface};
