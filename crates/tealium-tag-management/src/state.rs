//! Load state of the embedded surface.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SurfaceState {
    /// No load has been attempted.
    Unloaded = 0,
    /// A navigation is in flight.
    Loading = 1,
    /// The page finished loading.
    Loaded = 2,
    /// The last load failed or the renderer crashed.
    Error = 3,
}

impl SurfaceState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Loading,
            2 => Self::Loaded,
            3 => Self::Error,
            _ => Self::Unloaded,
        }
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomically guarded [`SurfaceState`].
///
/// All transitions are single atomic operations so concurrent callers cannot
/// both start a load.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(SurfaceState::Unloaded as u8))
    }

    pub(crate) fn get(&self) -> SurfaceState {
        SurfaceState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `Loading` unless a load is already in flight.
    ///
    /// Returns the previous state on success.
    pub(crate) fn try_begin_load(&self) -> Option<SurfaceState> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != SurfaceState::Loading as u8).then_some(SurfaceState::Loading as u8)
            })
            .ok()
            .map(SurfaceState::from_u8)
    }

    /// Marks the page as finished. An earlier failure is kept.
    ///
    /// Returns the previous state.
    pub(crate) fn complete_load(&self) -> SurfaceState {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != SurfaceState::Error as u8).then_some(SurfaceState::Loaded as u8)
            })
            .unwrap_or_else(|current| current);
        SurfaceState::from_u8(previous)
    }

    /// Moves to `Error`, returning the previous state.
    pub(crate) fn fail(&self) -> SurfaceState {
        SurfaceState::from_u8(self.0.swap(SurfaceState::Error as u8, Ordering::AcqRel))
    }

    /// Drops an in-flight load whose surface is being replaced. Other states
    /// are kept.
    ///
    /// Returns the previous state.
    pub(crate) fn abandon_load(&self) -> SurfaceState {
        let previous = self
            .0
            .compare_exchange(
                SurfaceState::Loading as u8,
                SurfaceState::Unloaded as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .unwrap_or_else(|current| current);
        SurfaceState::from_u8(previous)
    }

    /// Returns to `Unloaded`, returning the previous state.
    pub(crate) fn reset(&self) -> SurfaceState {
        SurfaceState::from_u8(self.0.swap(SurfaceState::Unloaded as u8, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn cell_in(state: SurfaceState) -> StateCell {
        let cell = StateCell::new();
        match state {
            SurfaceState::Unloaded => {}
            SurfaceState::Loading => {
                cell.try_begin_load();
            }
            SurfaceState::Loaded => {
                cell.try_begin_load();
                cell.complete_load();
            }
            SurfaceState::Error => {
                cell.fail();
            }
        }
        assert_eq!(cell.get(), state);
        cell
    }

    #[rstest]
    #[case(SurfaceState::Unloaded, Some(SurfaceState::Unloaded))]
    #[case(SurfaceState::Loading, None)]
    #[case(SurfaceState::Loaded, Some(SurfaceState::Loaded))]
    #[case(SurfaceState::Error, Some(SurfaceState::Error))]
    fn begin_load_refuses_only_while_loading(
        #[case] start: SurfaceState,
        #[case] expected: Option<SurfaceState>,
    ) {
        let cell = cell_in(start);

        assert_eq!(cell.try_begin_load(), expected);
        assert_eq!(cell.get(), SurfaceState::Loading);
    }

    #[test]
    fn completion_after_failure_keeps_error() {
        let cell = cell_in(SurfaceState::Error);

        assert_eq!(cell.complete_load(), SurfaceState::Error);
        assert_eq!(cell.get(), SurfaceState::Error);
    }

    #[test]
    fn fail_reports_previous_state() {
        let cell = cell_in(SurfaceState::Loading);

        assert_eq!(cell.fail(), SurfaceState::Loading);
        assert_eq!(cell.fail(), SurfaceState::Error);
    }

    #[rstest]
    #[case(SurfaceState::Unloaded, SurfaceState::Unloaded)]
    #[case(SurfaceState::Loading, SurfaceState::Unloaded)]
    #[case(SurfaceState::Loaded, SurfaceState::Loaded)]
    #[case(SurfaceState::Error, SurfaceState::Error)]
    fn abandon_clears_only_loading(#[case] start: SurfaceState, #[case] expected: SurfaceState) {
        let cell = cell_in(start);

        assert_eq!(cell.abandon_load(), start);
        assert_eq!(cell.get(), expected);
    }

    #[test]
    fn reset_returns_to_unloaded() {
        let cell = cell_in(SurfaceState::Loaded);

        assert_eq!(cell.reset(), SurfaceState::Loaded);
        assert_eq!(cell.get(), SurfaceState::Unloaded);
    }

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(SurfaceState::Loaded.to_string(), "loaded");
    }
}
