//! Cooperative pausing

/// Polled by long-running operations to decide whether to yield.
///
/// Any `FnMut() -> bool` closure is a pause indicator.
pub trait PauseIndicator {
    /// Return `true` to make the current operation return early; it can be
    /// resumed by calling its `continue_` method again.
    fn need_to_pause(&mut self) -> bool;
}

impl<F: FnMut() -> bool> PauseIndicator for F {
    fn need_to_pause(&mut self) -> bool {
        self()
    }
}

/// Rows processed between two pause checks.
pub const PAUSE_CHECK_ROWS: usize = 10;
