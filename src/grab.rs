//! Exclusive pointer and keyboard grabs.
//!
//! Another client (usually the window manager, or a menu that is still
//! open) may hold a grab when the lock starts. Each grab is therefore
//! retried for a bounded number of tries with a short sleep in between.
//! Some window managers only stack the lock window on top once it is
//! redrawn, so a loop that keeps failing for longer than
//! [`GrabPolicy::redraw_after`] asks the caller to redraw once.

use crate::display::{CursorId, event_mask};
use crate::error::{Result, first_error};
use crate::server::{GrabStatus, XServer};
use std::time::{Duration, Instant};

/// Trait for redrawing the lock screen while grabs are retried.
pub trait RedrawHandler {
    /// Repaint the lock window.
    fn redraw_screen(&mut self);
}

/// Implement RedrawHandler for closures.
impl<F> RedrawHandler for F
where
    F: FnMut(),
{
    fn redraw_screen(&mut self) {
        self()
    }
}

/// Timing of the retry loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabPolicy {
    /// Pause after every failed attempt.
    pub retry_delay: Duration,
    /// Elapsed time after which a stalled loop triggers a redraw.
    pub redraw_after: Duration,
}

impl Default for GrabPolicy {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_micros(50),
            redraw_after: Duration::from_millis(100),
        }
    }
}

/// Outcome of one retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabAttempt {
    pub grabbed: bool,
    pub tries_left: u32,
}

/// How much of the input the lock holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabState {
    NotGrabbed,
    /// The pointer is held but the keyboard grab failed.
    PointerGrabbed,
    FullyGrabbed,
}

impl GrabState {
    /// Combine the two loops: both have to succeed.
    pub fn from_attempts(pointer: GrabAttempt, keyboard: Option<GrabAttempt>) -> Self {
        match (pointer.grabbed, keyboard.is_some_and(|k| k.grabbed)) {
            (true, true) => GrabState::FullyGrabbed,
            (true, false) => GrabState::PointerGrabbed,
            (false, _) => GrabState::NotGrabbed,
        }
    }

    pub fn is_fully_grabbed(self) -> bool {
        self == GrabState::FullyGrabbed
    }
}

/// Retry `attempt` up to `max_tries` times.
fn retry<R: RedrawHandler + ?Sized>(
    what: &str,
    max_tries: u32,
    policy: &GrabPolicy,
    redraw: &mut R,
    mut attempt: impl FnMut() -> bool,
) -> GrabAttempt {
    let start = Instant::now();
    let mut redrawn = false;
    let mut tries = max_tries;

    while tries > 0 {
        tries -= 1;
        if attempt() {
            log::debug!("{} grabbed after {} tries", what, max_tries - tries);
            return GrabAttempt {
                grabbed: true,
                tries_left: tries,
            };
        }

        std::thread::sleep(policy.retry_delay);

        if !redrawn && tries % 100 == 0 && start.elapsed() >= policy.redraw_after {
            log::debug!("{} grab stalled, redrawing", what);
            redraw.redraw_screen();
            redrawn = true;
        }
    }

    log::debug!("{} grab failed after {} tries", what, max_tries);
    GrabAttempt {
        grabbed: false,
        tries_left: 0,
    }
}

/// Retry an exclusive pointer grab on the root window.
///
/// Only button presses are selected and the pointer is not confined.
pub fn grab_pointer<S, R>(
    conn: &S,
    cursor: CursorId,
    max_tries: u32,
    policy: &GrabPolicy,
    redraw: &mut R,
) -> GrabAttempt
where
    S: XServer + ?Sized,
    R: RedrawHandler + ?Sized,
{
    let root = conn.screen().root;
    retry("pointer", max_tries, policy, redraw, || {
        matches!(
            conn.grab_pointer(root, event_mask::BUTTON_PRESS, cursor),
            Ok(GrabStatus::Success)
        )
    })
}

/// Retry an exclusive keyboard grab on the root window, reporting events.
pub fn grab_keyboard<S, R>(
    conn: &S,
    max_tries: u32,
    policy: &GrabPolicy,
    redraw: &mut R,
) -> GrabAttempt
where
    S: XServer + ?Sized,
    R: RedrawHandler + ?Sized,
{
    let root = conn.screen().root;
    retry("keyboard", max_tries, policy, redraw, || {
        matches!(conn.grab_keyboard(root, true), Ok(GrabStatus::Success))
    })
}

/// Grab the pointer, then the keyboard, each with its own budget of
/// `max_tries`.
///
/// The keyboard is only tried once the pointer is held. A
/// [`GrabState::PointerGrabbed`] result leaves the pointer grabbed; the
/// caller decides whether to retry or release it.
pub fn grab_pointer_and_keyboard<S, R>(
    conn: &S,
    cursor: CursorId,
    max_tries: u32,
    policy: &GrabPolicy,
    redraw: &mut R,
) -> GrabState
where
    S: XServer + ?Sized,
    R: RedrawHandler + ?Sized,
{
    let pointer = grab_pointer(conn, cursor, max_tries, policy, redraw);
    let keyboard = pointer
        .grabbed
        .then(|| grab_keyboard(conn, max_tries, policy, redraw));
    GrabState::from_attempts(pointer, keyboard)
}

/// Release both grabs.
///
/// The pointer is released even when releasing the keyboard fails.
pub fn release_grab<S: XServer + ?Sized>(conn: &S) -> Result<()> {
    first_error([conn.ungrab_keyboard(), conn.ungrab_pointer(), conn.flush()])
}
