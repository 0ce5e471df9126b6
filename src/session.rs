//! Taking and releasing the lock as one sequence.

use crate::background::capture_bg_pixmap;
use crate::cursor::{CursorVariant, create_cursor};
use crate::display::{CursorId, NONE, PixmapId, WindowId};
use crate::error::{Error, Result, first_error};
use crate::focus::{find_focused_window, set_focused_window};
use crate::grab::{GrabPolicy, GrabState, RedrawHandler, grab_pointer_and_keyboard, release_grab};
use crate::server::XServer;
use crate::window::{OverlayWindow, close_window, open_fullscreen_window};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings supplied by the surrounding program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LockOptions {
    /// Lock window background as `rrggbbaa`.
    pub color: String,
    /// Parent the lock window to the compositor overlay when available.
    pub composite: bool,
    /// Emit diagnostics.
    pub debug: bool,
    /// Cursor shown while the pointer is grabbed.
    pub cursor: CursorVariant,
    /// Budget for each of the pointer and keyboard grab loops.
    pub grab_tries: u32,
    /// Snapshot the desktop before the lock window covers it.
    pub capture_background: bool,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            color: "ffffffff".to_string(),
            composite: true,
            debug: false,
            cursor: CursorVariant::Invisible,
            grab_tries: 10000,
            capture_background: false,
        }
    }
}

/// A held lock: the mapped window, the cursor, and both input grabs.
///
/// Dropping it without [`LockSession::unlock`] leaves the screen locked
/// until the connection closes.
#[derive(Debug)]
pub struct LockSession<'a, S: XServer + ?Sized> {
    conn: &'a S,
    overlay: OverlayWindow,
    cursor: CursorId,
    background: Option<PixmapId>,
    saved_focus: WindowId,
}

impl<'a, S: XServer + ?Sized> LockSession<'a, S> {
    /// Cover the screen and take both grabs.
    ///
    /// The desktop snapshot, when requested, is taken before the lock
    /// window exists. If the grabs cannot both be taken, everything created
    /// so far is released and [`Error::GrabFailed`] is returned.
    pub fn lock<R: RedrawHandler + ?Sized>(
        conn: &'a S,
        options: &LockOptions,
        policy: &GrabPolicy,
        redraw: &mut R,
    ) -> Result<Self> {
        let screen = conn.screen();
        let root = screen.root;
        let resolution = screen.resolution();

        let saved_focus = find_focused_window(conn, root);
        if options.debug {
            log::debug!("focused window before locking: 0x{:x}", saved_focus);
        }

        let background = if options.capture_background {
            Some(capture_bg_pixmap(conn, resolution)?)
        } else {
            None
        };

        let overlay =
            match open_fullscreen_window(conn, resolution, &options.color, options.composite) {
                Ok(overlay) => overlay,
                Err(e) => {
                    if let Some(pixmap) = background {
                        if let Err(free) = conn.free_pixmap(pixmap) {
                            log::warn!("could not free background snapshot: {}", free);
                        }
                    }
                    return Err(e);
                }
            };

        let mut session = Self {
            conn,
            overlay,
            cursor: NONE,
            background,
            saved_focus,
        };

        session.cursor = match create_cursor(conn, overlay.window, options.cursor) {
            Ok(cursor) => cursor,
            Err(e) => {
                session.abandon();
                return Err(e);
            }
        };

        let state = grab_pointer_and_keyboard(conn, session.cursor, options.grab_tries, policy, redraw);
        if !state.is_fully_grabbed() {
            if state == GrabState::PointerGrabbed {
                if let Err(e) = conn.ungrab_pointer() {
                    log::warn!("could not release pointer grab: {}", e);
                }
            }
            session.abandon();
            return Err(Error::GrabFailed(state));
        }

        log::info!("screen locked");
        Ok(session)
    }

    /// The lock window.
    pub fn window(&self) -> &OverlayWindow {
        &self.overlay
    }

    /// Snapshot of the desktop taken before locking, if requested.
    pub fn background(&self) -> Option<PixmapId> {
        self.background
    }

    /// The window that had focus before locking.
    pub fn saved_focus(&self) -> WindowId {
        self.saved_focus
    }

    /// Release the grabs, free every resource, and give focus back.
    ///
    /// Every step is attempted even when an earlier one fails; the first
    /// failure is returned.
    pub fn unlock(self) -> Result<()> {
        let ungrabbed = release_grab(self.conn);
        let released = self.release();
        let refocused = match self.saved_focus {
            NONE => Ok(()),
            focus => set_focused_window(self.conn, self.conn.screen().root, focus),
        };
        first_error([ungrabbed, released, refocused])?;
        log::info!("screen unlocked");
        Ok(())
    }

    fn release(&self) -> Result<()> {
        let closed = close_window(self.conn, &self.overlay);
        let free_cursor = match self.cursor {
            NONE => Ok(()),
            cursor => self.conn.free_cursor(cursor),
        };
        let free_background = match self.background {
            Some(pixmap) => self.conn.free_pixmap(pixmap),
            None => Ok(()),
        };
        first_error([closed, free_cursor, free_background, self.conn.flush()])
    }

    /// Undo a lock that could not be completed.
    fn abandon(&self) {
        if let Err(e) = self.release() {
            log::warn!("could not release partial lock: {}", e);
        }
    }
}
