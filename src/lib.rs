//! # xlockd
//!
//! Input capture and display core for an X11 screen locker.
//!
//! The lock covers the screen with an opaque override-redirect window (on
//! the compositor overlay when one is available) and takes exclusive
//! pointer and keyboard grabs, retrying while other clients still hold
//! them. Password handling and drawing the unlock indicator are left to
//! the surrounding program.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xlockd::{GrabPolicy, LockOptions, LockSession, XlibConnection};
//!
//! let conn = XlibConnection::open().expect("Failed to open display");
//! let options = LockOptions::default();
//!
//! let lock = LockSession::lock(&conn, &options, &GrabPolicy::default(), &mut || {
//!     // repaint the lock screen
//! })
//! .expect("Failed to lock");
//!
//! // ... authenticate ...
//!
//! lock.unlock().expect("Failed to unlock");
//! ```
//!
//! ## Architecture
//!
//! Every component is written against the [`XServer`] trait, one method
//! per X request. [`XlibConnection`] implements it on a live display.
//! Locking happens in a fixed order: the desktop snapshot is taken before
//! the lock window exists, and the window is mapped and confirmed with a
//! round-trip before the first grab attempt.

pub mod atoms;
pub mod background;
pub mod color;
pub mod cursor;
pub mod display;
pub mod error;
pub mod focus;
pub mod grab;
pub mod keyboard;
pub mod server;
pub mod session;
pub mod window;

mod platform;

#[cfg(test)]
mod testing;

// Re-exports
pub use background::{capture_bg_pixmap, create_bg_pixmap};
pub use color::{Rgba, color_pixel};
pub use cursor::{CursorVariant, create_cursor};
pub use display::{NONE, Resolution, Screen};
pub use error::{Error, Result};
pub use focus::{find_focused_window, set_focused_window};
pub use grab::{
    GrabAttempt, GrabPolicy, GrabState, RedrawHandler, grab_pointer_and_keyboard, release_grab,
};
pub use keyboard::current_layout_group;
pub use server::XServer;
pub use session::{LockOptions, LockSession};
pub use window::{OverlayWindow, close_window, open_fullscreen_window};

#[cfg(all(target_os = "linux", feature = "x11"))]
pub use platform::XlibConnection;
