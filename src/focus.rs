//! Remembering and restoring the focused window across a lock.

use crate::atoms::{self, NET_ACTIVE_WINDOW};
use crate::display::{NONE, WindowId, atom, event_mask};
use crate::error::Result;
use crate::server::XServer;

/// Source indication for `_NET_ACTIVE_WINDOW` requests from a pager.
const SOURCE_PAGER: u32 = 2;

/// The window named by the root's `_NET_ACTIVE_WINDOW` property.
///
/// Returns [`NONE`] when the property is missing, empty, not of type
/// `WINDOW`, or cannot be read.
pub fn find_focused_window<S: XServer + ?Sized>(conn: &S, root: WindowId) -> WindowId {
    let Some(active_window) = atoms::resolve(conn, NET_ACTIVE_WINDOW) else {
        return NONE;
    };

    let reply = match conn.get_property(root, active_window, 1) {
        Ok(reply) => reply,
        Err(e) => {
            log::debug!("could not read active window: {}", e);
            return NONE;
        }
    };

    if reply.kind != atom::WINDOW || reply.format != 32 {
        return NONE;
    }
    reply.value.first().copied().unwrap_or(NONE)
}

/// Ask the window manager to focus `window` again.
pub fn set_focused_window<S: XServer + ?Sized>(
    conn: &S,
    root: WindowId,
    window: WindowId,
) -> Result<()> {
    let Some(active_window) = atoms::resolve(conn, NET_ACTIVE_WINDOW) else {
        log::warn!("cannot restore focus to 0x{:x}", window);
        return Ok(());
    };

    conn.send_client_message(
        root,
        window,
        active_window,
        [SOURCE_PAGER, 0, 0, 0, 0],
        event_mask::SUBSTRUCTURE_REDIRECT,
    )?;
    conn.flush()
}
