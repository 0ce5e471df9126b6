//! The full-screen, override-redirect window the lock draws into.

use crate::atoms::{self, NET_WM_BYPASS_COMPOSITOR};
use crate::color::color_pixel;
use crate::display::{ColormapId, Resolution, WindowId, atom, event_mask};
use crate::error::{Error, Result, first_error};
use crate::server::{PropertyData, WindowAttributes, WindowRequest, XServer};

/// Name and class set on the lock window.
pub const WINDOW_NAME: &str = "xlockd";

/// Events the lock window listens for.
pub const OVERLAY_EVENT_MASK: u32 = event_mask::EXPOSURE
    | event_mask::KEY_PRESS
    | event_mask::KEY_RELEASE
    | event_mask::VISIBILITY_CHANGE
    | event_mask::STRUCTURE_NOTIFY
    | event_mask::BUTTON_PRESS;

/// A mapped lock window and the resources it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayWindow {
    pub window: WindowId,
    pub colormap: ColormapId,
    /// Root window, or the compositor overlay window when one was granted.
    pub parent: WindowId,
    pub resolution: Resolution,
}

/// Create, map and raise the lock window.
///
/// The window uses a 32-bit visual so compositors can blend it; a screen
/// without one is a fatal [`Error::NoVisual`]. With `composite` set the
/// window is parented to the compositor overlay window when the server
/// grants one, and to the root window otherwise. Returns only after a
/// round-trip has confirmed the window exists. If any step after creation
/// fails, the window is destroyed and its colormap freed before the error
/// is returned.
pub fn open_fullscreen_window<S: XServer + ?Sized>(
    conn: &S,
    resolution: Resolution,
    color: &str,
    composite: bool,
) -> Result<OverlayWindow> {
    let background_pixel = color_pixel(color)?;
    let screen = conn.screen();
    let root = screen.root;

    let parent = if composite {
        compositor_overlay(conn, root).unwrap_or(root)
    } else {
        root
    };

    let visual = screen.visual_by_depth(32).ok_or(Error::NoVisual(32))?.id;
    let colormap = conn.create_colormap(root, visual)?;

    let request = WindowRequest {
        parent,
        depth: 32,
        visual,
        x: 0,
        y: 0,
        size: resolution,
        border_width: 0,
        attributes: WindowAttributes {
            background_pixel,
            border_pixel: 0,
            override_redirect: true,
            event_mask: OVERLAY_EVENT_MASK,
            colormap,
        },
    };
    let window = match conn.create_window(&request) {
        Ok(window) => window,
        Err(e) => {
            if let Err(free) = conn.free_colormap(colormap) {
                log::warn!("could not free colormap 0x{:x}: {}", colormap, free);
            }
            return Err(e);
        }
    };

    let overlay = OverlayWindow {
        window,
        colormap,
        parent,
        resolution,
    };
    if let Err(e) = show(conn, window) {
        if let Err(cleanup) = close_window(conn, &overlay) {
            log::warn!("could not remove half-set-up lock window: {}", cleanup);
        }
        return Err(e);
    }

    log::debug!(
        "lock window 0x{:x} mapped on 0x{:x} ({}x{})",
        window,
        parent,
        resolution.width,
        resolution.height
    );
    Ok(overlay)
}

/// Name the window, map it above everything and wait for the server.
fn show<S: XServer + ?Sized>(conn: &S, window: WindowId) -> Result<()> {
    conn.change_property(
        window,
        atom::WM_NAME,
        atom::STRING,
        PropertyData::Bytes(WINDOW_NAME.as_bytes().to_vec()),
    )?;
    conn.change_property(
        window,
        atom::WM_CLASS,
        atom::STRING,
        PropertyData::Bytes(wm_class(WINDOW_NAME)),
    )?;

    match atoms::resolve(conn, NET_WM_BYPASS_COMPOSITOR) {
        Some(bypass) => {
            conn.change_property(window, bypass, atom::CARDINAL, PropertyData::Cardinals(vec![1]))?
        }
        None => log::warn!("compositor bypass hint not set on lock window"),
    }

    conn.map_window(window)?;
    conn.raise_window(window)?;
    conn.sync()
}

/// Destroy the lock window and free its colormap.
///
/// Every step is attempted; the first failure is returned.
pub fn close_window<S: XServer + ?Sized>(conn: &S, overlay: &OverlayWindow) -> Result<()> {
    first_error([
        conn.destroy_window(overlay.window),
        conn.free_colormap(overlay.colormap),
        conn.flush(),
    ])
}

fn compositor_overlay<S: XServer + ?Sized>(conn: &S, root: WindowId) -> Option<WindowId> {
    match conn.composite_overlay_window(root) {
        Ok(Some(overlay)) => Some(overlay),
        Ok(None) => {
            log::debug!("composite extension not present, using root window");
            None
        }
        Err(e) => {
            log::warn!("compositor overlay window unavailable: {}", e);
            None
        }
    }
}

/// `WM_CLASS` value: instance and class, each NUL-terminated.
fn wm_class(name: &str) -> Vec<u8> {
    let mut class = Vec::with_capacity(2 * (name.len() + 1));
    for _ in 0..2 {
        class.extend_from_slice(name.as_bytes());
        class.push(0);
    }
    class
}
