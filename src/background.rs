//! Background pixmaps: a solid fill, or a snapshot of the desktop.

use crate::color::color_pixel;
use crate::display::{PixmapId, Resolution, Xid};
use crate::error::Result;
use crate::server::{GcValues, XServer};

/// A 32-bit pixmap filled with `color`, for pictures smaller than the screen.
pub fn create_bg_pixmap<S: XServer + ?Sized>(
    conn: &S,
    drawable: Xid,
    resolution: Resolution,
    color: &str,
) -> Result<PixmapId> {
    let foreground = color_pixel(color)?;
    let pixmap = conn.create_pixmap(drawable, 32, resolution)?;
    fill(
        conn,
        pixmap,
        resolution,
        GcValues {
            foreground,
            include_inferiors: false,
        },
        None,
    )?;
    Ok(pixmap)
}

/// Copy what the root window currently shows into a new pixmap.
///
/// Must run before the lock window is mapped, or the snapshot shows the
/// lock window itself.
pub fn capture_bg_pixmap<S: XServer + ?Sized>(conn: &S, resolution: Resolution) -> Result<PixmapId> {
    let screen = conn.screen();
    let pixmap = conn.create_pixmap(screen.root, screen.root_depth, resolution)?;
    fill(
        conn,
        pixmap,
        resolution,
        GcValues {
            foreground: screen.black_pixel,
            include_inferiors: true,
        },
        Some(screen.root),
    )?;
    log::debug!("captured desktop into pixmap 0x{:x}", pixmap);
    Ok(pixmap)
}

/// Fill `pixmap`, then optionally copy `source` over it, with a scratch GC.
fn fill<S: XServer + ?Sized>(
    conn: &S,
    pixmap: PixmapId,
    resolution: Resolution,
    values: GcValues,
    source: Option<Xid>,
) -> Result<()> {
    let gc = conn.create_gc(pixmap, values)?;
    let drawn = conn.fill_rectangle(pixmap, gc, resolution).and_then(|()| {
        if let Some(source) = source {
            conn.copy_area(source, pixmap, gc, resolution)?;
            conn.flush()?;
        }
        Ok(())
    });
    conn.free_gc(gc)?;
    drawn
}
