//! Pointer cursors shown while the lock holds the pointer grab.

use crate::display::{CursorId, NONE, Resolution, WindowId};
use crate::error::Result;
use crate::server::{Rgb16, XServer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which cursor to show over the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CursorVariant {
    /// No visible cursor.
    #[default]
    Invisible,
    /// Leave the current cursor alone.
    Unchanged,
    /// A classic arrow pointer.
    Arrow,
}

/// Monochrome cursor image: LSB-first rows padded to whole bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorBitmap {
    pub width: u32,
    pub height: u32,
    pub bits: &'static [u8],
    pub mask: &'static [u8],
}

static INVISIBLE_BITS: [u8; 8] = [0x00; 8];

static ARROW_BITS: [u8; 38] = [
    0xfe, 0x07, 0xfc, 0x07, 0xfa, 0x07, 0xf6, 0x07, 0xee, 0x07, 0xde, 0x07, 0xbe, 0x07, 0x7e,
    0x07, 0xfe, 0x06, 0xfe, 0x05, 0x3e, 0x00, 0xb6, 0x07, 0x6a, 0x07, 0x6c, 0x07, 0xde, 0x06,
    0xdf, 0x06, 0xbf, 0x05, 0xbf, 0x05, 0x7f, 0x06,
];

static ARROW_MASK: [u8; 38] = [
    0x01, 0x00, 0x03, 0x00, 0x07, 0x00, 0x0f, 0x00, 0x1f, 0x00, 0x3f, 0x00, 0x7f, 0x00, 0xff,
    0x00, 0xff, 0x01, 0xff, 0x03, 0xff, 0x07, 0x7f, 0x00, 0xf7, 0x00, 0xf3, 0x00, 0xe1, 0x01,
    0xe0, 0x01, 0xc0, 0x03, 0xc0, 0x03, 0x80, 0x01,
];

impl CursorVariant {
    /// The fixed image for this variant, `None` for [`CursorVariant::Unchanged`].
    pub fn bitmap(self) -> Option<CursorBitmap> {
        match self {
            CursorVariant::Invisible => Some(CursorBitmap {
                width: 8,
                height: 8,
                bits: &INVISIBLE_BITS,
                mask: &INVISIBLE_BITS,
            }),
            CursorVariant::Arrow => Some(CursorBitmap {
                width: 11,
                height: 19,
                bits: &ARROW_BITS,
                mask: &ARROW_MASK,
            }),
            CursorVariant::Unchanged => None,
        }
    }
}

/// Build the cursor for `variant`.
///
/// Returns [`NONE`] for [`CursorVariant::Unchanged`], which grabs keep the
/// current cursor for. The bitmap pixmaps are freed as soon as the cursor
/// holds them.
pub fn create_cursor<S: XServer + ?Sized>(
    conn: &S,
    window: WindowId,
    variant: CursorVariant,
) -> Result<CursorId> {
    let Some(image) = variant.bitmap() else {
        return Ok(NONE);
    };
    let size = Resolution::new(image.width, image.height);

    let bitmap = conn.create_bitmap(window, image.bits, size)?;
    let mask = match conn.create_bitmap(window, image.mask, size) {
        Ok(mask) => mask,
        Err(e) => {
            conn.free_pixmap(bitmap)?;
            return Err(e);
        }
    };

    let cursor = conn.create_cursor(bitmap, mask, Rgb16::WHITE, Rgb16::BLACK);

    conn.free_pixmap(bitmap)?;
    conn.free_pixmap(mask)?;

    let cursor = cursor?;
    log::debug!("created {:?} cursor 0x{:x}", variant, cursor);
    Ok(cursor)
}
