//! Screen description and resource identifiers.

/// Server-side resource id (window, pixmap, cursor, colormap, gc).
pub type Xid = u32;
/// Window id.
pub type WindowId = Xid;
/// Pixmap id.
pub type PixmapId = Xid;
/// Cursor id.
pub type CursorId = Xid;
/// Colormap id.
pub type ColormapId = Xid;
/// Graphics context id.
pub type GcId = Xid;
/// Visual id.
pub type VisualId = u32;
/// Interned atom.
pub type Atom = u32;

/// The "no resource" sentinel (`None` in the X protocol).
pub const NONE: Xid = 0;

/// Predefined atoms used by the core.
pub mod atom {
    use super::Atom;

    pub const CARDINAL: Atom = 6;
    pub const STRING: Atom = 31;
    pub const WINDOW: Atom = 33;
    pub const WM_CLASS: Atom = 67;
    pub const WM_NAME: Atom = 39;
}

/// Core protocol event mask bits.
pub mod event_mask {
    pub const KEY_PRESS: u32 = 1 << 0;
    pub const KEY_RELEASE: u32 = 1 << 1;
    pub const BUTTON_PRESS: u32 = 1 << 2;
    pub const EXPOSURE: u32 = 1 << 15;
    pub const VISIBILITY_CHANGE: u32 = 1 << 16;
    pub const STRUCTURE_NOTIFY: u32 = 1 << 17;
    pub const SUBSTRUCTURE_REDIRECT: u32 = 1 << 20;
}

/// Width and height of a drawable in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A visual advertised by the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visual {
    /// Visual id.
    pub id: VisualId,
    /// Visual class (`TrueColor` = 4, `DirectColor` = 5, ...).
    pub class: u8,
    /// Significant bits per color channel.
    pub bits_per_rgb: u8,
}

/// All visuals the screen supports at one depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depth {
    pub depth: u8,
    pub visuals: Vec<Visual>,
}

/// The screen the lock is shown on.
///
/// Discovered once when the connection opens and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Root window of the screen.
    pub root: WindowId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth of the root window.
    pub root_depth: u8,
    /// Visual of the root window.
    pub root_visual: VisualId,
    /// Pixel value for black in the default colormap.
    pub black_pixel: u32,
    /// Pixel value for white in the default colormap.
    pub white_pixel: u32,
    /// Advertised depth/visual list.
    pub allowed_depths: Vec<Depth>,
}

impl Screen {
    /// Full-screen resolution.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// First visual advertised at `depth`, skipping depths that list no visuals.
    pub fn visual_by_depth(&self, depth: u8) -> Option<&Visual> {
        self.allowed_depths
            .iter()
            .filter(|d| d.depth == depth)
            .find_map(|d| d.visuals.first())
    }

    /// Description of the root window's visual.
    pub fn root_visual_type(&self) -> Option<&Visual> {
        self.allowed_depths
            .iter()
            .flat_map(|d| d.visuals.iter())
            .find(|v| v.id == self.root_visual)
    }
}
