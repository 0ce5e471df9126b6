//! The request-level interface the lock core talks to.
//!
//! Every method maps to one X request (or one request/reply pair). The
//! Xlib backend in [`crate::platform`] implements it against a live
//! display; the core's components are written against this trait only.

use crate::atoms::AtomCache;
use crate::display::{
    Atom, ColormapId, CursorId, GcId, PixmapId, Resolution, Screen, VisualId, WindowId, Xid,
};
use crate::error::Result;

/// Status returned by `GrabPointer` / `GrabKeyboard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    Success,
    AlreadyGrabbed,
    InvalidTime,
    NotViewable,
    Frozen,
}

impl GrabStatus {
    /// Decode the protocol status byte.
    pub fn from_raw(status: u8) -> Self {
        match status {
            0 => GrabStatus::Success,
            1 => GrabStatus::AlreadyGrabbed,
            2 => GrabStatus::InvalidTime,
            3 => GrabStatus::NotViewable,
            _ => GrabStatus::Frozen,
        }
    }
}

/// Attributes applied atomically when a window is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub background_pixel: u32,
    pub border_pixel: u32,
    pub override_redirect: bool,
    pub event_mask: u32,
    pub colormap: ColormapId,
}

/// Parameters of a `CreateWindow` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    pub parent: WindowId,
    pub depth: u8,
    pub visual: VisualId,
    pub x: i16,
    pub y: i16,
    pub size: Resolution,
    pub border_width: u16,
    pub attributes: WindowAttributes,
}

/// Values for a graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcValues {
    pub foreground: u32,
    /// Draw through child windows (`IncludeInferiors` subwindow mode).
    pub include_inferiors: bool,
}

/// 16-bit-per-channel color, as used for cursor colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb16 {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb16 {
    pub const WHITE: Rgb16 = Rgb16 {
        red: 0xffff,
        green: 0xffff,
        blue: 0xffff,
    };
    pub const BLACK: Rgb16 = Rgb16 {
        red: 0,
        green: 0,
        blue: 0,
    };
}

/// Payload of a `ChangeProperty` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyData {
    /// Format 8.
    Bytes(Vec<u8>),
    /// Format 32.
    Cardinals(Vec<u32>),
}

/// Reply to a `GetProperty` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReply {
    /// Actual type of the property, `NONE` when it does not exist.
    pub kind: Atom,
    /// 8, 16 or 32, 0 when the property does not exist.
    pub format: u8,
    /// Values widened to 32 bits.
    pub value: Vec<u32>,
}

/// A connection to an X server, seen one request at a time.
///
/// Implementations are single-threaded: a request that expects a reply
/// blocks until that reply arrives.
pub trait XServer {
    /// The screen the connection was opened on.
    fn screen(&self) -> &Screen;

    /// Cache of atoms resolved on this connection.
    fn atoms(&self) -> &AtomCache;

    /// `InternAtom` without `only_if_exists`.
    fn intern_atom(&self, name: &str) -> Result<Atom>;

    /// `GetAtomName`.
    fn atom_name(&self, atom: Atom) -> Result<String>;

    /// Query the composite extension and, if present, ask for the
    /// compositor overlay window of `root`. `Ok(None)` when the extension
    /// is absent.
    fn composite_overlay_window(&self, root: WindowId) -> Result<Option<WindowId>>;

    fn create_colormap(&self, window: WindowId, visual: VisualId) -> Result<ColormapId>;
    fn free_colormap(&self, colormap: ColormapId) -> Result<()>;

    fn create_window(&self, request: &WindowRequest) -> Result<WindowId>;
    fn change_property(
        &self,
        window: WindowId,
        property: Atom,
        kind: Atom,
        data: PropertyData,
    ) -> Result<()>;
    /// `GetProperty` of at most `long_length` 32-bit words, any type.
    fn get_property(
        &self,
        window: WindowId,
        property: Atom,
        long_length: u32,
    ) -> Result<PropertyReply>;
    fn map_window(&self, window: WindowId) -> Result<()>;
    /// `ConfigureWindow` with stack mode `Above`.
    fn raise_window(&self, window: WindowId) -> Result<()>;
    fn destroy_window(&self, window: WindowId) -> Result<()>;

    /// Exclusive, asynchronous pointer grab on `grab_window`, not confined.
    fn grab_pointer(&self, grab_window: WindowId, event_mask: u32, cursor: CursorId)
    -> Result<GrabStatus>;
    /// Exclusive, asynchronous keyboard grab on `grab_window`.
    fn grab_keyboard(&self, grab_window: WindowId, owner_events: bool) -> Result<GrabStatus>;
    fn ungrab_pointer(&self) -> Result<()>;
    fn ungrab_keyboard(&self) -> Result<()>;

    /// Depth-1 pixmap from LSB-first bitmap rows padded to a byte.
    fn create_bitmap(&self, drawable: Xid, bits: &[u8], size: Resolution) -> Result<PixmapId>;
    fn create_pixmap(&self, drawable: Xid, depth: u8, size: Resolution) -> Result<PixmapId>;
    fn free_pixmap(&self, pixmap: PixmapId) -> Result<()>;

    /// Cursor from a source and mask bitmap, hotspot at the origin.
    fn create_cursor(
        &self,
        source: PixmapId,
        mask: PixmapId,
        foreground: Rgb16,
        background: Rgb16,
    ) -> Result<CursorId>;
    fn free_cursor(&self, cursor: CursorId) -> Result<()>;

    fn create_gc(&self, drawable: Xid, values: GcValues) -> Result<GcId>;
    fn free_gc(&self, gc: GcId) -> Result<()>;
    fn fill_rectangle(&self, drawable: Xid, gc: GcId, size: Resolution) -> Result<()>;
    /// Copy `size` pixels from the origin of `src` to the origin of `dst`.
    fn copy_area(&self, src: Xid, dst: Xid, gc: GcId, size: Resolution) -> Result<()>;

    /// Send a 32-bit client message about `window` to `destination`.
    fn send_client_message(
        &self,
        destination: WindowId,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
        event_mask: u32,
    ) -> Result<()>;

    fn flush(&self) -> Result<()>;
    /// Round-trip: returns once the server processed every request so far.
    fn sync(&self) -> Result<()>;

    /// Negotiate the XKB extension.
    fn xkb_setup(&self) -> Result<()>;
    /// Index of the active keyboard group of the core keyboard.
    fn xkb_group_index(&self) -> Result<u8>;
    /// Symbolic group names of the core keyboard.
    fn xkb_group_names(&self) -> Result<Vec<Atom>>;
}
