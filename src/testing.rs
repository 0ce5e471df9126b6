//! Simulated X server for unit tests.
//!
//! Records every request in order and tracks which server-side resources
//! are still alive. A few knobs script contention and failures.

use crate::atoms::{AtomCache, NET_ACTIVE_WINDOW};
use crate::display::{
    Atom, ColormapId, CursorId, Depth, GcId, NONE, PixmapId, Resolution, Screen, Visual,
    VisualId, WindowId, Xid, atom,
};
use crate::error::{Error, Result};
use crate::server::{
    GcValues, GrabStatus, PropertyData, PropertyReply, Rgb16, WindowRequest, XServer,
};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

pub const ROOT_WINDOW: WindowId = 0x1d5;
pub const OVERLAY_WINDOW: WindowId = 0x1e0;

const BAD_ATOM: u8 = 5;
const BAD_MATCH: u8 = 8;
const BAD_ACCESS: u8 = 10;

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    InternAtom(String),
    GetAtomName(Atom),
    CompositeOverlay(WindowId),
    CreateColormap {
        id: ColormapId,
        visual: VisualId,
    },
    FreeColormap(ColormapId),
    CreateWindow {
        id: WindowId,
        request: WindowRequest,
    },
    ChangeProperty {
        window: WindowId,
        property: Atom,
        kind: Atom,
        data: PropertyData,
    },
    GetProperty {
        window: WindowId,
        property: Atom,
    },
    MapWindow(WindowId),
    RaiseWindow(WindowId),
    DestroyWindow(WindowId),
    GrabPointer {
        window: WindowId,
        event_mask: u32,
        cursor: CursorId,
    },
    GrabKeyboard {
        window: WindowId,
        owner_events: bool,
    },
    UngrabPointer,
    UngrabKeyboard,
    CreateBitmap {
        id: PixmapId,
        bits: Vec<u8>,
        size: Resolution,
    },
    CreatePixmap {
        id: PixmapId,
        depth: u8,
        size: Resolution,
    },
    FreePixmap(PixmapId),
    CreateCursor {
        id: CursorId,
        source: PixmapId,
        mask: PixmapId,
        foreground: Rgb16,
        background: Rgb16,
    },
    FreeCursor(CursorId),
    CreateGc {
        id: GcId,
        drawable: Xid,
        values: GcValues,
    },
    FreeGc(GcId),
    FillRectangle {
        drawable: Xid,
        gc: GcId,
        size: Resolution,
    },
    CopyArea {
        src: Xid,
        dst: Xid,
        size: Resolution,
    },
    SendClientMessage {
        destination: WindowId,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
        event_mask: u32,
    },
    Flush,
    Sync,
    XkbSetup,
    XkbGetState,
    XkbGetNames,
}

#[derive(Debug, Default)]
struct State {
    requests: Vec<Request>,
    next_id: Xid,
    atoms: HashMap<String, Atom>,
    properties: HashMap<(WindowId, Atom), PropertyReply>,

    windows: BTreeSet<WindowId>,
    pixmaps: BTreeSet<PixmapId>,
    cursors: BTreeSet<CursorId>,
    colormaps: BTreeSet<ColormapId>,
    gcs: BTreeSet<GcId>,

    pointer_grabs: VecDeque<GrabStatus>,
    keyboard_grabs: VecDeque<GrabStatus>,
    failing_grab_requests: usize,
    pointer_held: bool,
    keyboard_held: bool,

    fail_intern_atom: bool,
    failing_requests: HashSet<&'static str>,
    composite_overlay: Option<bool>,
    fail_copy_area: bool,

    xkb_disabled: bool,
    xkb_groups: Vec<String>,
    xkb_group: u8,
}

impl State {
    fn alloc(&mut self) -> Xid {
        self.next_id += 1;
        self.next_id
    }

    fn atom(&mut self, name: &str) -> Atom {
        let next = 0x100 + self.atoms.len() as Atom;
        *self.atoms.entry(name.to_string()).or_insert(next)
    }
}

#[derive(Debug)]
pub struct MockServer {
    screen: Screen,
    atoms: AtomCache,
    state: RefCell<State>,
}

fn visual(id: VisualId) -> Visual {
    Visual {
        id,
        class: 4,
        bits_per_rgb: 8,
    }
}

impl MockServer {
    /// A 1920x1080 screen with a 24-bit root and one 32-bit visual (0x5a).
    pub fn new() -> Self {
        Self {
            screen: Screen {
                root: ROOT_WINDOW,
                width: 1920,
                height: 1080,
                root_depth: 24,
                root_visual: 0x21,
                black_pixel: 0,
                white_pixel: 0xffffff,
                allowed_depths: vec![
                    Depth {
                        depth: 24,
                        visuals: vec![visual(0x21)],
                    },
                    Depth {
                        depth: 32,
                        visuals: vec![visual(0x5a)],
                    },
                ],
            },
            atoms: AtomCache::new(),
            state: RefCell::new(State {
                next_id: 0x0400_0000,
                xkb_groups: vec!["English (US)".to_string()],
                ..State::default()
            }),
        }
    }

    /// Same screen, without any visual at `depth`.
    pub fn without_depth(depth: u8) -> Self {
        let mut server = Self::new();
        server.screen.allowed_depths.retain(|d| d.depth != depth);
        server
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    pub fn live_windows(&self) -> Vec<WindowId> {
        self.state.borrow().windows.iter().copied().collect()
    }

    pub fn live_pixmaps(&self) -> Vec<PixmapId> {
        self.state.borrow().pixmaps.iter().copied().collect()
    }

    pub fn live_cursors(&self) -> Vec<CursorId> {
        self.state.borrow().cursors.iter().copied().collect()
    }

    pub fn live_colormaps(&self) -> Vec<ColormapId> {
        self.state.borrow().colormaps.iter().copied().collect()
    }

    pub fn live_gcs(&self) -> Vec<GcId> {
        self.state.borrow().gcs.iter().copied().collect()
    }

    /// Whether this client currently holds the pointer grab.
    pub fn holds_pointer(&self) -> bool {
        self.state.borrow().pointer_held
    }

    pub fn holds_keyboard(&self) -> bool {
        self.state.borrow().keyboard_held
    }

    /// Atom already interned for `name`, without issuing a request.
    pub fn interned(&self, name: &str) -> Option<Atom> {
        self.state.borrow().atoms.get(name).copied()
    }

    pub fn property(&self, window: WindowId, property: Atom) -> Option<Vec<u32>> {
        self.state
            .borrow()
            .properties
            .get(&(window, property))
            .map(|reply| reply.value.clone())
    }

    pub fn put_property(
        &self,
        window: WindowId,
        property: Atom,
        kind: Atom,
        format: u8,
        value: Vec<u32>,
    ) {
        self.state.borrow_mut().properties.insert(
            (window, property),
            PropertyReply {
                kind,
                format,
                value,
            },
        );
    }

    /// Play the window manager: set the root's `_NET_ACTIVE_WINDOW`.
    pub fn set_active_window(&self, window: WindowId) {
        let active = self.state.borrow_mut().atom(NET_ACTIVE_WINDOW);
        self.put_property(ROOT_WINDOW, active, atom::WINDOW, 32, vec![window]);
    }

    pub fn active_window(&self) -> Option<WindowId> {
        let active = self.interned(NET_ACTIVE_WINDOW)?;
        self.property(ROOT_WINDOW, active)?.first().copied()
    }

    pub fn fail_intern_atom(&self, fail: bool) {
        self.state.borrow_mut().fail_intern_atom = fail;
    }

    /// Advertise the composite extension and grant its overlay window.
    pub fn grant_composite_overlay(&self, grant: bool) {
        self.state.borrow_mut().composite_overlay = grant.then_some(true);
    }

    /// Advertise the composite extension but reject the overlay query.
    pub fn fail_composite_overlay(&self, fail: bool) {
        self.state.borrow_mut().composite_overlay = fail.then_some(false);
    }

    /// Answer every later request named `request` (e.g. `"Sync"`) with a
    /// protocol error. Failed requests change nothing on the server.
    pub fn fail_request(&self, request: &'static str) {
        self.state.borrow_mut().failing_requests.insert(request);
    }

    pub fn fail_copy_area(&self, fail: bool) {
        self.state.borrow_mut().fail_copy_area = fail;
    }

    /// Statuses for the next pointer grabs; later grabs succeed.
    pub fn script_pointer_grabs(&self, statuses: &[GrabStatus]) {
        self.state.borrow_mut().pointer_grabs.extend(statuses);
    }

    /// Statuses for the next keyboard grabs; later grabs succeed.
    pub fn script_keyboard_grabs(&self, statuses: &[GrabStatus]) {
        self.state.borrow_mut().keyboard_grabs.extend(statuses);
    }

    /// Reject the next `count` grab requests with a protocol error.
    pub fn fail_next_grab_requests(&self, count: usize) {
        self.state.borrow_mut().failing_grab_requests = count;
    }

    pub fn set_keyboard_groups(&self, names: &[&str], active: u8) {
        let mut state = self.state.borrow_mut();
        state.xkb_groups = names.iter().map(|n| n.to_string()).collect();
        state.xkb_group = active;
    }

    pub fn disable_xkb(&self) {
        self.state.borrow_mut().xkb_disabled = true;
    }

    fn record(&self, request: Request) {
        self.state.borrow_mut().requests.push(request);
    }

    fn alloc(&self) -> Xid {
        self.state.borrow_mut().alloc()
    }

    /// Record `request` and report whether it was scripted to fail.
    fn issue(&self, name: &'static str, request: Request) -> Result<()> {
        self.record(request);
        if self.state.borrow().failing_requests.contains(name) {
            return Err(Error::Protocol {
                request: name,
                code: BAD_MATCH,
            });
        }
        Ok(())
    }

    fn grab(&self, request: Request, keyboard: bool) -> Result<GrabStatus> {
        let name = if keyboard { "GrabKeyboard" } else { "GrabPointer" };
        self.record(request);
        let mut state = self.state.borrow_mut();
        if state.failing_grab_requests > 0 {
            state.failing_grab_requests -= 1;
            return Err(Error::Protocol {
                request: name,
                code: BAD_ACCESS,
            });
        }
        let queue = if keyboard {
            &mut state.keyboard_grabs
        } else {
            &mut state.pointer_grabs
        };
        let status = queue.pop_front().unwrap_or(GrabStatus::Success);
        if status == GrabStatus::Success {
            if keyboard {
                state.keyboard_held = true;
            } else {
                state.pointer_held = true;
            }
        }
        Ok(status)
    }
}

impl XServer for MockServer {
    fn screen(&self) -> &Screen {
        &self.screen
    }

    fn atoms(&self) -> &AtomCache {
        &self.atoms
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        self.record(Request::InternAtom(name.to_string()));
        let mut state = self.state.borrow_mut();
        if state.fail_intern_atom {
            return Err(Error::Protocol {
                request: "InternAtom",
                code: BAD_ATOM,
            });
        }
        Ok(state.atom(name))
    }

    fn atom_name(&self, atom: Atom) -> Result<String> {
        self.record(Request::GetAtomName(atom));
        self.state
            .borrow()
            .atoms
            .iter()
            .find(|(_, a)| **a == atom)
            .map(|(name, _)| name.clone())
            .ok_or(Error::Protocol {
                request: "GetAtomName",
                code: BAD_ATOM,
            })
    }

    fn composite_overlay_window(&self, root: WindowId) -> Result<Option<WindowId>> {
        self.record(Request::CompositeOverlay(root));
        match self.state.borrow().composite_overlay {
            None => Ok(None),
            Some(true) => Ok(Some(OVERLAY_WINDOW)),
            Some(false) => Err(Error::Protocol {
                request: "CompositeGetOverlayWindow",
                code: BAD_MATCH,
            }),
        }
    }

    fn create_colormap(&self, _window: WindowId, visual: VisualId) -> Result<ColormapId> {
        let id = self.alloc();
        self.record(Request::CreateColormap { id, visual });
        self.state.borrow_mut().colormaps.insert(id);
        Ok(id)
    }

    fn free_colormap(&self, colormap: ColormapId) -> Result<()> {
        self.issue("FreeColormap", Request::FreeColormap(colormap))?;
        self.state.borrow_mut().colormaps.remove(&colormap);
        Ok(())
    }

    fn create_window(&self, request: &WindowRequest) -> Result<WindowId> {
        let id = self.alloc();
        self.record(Request::CreateWindow {
            id,
            request: *request,
        });
        self.state.borrow_mut().windows.insert(id);
        Ok(id)
    }

    fn change_property(
        &self,
        window: WindowId,
        property: Atom,
        kind: Atom,
        data: PropertyData,
    ) -> Result<()> {
        let (format, value) = match &data {
            PropertyData::Bytes(bytes) => (8, bytes.iter().map(|b| u32::from(*b)).collect()),
            PropertyData::Cardinals(values) => (32, values.clone()),
        };
        self.issue(
            "ChangeProperty",
            Request::ChangeProperty {
                window,
                property,
                kind,
                data,
            },
        )?;
        self.put_property(window, property, kind, format, value);
        Ok(())
    }

    fn get_property(
        &self,
        window: WindowId,
        property: Atom,
        long_length: u32,
    ) -> Result<PropertyReply> {
        self.record(Request::GetProperty { window, property });
        let state = self.state.borrow();
        Ok(match state.properties.get(&(window, property)) {
            Some(reply) => PropertyReply {
                value: reply
                    .value
                    .iter()
                    .take(long_length as usize)
                    .copied()
                    .collect(),
                ..reply.clone()
            },
            None => PropertyReply {
                kind: NONE,
                format: 0,
                value: Vec::new(),
            },
        })
    }

    fn map_window(&self, window: WindowId) -> Result<()> {
        self.issue("MapWindow", Request::MapWindow(window))
    }

    fn raise_window(&self, window: WindowId) -> Result<()> {
        self.issue("RaiseWindow", Request::RaiseWindow(window))
    }

    fn destroy_window(&self, window: WindowId) -> Result<()> {
        self.issue("DestroyWindow", Request::DestroyWindow(window))?;
        self.state.borrow_mut().windows.remove(&window);
        Ok(())
    }

    fn grab_pointer(
        &self,
        grab_window: WindowId,
        event_mask: u32,
        cursor: CursorId,
    ) -> Result<GrabStatus> {
        self.grab(
            Request::GrabPointer {
                window: grab_window,
                event_mask,
                cursor,
            },
            false,
        )
    }

    fn grab_keyboard(&self, grab_window: WindowId, owner_events: bool) -> Result<GrabStatus> {
        self.grab(
            Request::GrabKeyboard {
                window: grab_window,
                owner_events,
            },
            true,
        )
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.issue("UngrabPointer", Request::UngrabPointer)?;
        self.state.borrow_mut().pointer_held = false;
        Ok(())
    }

    fn ungrab_keyboard(&self) -> Result<()> {
        self.issue("UngrabKeyboard", Request::UngrabKeyboard)?;
        self.state.borrow_mut().keyboard_held = false;
        Ok(())
    }

    fn create_bitmap(&self, _drawable: Xid, bits: &[u8], size: Resolution) -> Result<PixmapId> {
        let id = self.alloc();
        self.record(Request::CreateBitmap {
            id,
            bits: bits.to_vec(),
            size,
        });
        self.state.borrow_mut().pixmaps.insert(id);
        Ok(id)
    }

    fn create_pixmap(&self, _drawable: Xid, depth: u8, size: Resolution) -> Result<PixmapId> {
        let id = self.alloc();
        self.record(Request::CreatePixmap { id, depth, size });
        self.state.borrow_mut().pixmaps.insert(id);
        Ok(id)
    }

    fn free_pixmap(&self, pixmap: PixmapId) -> Result<()> {
        self.issue("FreePixmap", Request::FreePixmap(pixmap))?;
        self.state.borrow_mut().pixmaps.remove(&pixmap);
        Ok(())
    }

    fn create_cursor(
        &self,
        source: PixmapId,
        mask: PixmapId,
        foreground: Rgb16,
        background: Rgb16,
    ) -> Result<CursorId> {
        let id = self.alloc();
        self.record(Request::CreateCursor {
            id,
            source,
            mask,
            foreground,
            background,
        });
        self.state.borrow_mut().cursors.insert(id);
        Ok(id)
    }

    fn free_cursor(&self, cursor: CursorId) -> Result<()> {
        self.issue("FreeCursor", Request::FreeCursor(cursor))?;
        self.state.borrow_mut().cursors.remove(&cursor);
        Ok(())
    }

    fn create_gc(&self, drawable: Xid, values: GcValues) -> Result<GcId> {
        let id = self.alloc();
        self.record(Request::CreateGc {
            id,
            drawable,
            values,
        });
        self.state.borrow_mut().gcs.insert(id);
        Ok(id)
    }

    fn free_gc(&self, gc: GcId) -> Result<()> {
        self.record(Request::FreeGc(gc));
        self.state.borrow_mut().gcs.remove(&gc);
        Ok(())
    }

    fn fill_rectangle(&self, drawable: Xid, gc: GcId, size: Resolution) -> Result<()> {
        self.record(Request::FillRectangle { drawable, gc, size });
        Ok(())
    }

    fn copy_area(&self, src: Xid, dst: Xid, _gc: GcId, size: Resolution) -> Result<()> {
        self.record(Request::CopyArea { src, dst, size });
        if self.state.borrow().fail_copy_area {
            return Err(Error::Protocol {
                request: "CopyArea",
                code: BAD_MATCH,
            });
        }
        Ok(())
    }

    fn send_client_message(
        &self,
        destination: WindowId,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
        event_mask: u32,
    ) -> Result<()> {
        self.record(Request::SendClientMessage {
            destination,
            window,
            message_type,
            data,
            event_mask,
        });
        if destination == ROOT_WINDOW && Some(message_type) == self.interned(NET_ACTIVE_WINDOW) {
            self.set_active_window(window);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.issue("Flush", Request::Flush)
    }

    fn sync(&self) -> Result<()> {
        self.issue("Sync", Request::Sync)
    }

    fn xkb_setup(&self) -> Result<()> {
        self.record(Request::XkbSetup);
        if self.state.borrow().xkb_disabled {
            return Err(Error::Xkb("could not set up XKB extension".into()));
        }
        Ok(())
    }

    fn xkb_group_index(&self) -> Result<u8> {
        self.record(Request::XkbGetState);
        Ok(self.state.borrow().xkb_group)
    }

    fn xkb_group_names(&self) -> Result<Vec<Atom>> {
        self.record(Request::XkbGetNames);
        let mut state = self.state.borrow_mut();
        let names = state.xkb_groups.clone();
        Ok(names.iter().map(|name| state.atom(name)).collect())
    }
}
