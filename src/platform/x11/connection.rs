//! Opening the display and discovering the screen.

use crate::atoms::AtomCache;
use crate::display::{Depth, GcId, Screen, Visual, VisualId};
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::os::raw::{c_int, c_long};
use std::ptr::null;
use std::sync::atomic::{AtomicU8, Ordering};
use x11::xlib;

pub(super) const TRUE: c_int = 1;
pub(super) const FALSE: c_int = 0;

/// Error code of the last protocol error reported by the server.
static LAST_ERROR: AtomicU8 = AtomicU8::new(0);

/// Xlib error handler: record the error instead of exiting.
unsafe extern "C" fn record_error(
    _display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    unsafe {
        if let Some(event) = event.as_ref() {
            log::debug!(
                "X11 error {} (request {}.{}) on resource 0x{:x}",
                event.error_code,
                event.request_code,
                event.minor_code,
                event.resourceid
            );
            LAST_ERROR.store(event.error_code, Ordering::SeqCst);
        }
    }
    0
}

/// A connection to the X server named by `$DISPLAY`.
///
/// Closed when dropped.
pub struct XlibConnection {
    pub(super) display: *mut xlib::Display,
    pub(super) screen: Screen,
    pub(super) atoms: AtomCache,
    /// Visual structures by id, as Xlib wants them for `XCreateWindow`.
    pub(super) visuals: HashMap<VisualId, *mut xlib::Visual>,
    /// Xlib keeps GCs client-side; map the protocol id back to the handle.
    pub(super) gcs: RefCell<HashMap<GcId, xlib::GC>>,
}

impl XlibConnection {
    /// Open the default display and describe its default screen.
    pub fn open() -> Result<Self> {
        let display = unsafe { xlib::XOpenDisplay(null()) };
        if display.is_null() {
            return Err(Error::DisplayOpenFailed(
                std::env::var("DISPLAY").unwrap_or_else(|_| "$DISPLAY not set".into()),
            ));
        }

        unsafe {
            xlib::XSetErrorHandler(Some(record_error));
        }

        let (screen, visuals) = unsafe { discover_screen(display) };
        log::debug!(
            "screen {}x{} depth {}, root 0x{:x}",
            screen.width,
            screen.height,
            screen.root_depth,
            screen.root
        );

        Ok(Self {
            display,
            screen,
            atoms: AtomCache::new(),
            visuals,
            gcs: RefCell::new(HashMap::new()),
        })
    }

    /// Run `request`, then wait for the server and report any error it raised.
    pub(super) fn checked<T>(&self, request: &'static str, f: impl FnOnce() -> T) -> Result<T> {
        LAST_ERROR.store(0, Ordering::SeqCst);
        let value = f();
        unsafe {
            xlib::XSync(self.display, FALSE);
        }
        self.take_error(request).map(|()| value)
    }

    /// Report the error recorded since the last check, if any.
    pub(super) fn take_error(&self, request: &'static str) -> Result<()> {
        match LAST_ERROR.swap(0, Ordering::SeqCst) {
            0 => Ok(()),
            code => Err(Error::Protocol { request, code }),
        }
    }
}

impl Drop for XlibConnection {
    fn drop(&mut self) {
        unsafe {
            for (_, gc) in self.gcs.get_mut().drain() {
                xlib::XFreeGC(self.display, gc);
            }
            xlib::XCloseDisplay(self.display);
        }
    }
}

unsafe fn discover_screen(
    display: *mut xlib::Display,
) -> (Screen, HashMap<VisualId, *mut xlib::Visual>) {
    unsafe {
        let screen_num = xlib::XDefaultScreen(display);
        let root_visual = xlib::XVisualIDFromVisual(xlib::XDefaultVisual(display, screen_num));

        let mut template: xlib::XVisualInfo = mem::zeroed();
        template.screen = screen_num;
        let mut count: c_int = 0;
        let infos = xlib::XGetVisualInfo(
            display,
            xlib::VisualScreenMask as c_long,
            &mut template,
            &mut count,
        );

        let mut allowed_depths: Vec<Depth> = Vec::new();
        let mut visuals = HashMap::new();
        if !infos.is_null() {
            for info in std::slice::from_raw_parts(infos, count.max(0) as usize) {
                let visual = Visual {
                    id: info.visualid as VisualId,
                    class: info.class as u8,
                    bits_per_rgb: info.bits_per_rgb as u8,
                };
                visuals.insert(visual.id, info.visual);

                let depth = info.depth as u8;
                match allowed_depths.iter_mut().find(|d| d.depth == depth) {
                    Some(entry) => entry.visuals.push(visual),
                    None => allowed_depths.push(Depth {
                        depth,
                        visuals: vec![visual],
                    }),
                }
            }
            xlib::XFree(infos.cast());
        }

        let screen = Screen {
            root: xlib::XRootWindow(display, screen_num) as u32,
            width: xlib::XDisplayWidth(display, screen_num) as u32,
            height: xlib::XDisplayHeight(display, screen_num) as u32,
            root_depth: xlib::XDefaultDepth(display, screen_num) as u8,
            root_visual: root_visual as VisualId,
            black_pixel: xlib::XBlackPixel(display, screen_num) as u32,
            white_pixel: xlib::XWhitePixel(display, screen_num) as u32,
            allowed_depths,
        };
        (screen, visuals)
    }
}
