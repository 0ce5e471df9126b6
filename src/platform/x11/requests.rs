//! [`XServer`] requests issued through Xlib.

use super::connection::{FALSE, TRUE, XlibConnection};
use crate::atoms::AtomCache;
use crate::display::{
    Atom, ColormapId, CursorId, GcId, PixmapId, Resolution, Screen, VisualId, WindowId, Xid,
};
use crate::error::{Error, Result};
use crate::server::{
    GcValues, GrabStatus, PropertyData, PropertyReply, Rgb16, WindowRequest, XServer,
};
use std::ffi::{CStr, CString};
use std::mem;
use std::os::raw::{c_char, c_int, c_long, c_short, c_uchar, c_uint, c_ulong};
use std::ptr;
use x11::xlib;

#[link(name = "Xcomposite")]
unsafe extern "C" {
    fn XCompositeQueryExtension(
        display: *mut xlib::Display,
        event_base: *mut c_int,
        error_base: *mut c_int,
    ) -> xlib::Bool;
    fn XCompositeGetOverlayWindow(
        display: *mut xlib::Display,
        window: xlib::Window,
    ) -> xlib::Window;
}

const BAD_VALUE: u8 = 2;
const BAD_ATOM: u8 = 5;
const BAD_GC: u8 = 13;
const ANY_PROPERTY_TYPE: xlib::Atom = 0;

const XKB_MAJOR_VERSION: c_int = 1;
const XKB_MINOR_VERSION: c_int = 0;
const XKB_USE_CORE_KBD: c_uint = 0x0100;
const XKB_GROUP_NAMES_MASK: c_uint = 1 << 12;

fn xkb_error(what: &str) -> Error {
    Error::Xkb(what.to_string())
}

impl XServer for XlibConnection {
    fn screen(&self) -> &Screen {
        &self.screen
    }

    fn atoms(&self) -> &AtomCache {
        &self.atoms
    }

    fn intern_atom(&self, name: &str) -> Result<Atom> {
        let name = CString::new(name).map_err(|_| Error::Protocol {
            request: "InternAtom",
            code: BAD_VALUE,
        })?;
        let atom = self.checked("InternAtom", || unsafe {
            xlib::XInternAtom(self.display, name.as_ptr(), FALSE)
        })?;
        if atom == 0 {
            return Err(Error::Protocol {
                request: "InternAtom",
                code: BAD_VALUE,
            });
        }
        Ok(atom as Atom)
    }

    fn atom_name(&self, atom: Atom) -> Result<String> {
        let raw = self.checked("GetAtomName", || unsafe {
            xlib::XGetAtomName(self.display, atom as xlib::Atom)
        })?;
        if raw.is_null() {
            return Err(Error::Protocol {
                request: "GetAtomName",
                code: BAD_ATOM,
            });
        }
        let name = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        unsafe {
            xlib::XFree(raw.cast());
        }
        Ok(name)
    }

    fn composite_overlay_window(&self, root: WindowId) -> Result<Option<WindowId>> {
        let mut event_base: c_int = 0;
        let mut error_base: c_int = 0;
        let present = unsafe {
            XCompositeQueryExtension(self.display, &mut event_base, &mut error_base)
        };
        if present == FALSE {
            return Ok(None);
        }

        let overlay = self.checked("CompositeGetOverlayWindow", || unsafe {
            XCompositeGetOverlayWindow(self.display, root as xlib::Window)
        })?;
        Ok((overlay != 0).then_some(overlay as WindowId))
    }

    fn create_colormap(&self, window: WindowId, visual: VisualId) -> Result<ColormapId> {
        let visual_ptr = *self.visuals.get(&visual).ok_or(Error::Protocol {
            request: "CreateColormap",
            code: BAD_VALUE,
        })?;
        let colormap = unsafe {
            xlib::XCreateColormap(
                self.display,
                window as xlib::Window,
                visual_ptr,
                xlib::AllocNone,
            )
        };
        Ok(colormap as ColormapId)
    }

    fn free_colormap(&self, colormap: ColormapId) -> Result<()> {
        unsafe {
            xlib::XFreeColormap(self.display, colormap as xlib::Colormap);
        }
        Ok(())
    }

    fn create_window(&self, request: &WindowRequest) -> Result<WindowId> {
        let visual = *self
            .visuals
            .get(&request.visual)
            .ok_or(Error::NoVisual(request.depth))?;

        let attrs = &request.attributes;
        let mut attributes: xlib::XSetWindowAttributes = unsafe { mem::zeroed() };
        attributes.background_pixel = attrs.background_pixel as c_ulong;
        attributes.border_pixel = attrs.border_pixel as c_ulong;
        attributes.override_redirect = if attrs.override_redirect { TRUE } else { FALSE };
        attributes.event_mask = attrs.event_mask as c_long;
        attributes.colormap = attrs.colormap as xlib::Colormap;

        let value_mask = (xlib::CWBackPixel
            | xlib::CWBorderPixel
            | xlib::CWOverrideRedirect
            | xlib::CWEventMask
            | xlib::CWColormap) as c_ulong;

        let window = self.checked("CreateWindow", || unsafe {
            xlib::XCreateWindow(
                self.display,
                request.parent as xlib::Window,
                c_int::from(request.x),
                c_int::from(request.y),
                request.size.width as c_uint,
                request.size.height as c_uint,
                c_uint::from(request.border_width),
                c_int::from(request.depth),
                xlib::InputOutput as c_uint,
                visual,
                value_mask,
                &mut attributes,
            )
        })?;
        Ok(window as WindowId)
    }

    fn change_property(
        &self,
        window: WindowId,
        property: Atom,
        kind: Atom,
        data: PropertyData,
    ) -> Result<()> {
        unsafe {
            match data {
                PropertyData::Bytes(bytes) => {
                    xlib::XChangeProperty(
                        self.display,
                        window as xlib::Window,
                        property as xlib::Atom,
                        kind as xlib::Atom,
                        8,
                        xlib::PropModeReplace,
                        bytes.as_ptr(),
                        bytes.len() as c_int,
                    );
                }
                PropertyData::Cardinals(values) => {
                    // Xlib expects format-32 data as longs.
                    let longs: Vec<c_long> = values.iter().map(|v| *v as c_long).collect();
                    xlib::XChangeProperty(
                        self.display,
                        window as xlib::Window,
                        property as xlib::Atom,
                        kind as xlib::Atom,
                        32,
                        xlib::PropModeReplace,
                        longs.as_ptr().cast(),
                        longs.len() as c_int,
                    );
                }
            }
        }
        Ok(())
    }

    fn get_property(
        &self,
        window: WindowId,
        property: Atom,
        long_length: u32,
    ) -> Result<PropertyReply> {
        let mut kind: xlib::Atom = 0;
        let mut format: c_int = 0;
        let mut nitems: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut data: *mut c_uchar = ptr::null_mut();

        let status = self.checked("GetProperty", || unsafe {
            xlib::XGetWindowProperty(
                self.display,
                window as xlib::Window,
                property as xlib::Atom,
                0,
                long_length as c_long,
                FALSE,
                ANY_PROPERTY_TYPE,
                &mut kind,
                &mut format,
                &mut nitems,
                &mut bytes_after,
                &mut data,
            )
        })?;
        if status != 0 {
            return Err(Error::Protocol {
                request: "GetProperty",
                code: status as u8,
            });
        }

        let count = nitems as usize;
        let value = if data.is_null() {
            Vec::new()
        } else {
            unsafe {
                let value = match format {
                    32 => std::slice::from_raw_parts(data as *const c_long, count)
                        .iter()
                        .map(|v| *v as u32)
                        .collect(),
                    16 => std::slice::from_raw_parts(data as *const c_short, count)
                        .iter()
                        .map(|v| *v as u16 as u32)
                        .collect(),
                    _ => std::slice::from_raw_parts(data, count)
                        .iter()
                        .map(|v| u32::from(*v))
                        .collect(),
                };
                xlib::XFree(data.cast());
                value
            }
        };

        Ok(PropertyReply {
            kind: kind as Atom,
            format: format as u8,
            value,
        })
    }

    fn map_window(&self, window: WindowId) -> Result<()> {
        unsafe {
            xlib::XMapWindow(self.display, window as xlib::Window);
        }
        Ok(())
    }

    fn raise_window(&self, window: WindowId) -> Result<()> {
        unsafe {
            xlib::XRaiseWindow(self.display, window as xlib::Window);
        }
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> Result<()> {
        unsafe {
            xlib::XDestroyWindow(self.display, window as xlib::Window);
        }
        Ok(())
    }

    fn grab_pointer(
        &self,
        grab_window: WindowId,
        event_mask: u32,
        cursor: CursorId,
    ) -> Result<GrabStatus> {
        let status = unsafe {
            xlib::XGrabPointer(
                self.display,
                grab_window as xlib::Window,
                FALSE,
                event_mask as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                0,
                cursor as xlib::Cursor,
                xlib::CurrentTime,
            )
        };
        Ok(GrabStatus::from_raw(status as u8))
    }

    fn grab_keyboard(&self, grab_window: WindowId, owner_events: bool) -> Result<GrabStatus> {
        let status = unsafe {
            xlib::XGrabKeyboard(
                self.display,
                grab_window as xlib::Window,
                if owner_events { TRUE } else { FALSE },
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                xlib::CurrentTime,
            )
        };
        Ok(GrabStatus::from_raw(status as u8))
    }

    fn ungrab_pointer(&self) -> Result<()> {
        unsafe {
            xlib::XUngrabPointer(self.display, xlib::CurrentTime);
        }
        Ok(())
    }

    fn ungrab_keyboard(&self) -> Result<()> {
        unsafe {
            xlib::XUngrabKeyboard(self.display, xlib::CurrentTime);
        }
        Ok(())
    }

    fn create_bitmap(&self, drawable: Xid, bits: &[u8], size: Resolution) -> Result<PixmapId> {
        let pixmap = unsafe {
            xlib::XCreateBitmapFromData(
                self.display,
                drawable as xlib::Drawable,
                bits.as_ptr() as *const c_char,
                size.width as c_uint,
                size.height as c_uint,
            )
        };
        Ok(pixmap as PixmapId)
    }

    fn create_pixmap(&self, drawable: Xid, depth: u8, size: Resolution) -> Result<PixmapId> {
        let pixmap = unsafe {
            xlib::XCreatePixmap(
                self.display,
                drawable as xlib::Drawable,
                size.width as c_uint,
                size.height as c_uint,
                c_uint::from(depth),
            )
        };
        Ok(pixmap as PixmapId)
    }

    fn free_pixmap(&self, pixmap: PixmapId) -> Result<()> {
        unsafe {
            xlib::XFreePixmap(self.display, pixmap as xlib::Pixmap);
        }
        Ok(())
    }

    fn create_cursor(
        &self,
        source: PixmapId,
        mask: PixmapId,
        foreground: Rgb16,
        background: Rgb16,
    ) -> Result<CursorId> {
        let xcolor = |color: Rgb16| {
            let mut c: xlib::XColor = unsafe { mem::zeroed() };
            c.red = color.red;
            c.green = color.green;
            c.blue = color.blue;
            c.flags = (xlib::DoRed | xlib::DoGreen | xlib::DoBlue) as c_char;
            c
        };
        let mut fg = xcolor(foreground);
        let mut bg = xcolor(background);

        let cursor = self.checked("CreateCursor", || unsafe {
            xlib::XCreatePixmapCursor(
                self.display,
                source as xlib::Pixmap,
                mask as xlib::Pixmap,
                &mut fg,
                &mut bg,
                0,
                0,
            )
        })?;
        Ok(cursor as CursorId)
    }

    fn free_cursor(&self, cursor: CursorId) -> Result<()> {
        unsafe {
            xlib::XFreeCursor(self.display, cursor as xlib::Cursor);
        }
        Ok(())
    }

    fn create_gc(&self, drawable: Xid, values: GcValues) -> Result<GcId> {
        let mut gc_values: xlib::XGCValues = unsafe { mem::zeroed() };
        gc_values.foreground = values.foreground as c_ulong;
        let mut mask = xlib::GCForeground as c_ulong;
        if values.include_inferiors {
            gc_values.subwindow_mode = xlib::IncludeInferiors;
            mask |= xlib::GCSubwindowMode as c_ulong;
        }

        let gc = unsafe {
            xlib::XCreateGC(
                self.display,
                drawable as xlib::Drawable,
                mask,
                &mut gc_values,
            )
        };
        if gc.is_null() {
            return Err(Error::Protocol {
                request: "CreateGC",
                code: BAD_VALUE,
            });
        }

        let id = unsafe { xlib::XGContextFromGC(gc) } as GcId;
        self.gcs.borrow_mut().insert(id, gc);
        Ok(id)
    }

    fn free_gc(&self, gc: GcId) -> Result<()> {
        if let Some(handle) = self.gcs.borrow_mut().remove(&gc) {
            unsafe {
                xlib::XFreeGC(self.display, handle);
            }
        }
        Ok(())
    }

    fn fill_rectangle(&self, drawable: Xid, gc: GcId, size: Resolution) -> Result<()> {
        let handle = self.gc_handle(gc)?;
        unsafe {
            xlib::XFillRectangle(
                self.display,
                drawable as xlib::Drawable,
                handle,
                0,
                0,
                size.width as c_uint,
                size.height as c_uint,
            );
        }
        Ok(())
    }

    fn copy_area(&self, src: Xid, dst: Xid, gc: GcId, size: Resolution) -> Result<()> {
        let handle = self.gc_handle(gc)?;
        unsafe {
            xlib::XCopyArea(
                self.display,
                src as xlib::Drawable,
                dst as xlib::Drawable,
                handle,
                0,
                0,
                size.width as c_uint,
                size.height as c_uint,
                0,
                0,
            );
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
        let mut message: xlib::XClientMessageEvent = unsafe { mem::zeroed() };
        message.type_ = xlib::ClientMessage;
        message.window = window as xlib::Window;
        message.message_type = message_type as xlib::Atom;
        message.format = 32;
        for (i, value) in data.iter().enumerate() {
            message.data.set_long(i, *value as c_long);
        }

        let mut event = xlib::XEvent::from(message);
        let status = unsafe {
            xlib::XSendEvent(
                self.display,
                destination as xlib::Window,
                FALSE,
                event_mask as c_long,
                &mut event,
            )
        };
        if status == 0 {
            return Err(Error::Protocol {
                request: "SendEvent",
                code: BAD_VALUE,
            });
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        unsafe {
            xlib::XFlush(self.display);
        }
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        unsafe {
            xlib::XSync(self.display, FALSE);
        }
        self.take_error("Sync")
    }

    fn xkb_setup(&self) -> Result<()> {
        let mut opcode: c_int = 0;
        let mut event_base: c_int = 0;
        let mut error_base: c_int = 0;
        let mut major = XKB_MAJOR_VERSION;
        let mut minor = XKB_MINOR_VERSION;
        let ok = unsafe {
            xlib::XkbQueryExtension(
                self.display,
                &mut opcode,
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if ok == FALSE {
            return Err(xkb_error("could not set up XKB extension"));
        }
        log::debug!("XKB {}.{} negotiated", major, minor);
        Ok(())
    }

    fn xkb_group_index(&self) -> Result<u8> {
        let mut state: xlib::XkbStateRec = unsafe { mem::zeroed() };
        let status = unsafe { xlib::XkbGetState(self.display, XKB_USE_CORE_KBD, &mut state) };
        if status != 0 {
            return Err(xkb_error("couldn't get keyboard state"));
        }
        Ok(state.group)
    }

    fn xkb_group_names(&self) -> Result<Vec<Atom>> {
        unsafe {
            let desc = xlib::XkbAllocKeyboard();
            if desc.is_null() {
                return Err(xkb_error("couldn't allocate keyboard description"));
            }

            let status = xlib::XkbGetNames(self.display, XKB_GROUP_NAMES_MASK, desc);
            let names = (*desc).names;
            let result = if status != 0 || names.is_null() {
                Err(xkb_error("couldn't get reply for get_names"))
            } else {
                let groups = &(*names).groups;
                let len = groups.iter().rposition(|a| *a != 0).map_or(0, |i| i + 1);
                Ok(groups[..len].iter().map(|a| *a as Atom).collect())
            };

            xlib::XkbFreeKeyboard(desc, 0, TRUE);
            result
        }
    }
}

impl XlibConnection {
    fn gc_handle(&self, gc: GcId) -> Result<xlib::GC> {
        self.gcs.borrow().get(&gc).copied().ok_or(Error::Protocol {
            request: "GC lookup",
            code: BAD_GC,
        })
    }
}
