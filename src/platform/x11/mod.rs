//! X11 implementation using Xlib.

mod connection;
mod requests;

pub use connection::XlibConnection;
