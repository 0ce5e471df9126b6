//! Platform-specific implementations of [`XServer`](crate::server::XServer).
//!
//! ## Feature Flags
//!
//! - `x11` (default): talk to the X server through Xlib and libXcomposite

#[cfg(all(target_os = "linux", feature = "x11"))]
mod x11;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub use self::x11::XlibConnection;
