//! Lazily resolved atoms, cached for the lifetime of a connection.

use crate::display::Atom;
use crate::server::XServer;
use std::collections::HashMap;
use std::sync::Mutex;

/// Asks compositors not to composite (animate, double-buffer) a window.
pub const NET_WM_BYPASS_COMPOSITOR: &str = "_NET_WM_BYPASS_COMPOSITOR";
/// Root window property naming the focused window.
pub const NET_ACTIVE_WINDOW: &str = "_NET_ACTIVE_WINDOW";

/// Atoms already resolved on one connection.
///
/// A failed lookup is not cached, so the next caller tries again.
#[derive(Debug, Default)]
pub struct AtomCache {
    resolved: Mutex<HashMap<&'static str, Atom>>,
}

impl AtomCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cached(&self, name: &str) -> Option<Atom> {
        self.resolved
            .lock()
            .ok()
            .and_then(|map| map.get(name).copied())
    }

    fn store(&self, name: &'static str, atom: Atom) {
        if let Ok(mut map) = self.resolved.lock() {
            map.insert(name, atom);
        }
    }
}

/// Resolve `name` once per connection.
///
/// Returns `None` (after logging) when the server rejects the lookup; callers
/// treat that as "feature unavailable".
pub fn resolve<S: XServer + ?Sized>(conn: &S, name: &'static str) -> Option<Atom> {
    if let Some(atom) = conn.atoms().cached(name) {
        return Some(atom);
    }

    match conn.intern_atom(name) {
        Ok(atom) => {
            conn.atoms().store(name, atom);
            Some(atom)
        }
        Err(e) => {
            log::warn!("could not intern {}: {}", name, e);
            None
        }
    }
}

/// Human-readable name of `atom`.
///
/// `"<empty>"` for the null atom and `"<invalid>"` when the server does not
/// know it.
pub fn atom_name<S: XServer + ?Sized>(conn: &S, atom: Atom) -> String {
    if atom == 0 {
        return "<empty>".to_string();
    }
    match conn.atom_name(atom) {
        Ok(name) => name,
        Err(e) => {
            log::debug!("GetAtomName({}) failed: {}", atom, e);
            "<invalid>".to_string()
        }
    }
}
