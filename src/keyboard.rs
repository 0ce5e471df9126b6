//! Name of the active keyboard layout group.

use crate::atoms::atom_name;
use crate::error::{Error, Result};
use crate::server::XServer;

/// Name of the active XKB group, e.g. `"English (US)"`.
///
/// Fails with [`Error::Xkb`] when the extension cannot be negotiated or
/// queried, or when the active group has no name.
pub fn current_layout_group<S: XServer + ?Sized>(conn: &S) -> Result<String> {
    conn.xkb_setup()?;

    let groups = conn.xkb_group_names()?;
    let index = conn.xkb_group_index()?;

    let mut active = None;
    for (i, group) in groups.iter().enumerate() {
        let name = atom_name(conn, *group);
        log::debug!("group_name {}: {}", i, name);
        if i == usize::from(index) {
            active = Some(name);
        }
    }

    active.ok_or_else(|| {
        Error::Xkb(format!(
            "active group {} out of {} named groups",
            index,
            groups.len()
        ))
    })
}
