//! X11 / EWMH backend
//!
//! - [`X11Window`] implements the host window capabilities on an existing client
//! - [`RandrMonitors`] resolves monitors through RandR 1.5
//! - [`StrutTransport`] carries app-bar messages as `_NET_WM_STRUT_PARTIAL`

mod monitor;
mod strut;
mod window;

pub use monitor::RandrMonitors;
pub use strut::{Reservation, StrutTransport};
pub use window::X11Window;

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

/// Open connection plus atoms shared by every backend component
pub struct X11Context {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub atoms: CachedAtoms,
}

impl X11Context {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;
        let atoms = CachedAtoms::new(&conn)?;
        Ok(Self { conn, screen_num, atoms })
    }

    pub fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    pub fn root(&self) -> Window {
        self.screen().root
    }

    /// Read a CARDINAL/WINDOW list property; a missing property yields an empty list
    pub fn read_u32_list(&self, window: Window, property: Atom, type_: impl Into<Atom>, max_len: u32) -> Result<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, max_len)
            .context(format!("Failed to query property {} on window {}", property, window))?
            .reply()
            .context(format!("Failed to get property {} reply for window {}", property, window))?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    /// Window currently holding focus according to the window manager
    pub fn active_window(&self) -> Result<Option<Window>> {
        let value = self
            .read_u32_list(self.root(), self.atoms.net_active_window, AtomEnum::WINDOW, 1)
            .context("Failed to read _NET_ACTIVE_WINDOW")?;
        Ok(value.first().copied().filter(|w| *w != x11rb::NONE))
    }
}

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_active_window: Atom,
    pub net_client_list: Atom,
    pub net_current_desktop: Atom,
    pub net_workarea: Atom,
    pub net_frame_extents: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_strut: Atom,
    pub net_wm_strut_partial: Atom,
    pub motif_wm_hints: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn
                .intern_atom(false, name.as_bytes())
                .context(format!("Failed to intern {} atom", name))?
                .reply()
                .context(format!("Failed to get reply for {} atom", name))?
                .atom)
        };

        Ok(Self {
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_client_list: intern("_NET_CLIENT_LIST")?,
            net_current_desktop: intern("_NET_CURRENT_DESKTOP")?,
            net_workarea: intern("_NET_WORKAREA")?,
            net_frame_extents: intern("_NET_FRAME_EXTENTS")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_above: intern("_NET_WM_STATE_ABOVE")?,
            net_wm_state_skip_taskbar: intern("_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_strut: intern("_NET_WM_STRUT")?,
            net_wm_strut_partial: intern("_NET_WM_STRUT_PARTIAL")?,
            motif_wm_hints: intern("_MOTIF_WM_HINTS")?,
        })
    }
}

/// Parse a window id given as decimal or `0x`-prefixed hex
pub fn parse_window_id(s: &str) -> Result<Window> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.context(format!("Invalid window id '{}'", s))
}
