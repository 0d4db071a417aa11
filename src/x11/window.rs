use anyhow::{Context, Result};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use super::X11Context;
use crate::constants::x11;
use crate::error::{DockError, DockResult};
use crate::geometry::{Rect, WindowGeometry, WindowId};
use crate::host::{ChromeFlags, HostWindow};

/// Existing top-level client driven through ICCCM/EWMH requests
pub struct X11Window<'a> {
    ctx: &'a X11Context,
    window: Window,
}

impl<'a> X11Window<'a> {
    pub fn new(ctx: &'a X11Context, window: Window) -> Self {
        Self { ctx, window }
    }

    /// Frame origin and client size in root coordinates
    fn query_geometry(&self) -> Result<WindowGeometry> {
        let conn = &self.ctx.conn;
        let geom = conn
            .get_geometry(self.window)
            .context(format!("Failed to query geometry of window {}", self.window))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", self.window))?;
        let origin = conn
            .translate_coordinates(self.window, self.ctx.root(), 0, 0)
            .context(format!("Failed to translate coordinates of window {}", self.window))?
            .reply()
            .context(format!("Failed to get translate reply for window {}", self.window))?;

        // _NET_FRAME_EXTENTS: left, right, top, bottom
        let extents = self
            .ctx
            .read_u32_list(self.window, self.ctx.atoms.net_frame_extents, AtomEnum::CARDINAL, 4)?;
        let (frame_left, frame_top) = match extents.as_slice() {
            [left, _, top, _] => (*left as i32, *top as i32),
            _ => (0, 0),
        };

        Ok(WindowGeometry {
            x: origin.dst_x as i32 - frame_left,
            y: origin.dst_y as i32 - frame_top,
            width: geom.width as u32,
            height: geom.height as u32,
        })
    }

    fn configure(&self, geometry: WindowGeometry, raise: bool) -> Result<()> {
        let mut aux = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.width.max(1))
            .height(geometry.height.max(1));
        if raise {
            aux = aux.stack_mode(StackMode::ABOVE);
        }
        self.ctx
            .conn
            .configure_window(self.window, &aux)
            .context(format!("Failed to configure window {}", self.window))?;
        self.ctx
            .conn
            .flush()
            .context("Failed to flush X11 connection after configure")?;
        Ok(())
    }

    fn query_chrome(&self) -> Result<ChromeFlags> {
        let atoms = &self.ctx.atoms;
        let mut flags = ChromeFlags::empty();

        // No _MOTIF_WM_HINTS means the window manager decorates as usual
        let hints = self
            .ctx
            .read_u32_list(self.window, atoms.motif_wm_hints, atoms.motif_wm_hints, x11::MOTIF_HINTS_LEN as u32)?;
        let decorated = match hints.as_slice() {
            [hint_flags, _, decorations, ..] if hint_flags & x11::MOTIF_HINTS_DECORATIONS != 0 => *decorations != 0,
            _ => true,
        };
        if decorated {
            flags |= ChromeFlags::DECORATED;
        }

        let state = self
            .ctx
            .read_u32_list(self.window, atoms.net_wm_state, AtomEnum::ATOM, 1024)?;
        if state.contains(&atoms.net_wm_state_above) {
            flags |= ChromeFlags::STAYS_ON_TOP;
        }
        if state.contains(&atoms.net_wm_state_skip_taskbar) {
            flags |= ChromeFlags::SKIP_TASKBAR;
        }
        Ok(flags)
    }

    fn apply_chrome(&self, flags: ChromeFlags) -> Result<()> {
        let atoms = &self.ctx.atoms;
        let decorations = if flags.contains(ChromeFlags::DECORATED) {
            x11::MOTIF_DECOR_ALL
        } else {
            0
        };
        let hints: [u32; x11::MOTIF_HINTS_LEN] = [x11::MOTIF_HINTS_DECORATIONS, 0, decorations, 0, 0];
        self.ctx
            .conn
            .change_property32(PropMode::REPLACE, self.window, atoms.motif_wm_hints, atoms.motif_wm_hints, &hints)
            .context(format!("Failed to set _MOTIF_WM_HINTS on window {}", self.window))?;

        self.request_state(atoms.net_wm_state_above, flags.contains(ChromeFlags::STAYS_ON_TOP))?;
        self.request_state(atoms.net_wm_state_skip_taskbar, flags.contains(ChromeFlags::SKIP_TASKBAR))?;

        self.ctx
            .conn
            .flush()
            .context("Failed to flush X11 connection after chrome change")?;
        debug!(window = self.window, flags = ?flags, "Applied window chrome");
        Ok(())
    }

    /// Ask the window manager to add or remove one _NET_WM_STATE atom
    fn request_state(&self, state: Atom, enable: bool) -> Result<()> {
        let action = if enable {
            x11::NET_WM_STATE_ADD
        } else {
            x11::NET_WM_STATE_REMOVE
        };
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: self.window,
            type_: self.ctx.atoms.net_wm_state,
            data: ClientMessageData::from([action, state, 0, x11::SOURCE_PAGER, 0]),
        };
        self.ctx
            .conn
            .send_event(
                false,
                self.ctx.root(),
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                event,
            )
            .context(format!("Failed to send _NET_WM_STATE request for window {}", self.window))?;
        Ok(())
    }
}

impl HostWindow for X11Window<'_> {
    fn id(&self) -> WindowId {
        self.window
    }

    fn geometry(&self) -> DockResult<WindowGeometry> {
        self.query_geometry().map_err(|e| DockError::resolution(self.window, e))
    }

    fn set_geometry(&mut self, geometry: WindowGeometry) -> DockResult<()> {
        self.configure(geometry, false).map_err(DockError::host)
    }

    fn chrome(&self) -> DockResult<ChromeFlags> {
        self.query_chrome().map_err(|e| DockError::resolution(self.window, e))
    }

    fn set_chrome(&mut self, flags: ChromeFlags) -> DockResult<()> {
        self.apply_chrome(flags).map_err(DockError::host)
    }

    fn place_above(&mut self, rect: Rect) -> DockResult<()> {
        // Raised only; never activated, so keyboard focus stays where it is
        self.configure(rect.into(), true).map_err(DockError::host)
    }
}
