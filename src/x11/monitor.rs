use anyhow::{Context, Result};
use tracing::debug;
use x11rb::protocol::randr::ConnectionExt as RandrExt;
use x11rb::protocol::xproto::*;

use super::X11Context;
use crate::error::{DockError, DockResult};
use crate::geometry::{MonitorInfo, Rect, WindowId};
use crate::monitor::{pick_display, Display, MonitorResolver};

/// Monitor lookup through RandR `GetMonitors`, work area from `_NET_WORKAREA`
pub struct RandrMonitors<'a> {
    ctx: &'a X11Context,
}

impl<'a> RandrMonitors<'a> {
    pub fn new(ctx: &'a X11Context) -> Self {
        Self { ctx }
    }

    fn displays(&self) -> Result<Vec<Display>> {
        let conn = &self.ctx.conn;
        let reply = conn
            .randr_get_monitors(self.ctx.root(), true)
            .context("Failed to query RandR monitors")?
            .reply()
            .context("Failed to get RandR monitors reply")?;

        let mut displays = Vec::with_capacity(reply.monitors.len());
        for m in reply.monitors {
            let name = conn
                .get_atom_name(m.name)
                .context("Failed to query monitor name")?
                .reply()
                .map(|r| String::from_utf8_lossy(&r.name).into_owned())
                .unwrap_or_else(|_| format!("monitor-{}", m.name));
            displays.push(Display {
                name,
                bounds: Rect::new(
                    m.x as i32,
                    m.y as i32,
                    m.x as i32 + m.width as i32,
                    m.y as i32 + m.height as i32,
                ),
                primary: m.primary,
            });
        }

        if displays.is_empty() {
            // No RandR monitors reported; treat the whole root window as one display
            let screen = self.ctx.screen();
            displays.push(Display {
                name: "screen".to_string(),
                bounds: Rect::new(0, 0, screen.width_in_pixels as i32, screen.height_in_pixels as i32),
                primary: true,
            });
        }
        Ok(displays)
    }

    /// `_NET_WORKAREA` entry for the current desktop, if the window manager publishes one
    fn desktop_workarea(&self) -> Result<Option<Rect>> {
        let atoms = &self.ctx.atoms;
        let root = self.ctx.root();
        let desktop = self
            .ctx
            .read_u32_list(root, atoms.net_current_desktop, AtomEnum::CARDINAL, 1)?
            .first()
            .copied()
            .unwrap_or(0) as usize;
        let areas = self
            .ctx
            .read_u32_list(root, atoms.net_workarea, AtomEnum::CARDINAL, 4 * 64)?;

        let entry = areas
            .chunks_exact(4)
            .nth(desktop)
            .or_else(|| areas.chunks_exact(4).next());
        Ok(entry.map(|a| {
            let (x, y) = (a[0] as i32, a[1] as i32);
            Rect::new(x, y, x + a[2] as i32, y + a[3] as i32)
        }))
    }

    fn window_rect(&self, window: WindowId) -> Result<Rect> {
        let conn = &self.ctx.conn;
        let geom = conn
            .get_geometry(window)
            .context(format!("Failed to query geometry of window {}", window))?
            .reply()
            .context(format!("Failed to get geometry reply for window {}", window))?;
        let origin = conn
            .translate_coordinates(window, self.ctx.root(), 0, 0)
            .context(format!("Failed to translate coordinates of window {}", window))?
            .reply()
            .context(format!("Failed to get translate reply for window {}", window))?;
        let (x, y) = (origin.dst_x as i32, origin.dst_y as i32);
        Ok(Rect::new(x, y, x + geom.width as i32, y + geom.height as i32))
    }

    fn lookup(&self, window: WindowId) -> Result<MonitorInfo> {
        let window_rect = self.window_rect(window)?;
        let displays = self.displays()?;
        let monitor = pick_display(&window_rect, &displays)
            .context("No monitor available")?;
        let full = monitor.bounds;

        let work = match self.desktop_workarea()? {
            Some(area) => {
                let clipped = area.intersect(&full);
                if clipped.is_empty() { full } else { clipped }
            }
            None => full,
        };

        debug!(window = window, monitor = %monitor.name, full = ?full, work = ?work, "Resolved window monitor");
        Ok(MonitorInfo { full, work })
    }
}

impl MonitorResolver for RandrMonitors<'_> {
    fn resolve(&self, window: WindowId) -> DockResult<MonitorInfo> {
        self.lookup(window).map_err(|e| DockError::resolution(window, e))
    }
}
