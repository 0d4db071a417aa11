//! App-bar messages expressed as EWMH struts
//!
//! A strut is a distance from an edge of the root window plus the span along
//! that edge it covers. `SetPos` publishes the reservation on the docked
//! window, `QueryPos` moves the candidate past struts other clients already
//! hold on the same edge, and `Remove` deletes the properties again.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use super::X11Context;
use crate::appbar::{AppBarData, AppBarMessage, AppBarTransport};
use crate::constants::x11::{STRUT_LEN, STRUT_PARTIAL_LEN};
use crate::error::{DockError, DockResult};
use crate::geometry::{Edge, Rect};

/// Strip held by another client, in root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub edge: Edge,
    /// Distance from the root window edge
    pub thickness: i32,
    /// First covered pixel along the edge
    pub start: i32,
    /// Last covered pixel along the edge (inclusive)
    pub end: i32,
}

impl Reservation {
    fn overlaps_span(&self, start: i32, end: i32) -> bool {
        self.start <= end && start <= self.end
    }
}

/// `_NET_WM_STRUT_PARTIAL` values for `rect` docked at `edge` on a root of the given size
pub fn strut_partial(edge: Edge, rect: Rect, root_width: i32, root_height: i32) -> [u32; STRUT_PARTIAL_LEN] {
    let clamp = |v: i32| v.max(0) as u32;
    let mut strut = [0u32; STRUT_PARTIAL_LEN];
    match edge {
        Edge::Left => {
            strut[0] = clamp(rect.right);
            strut[4] = clamp(rect.top);
            strut[5] = clamp(rect.bottom - 1);
        }
        Edge::Right => {
            strut[1] = clamp(root_width - rect.left);
            strut[6] = clamp(rect.top);
            strut[7] = clamp(rect.bottom - 1);
        }
        Edge::Top => {
            strut[2] = clamp(rect.bottom);
            strut[8] = clamp(rect.left);
            strut[9] = clamp(rect.right - 1);
        }
        Edge::Bottom => {
            strut[3] = clamp(root_height - rect.top);
            strut[10] = clamp(rect.left);
            strut[11] = clamp(rect.right - 1);
        }
    }
    strut
}

/// Decode a strut property. Four values are a legacy `_NET_WM_STRUT`
/// covering the whole edge, twelve are `_NET_WM_STRUT_PARTIAL`.
pub fn parse_reservations(values: &[u32]) -> Vec<Reservation> {
    const EDGES: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];
    let partial = values.len() >= STRUT_PARTIAL_LEN;
    if values.len() < STRUT_LEN {
        return Vec::new();
    }

    EDGES
        .iter()
        .enumerate()
        .filter(|(i, _)| values[*i] > 0)
        .map(|(i, edge)| {
            let (start, end) = if partial {
                (values[4 + i * 2] as i32, values[5 + i * 2] as i32)
            } else {
                (0, i32::MAX)
            };
            Reservation {
                edge: *edge,
                thickness: values[i].min(i32::MAX as u32) as i32,
                start,
                end,
            }
        })
        .collect()
}

/// Move `candidate` inward past every reservation on the same edge that
/// overlaps its span. The strip keeps its thickness.
pub fn adjust_for_reservations(
    edge: Edge,
    candidate: Rect,
    root_width: i32,
    root_height: i32,
    others: &[Reservation],
) -> Rect {
    let (span_start, span_end) = if edge.is_vertical() {
        (candidate.top, candidate.bottom - 1)
    } else {
        (candidate.left, candidate.right - 1)
    };
    let Some(thickest) = others
        .iter()
        .filter(|r| r.edge == edge && r.overlaps_span(span_start, span_end))
        .map(|r| r.thickness)
        .max()
    else {
        return candidate;
    };

    let mut rect = candidate;
    match edge {
        Edge::Left if thickest > rect.left => {
            let width = rect.width();
            rect.left = thickest;
            rect.right = thickest + width;
        }
        Edge::Right if root_width - thickest < rect.right => {
            let width = rect.width();
            rect.right = root_width - thickest;
            rect.left = rect.right - width;
        }
        Edge::Top if thickest > rect.top => {
            let height = rect.height();
            rect.top = thickest;
            rect.bottom = thickest + height;
        }
        Edge::Bottom if root_height - thickest < rect.bottom => {
            let height = rect.height();
            rect.bottom = root_height - thickest;
            rect.top = rect.bottom - height;
        }
        _ => {}
    }
    rect
}

/// App-bar transport publishing reservations as struts on the docked window
pub struct StrutTransport<'a> {
    ctx: &'a X11Context,
    registered: HashMap<Window, Edge>,
}

impl<'a> StrutTransport<'a> {
    pub fn new(ctx: &'a X11Context) -> Self {
        Self {
            ctx,
            registered: HashMap::new(),
        }
    }

    fn root_size(&self) -> Result<(i32, i32)> {
        let geom = self
            .ctx
            .conn
            .get_geometry(self.ctx.root())
            .context("Failed to query root window geometry")?
            .reply()
            .context("Failed to get root window geometry reply")?;
        Ok((geom.width as i32, geom.height as i32))
    }

    fn window_exists(&self, window: Window) -> Result<()> {
        self.ctx
            .conn
            .get_geometry(window)
            .context(format!("Failed to query window {}", window))?
            .reply()
            .context(format!("Window {} does not exist", window))?;
        Ok(())
    }

    /// Struts held by every managed client except `own`
    fn foreign_reservations(&self, own: Window) -> Result<Vec<Reservation>> {
        let atoms = &self.ctx.atoms;
        let clients = self
            .ctx
            .read_u32_list(self.ctx.root(), atoms.net_client_list, AtomEnum::WINDOW, u32::MAX)
            .context("Failed to read _NET_CLIENT_LIST")?;

        let mut reservations = Vec::new();
        for client in clients.into_iter().filter(|c| *c != own) {
            // Clients can disappear between listing and querying; skip them
            let Ok(mut values) = self.ctx.read_u32_list(
                client,
                atoms.net_wm_strut_partial,
                AtomEnum::CARDINAL,
                STRUT_PARTIAL_LEN as u32,
            ) else {
                continue;
            };
            if values.len() < STRUT_PARTIAL_LEN {
                values = self
                    .ctx
                    .read_u32_list(client, atoms.net_wm_strut, AtomEnum::CARDINAL, STRUT_LEN as u32)
                    .unwrap_or_default();
            }
            let found = parse_reservations(&values);
            if !found.is_empty() {
                debug!(client = client, reservations = ?found, "Found existing strut");
            }
            reservations.extend(found);
        }
        Ok(reservations)
    }

    fn handle(&mut self, message: AppBarMessage, data: &mut AppBarData) -> Result<()> {
        let window = data.window;
        let atoms = &self.ctx.atoms;
        match message {
            AppBarMessage::New => {
                self.window_exists(window)?;
                let edge = data.edge()?;
                self.registered.insert(window, edge);
            }
            AppBarMessage::QueryPos => {
                let edge = self.registered_edge(window)?;
                let (root_width, root_height) = self.root_size()?;
                let others = self.foreign_reservations(window)?;
                let adjusted = adjust_for_reservations(edge, data.rect(), root_width, root_height, &others);
                *data = data.with_rect(adjusted);
            }
            AppBarMessage::SetPos => {
                let edge = self.registered_edge(window)?;
                let (root_width, root_height) = self.root_size()?;
                let partial = strut_partial(edge, data.rect(), root_width, root_height);
                let conn = &self.ctx.conn;
                conn.change_property32(
                    PropMode::REPLACE,
                    window,
                    atoms.net_wm_strut_partial,
                    AtomEnum::CARDINAL,
                    &partial,
                )
                .context(format!("Failed to set _NET_WM_STRUT_PARTIAL on window {}", window))?;
                conn.change_property32(
                    PropMode::REPLACE,
                    window,
                    atoms.net_wm_strut,
                    AtomEnum::CARDINAL,
                    &partial[..STRUT_LEN],
                )
                .context(format!("Failed to set _NET_WM_STRUT on window {}", window))?;
                conn.flush().context("Failed to flush X11 connection after setting strut")?;
                info!(window = window, strut = ?partial, "Published strut");
            }
            AppBarMessage::Remove => {
                self.registered.remove(&window);
                let conn = &self.ctx.conn;
                conn.delete_property(window, atoms.net_wm_strut_partial)
                    .context(format!("Failed to delete _NET_WM_STRUT_PARTIAL on window {}", window))?;
                conn.delete_property(window, atoms.net_wm_strut)
                    .context(format!("Failed to delete _NET_WM_STRUT on window {}", window))?;
                conn.flush().context("Failed to flush X11 connection after removing strut")?;
            }
        }
        Ok(())
    }

    fn registered_edge(&self, window: Window) -> Result<Edge> {
        self.registered
            .get(&window)
            .copied()
            .context(format!("Window {} has no app-bar registration", window))
    }
}

impl AppBarTransport for StrutTransport<'_> {
    fn send(&mut self, message: AppBarMessage, data: &mut AppBarData) -> DockResult<()> {
        let window = data.window;
        self.handle(message, data).map_err(|e| {
            if message == AppBarMessage::New {
                DockError::resolution(window, e)
            } else {
                DockError::protocol(message.name(), e)
            }
        })
    }
}
