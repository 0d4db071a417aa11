//! App-bar protocol client
//!
//! A reservation is negotiated with four messages sharing one fixed record:
//! `New` announces the bar, `QueryPos` lets the window manager move the
//! proposed rectangle clear of other bars, `SetPos` commits it and `Remove`
//! releases it. The transport that actually talks to the window manager sits
//! behind [`AppBarTransport`].

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::constants::appbar::{NO_CALLBACK_MESSAGE, NO_PARAM};
use crate::error::{DockError, DockResult};
use crate::geometry::{Edge, Rect, WindowId};

/// Message codes of the reservation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppBarMessage {
    New = 0,
    Remove = 1,
    QueryPos = 2,
    SetPos = 3,
}

impl AppBarMessage {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            AppBarMessage::New => "register",
            AppBarMessage::Remove => "remove",
            AppBarMessage::QueryPos => "query position",
            AppBarMessage::SetPos => "set position",
        }
    }
}

/// Fixed binary record exchanged with the window manager
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppBarData {
    pub size: u32,
    pub window: WindowId,
    pub callback_message: u32,
    pub edge: u32,
    pub rect: [i32; 4],
    pub lparam: i32,
}

impl AppBarData {
    pub fn new(window: WindowId, edge: Edge) -> Self {
        Self {
            size: std::mem::size_of::<AppBarData>() as u32,
            window,
            callback_message: NO_CALLBACK_MESSAGE,
            edge: edge.wire_value(),
            rect: [0; 4],
            lparam: NO_PARAM,
        }
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = [rect.left, rect.top, rect.right, rect.bottom];
        self
    }

    pub fn rect(&self) -> Rect {
        let [left, top, right, bottom] = self.rect;
        Rect { left, top, right, bottom }
    }

    /// Edge field decoded; out-of-range values are a protocol error
    pub fn edge(&self) -> DockResult<Edge> {
        Edge::from_wire(self.edge)
            .ok_or_else(|| DockError::protocol("decode", format!("invalid edge value {}", self.edge)))
    }
}

/// Delivers one message to the window manager.
///
/// `QueryPos` may rewrite `data.rect` in place; every other message leaves it
/// untouched unless the window manager says otherwise.
pub trait AppBarTransport {
    fn send(&mut self, message: AppBarMessage, data: &mut AppBarData) -> DockResult<()>;
}

/// Token for a live reservation. Not clonable: it is consumed by `unregister`.
#[derive(Debug, PartialEq, Eq)]
pub struct AppBarHandle {
    window: WindowId,
    edge: Edge,
}

impl AppBarHandle {
    fn record(&self) -> AppBarData {
        AppBarData::new(self.window, self.edge)
    }
}

/// Protocol client on top of a transport. Never retries: a repeated `New`
/// would create a second reservation.
pub struct ShellBarRegistrar<T: AppBarTransport> {
    transport: T,
    live: HashSet<WindowId>,
}

impl<T: AppBarTransport> ShellBarRegistrar<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            live: HashSet::new(),
        }
    }

    /// Whether `window` currently holds a reservation made through this registrar
    pub fn is_registered(&self, window: WindowId) -> bool {
        self.live.contains(&window)
    }

    /// Announce a new bar for `window` on `edge`. No rectangle is committed yet.
    pub fn register(&mut self, window: WindowId, edge: Edge) -> DockResult<AppBarHandle> {
        if self.live.contains(&window) {
            return Err(DockError::protocol(
                AppBarMessage::New.name(),
                format!("window {window:#x} already holds a reservation"),
            ));
        }

        let mut data = AppBarData::new(window, edge);
        self.transport.send(AppBarMessage::New, &mut data)?;
        self.live.insert(window);
        info!(window = window, edge = %edge, "Registered app-bar");
        Ok(AppBarHandle { window, edge })
    }

    /// Propose `candidate` and return the rectangle the window manager accepts
    pub fn query_position(&mut self, handle: &AppBarHandle, candidate: Rect) -> DockResult<Rect> {
        let mut data = handle.record().with_rect(candidate);
        self.transport.send(AppBarMessage::QueryPos, &mut data)?;
        let adjusted = data.rect();
        if adjusted != candidate {
            info!(candidate = ?candidate, adjusted = ?adjusted, "Window manager adjusted app-bar rectangle");
        } else {
            debug!(rect = ?adjusted, "App-bar rectangle accepted as proposed");
        }
        Ok(adjusted)
    }

    /// Commit `rect` as the live reservation and return what was committed
    pub fn set_position(&mut self, handle: &AppBarHandle, rect: Rect) -> DockResult<Rect> {
        if rect.is_empty() {
            return Err(DockError::protocol(
                AppBarMessage::SetPos.name(),
                format!("refusing to commit empty rectangle {rect:?}"),
            ));
        }
        let mut data = handle.record().with_rect(rect);
        self.transport.send(AppBarMessage::SetPos, &mut data)?;
        let committed = data.rect();
        info!(window = handle.window, rect = ?committed, "Committed app-bar position");
        Ok(committed)
    }

    /// Release a reservation. `None` is a no-op and sends nothing.
    ///
    /// The handle is consumed even if the window manager reports an error, so
    /// the caller never ends up holding a handle for a reservation it already
    /// asked to remove.
    pub fn unregister(&mut self, handle: Option<AppBarHandle>) -> DockResult<()> {
        let Some(handle) = handle else {
            debug!("unregister called without a live handle");
            return Ok(());
        };

        self.live.remove(&handle.window);
        let mut data = handle.record();
        match self.transport.send(AppBarMessage::Remove, &mut data) {
            Ok(()) => {
                info!(window = handle.window, edge = %handle.edge, "Removed app-bar");
                Ok(())
            }
            Err(e) => {
                warn!(window = handle.window, error = %e, "Failed to remove app-bar");
                Err(e)
            }
        }
    }
}
