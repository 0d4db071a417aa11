//! Dock an existing top-level window as a sidebar along a monitor edge.
//!
//! The core ([`dock::SidebarDock`]) only talks to capability traits:
//! [`host::HostWindow`], [`monitor::MonitorResolver`] and
//! [`appbar::AppBarTransport`]. The [`x11`] module implements all three on
//! top of EWMH struts and RandR.

#![forbid(unsafe_code)]

pub mod appbar;
pub mod bar_rect;
pub mod config;
pub mod constants;
pub mod dock;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod monitor;
pub mod x11;

pub use appbar::{AppBarData, AppBarHandle, AppBarMessage, AppBarTransport, ShellBarRegistrar};
pub use config::{ConfigStore, ConfigUpdate, SidebarConfig};
pub use dock::{DockStatus, EmbedState, SidebarDock};
pub use error::{DockError, DockResult};
pub use events::DockEvent;
pub use geometry::{Edge, MonitorInfo, Rect, WindowGeometry, WindowId};
pub use host::{ChromeFlags, HostWindow};
pub use monitor::MonitorResolver;
