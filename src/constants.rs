//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// X11 / EWMH protocol constants
pub mod x11 {
    /// Source indication for _NET_WM_STATE and _NET_ACTIVE_WINDOW (2 = pager/direct user action)
    pub const SOURCE_PAGER: u32 = 2;

    /// _NET_WM_STATE action: remove the property
    pub const NET_WM_STATE_REMOVE: u32 = 0;

    /// _NET_WM_STATE action: add the property
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// _MOTIF_WM_HINTS flag marking the decorations field as valid
    pub const MOTIF_HINTS_DECORATIONS: u32 = 1 << 1;

    /// _MOTIF_WM_HINTS decorations value for "all decorations"
    pub const MOTIF_DECOR_ALL: u32 = 1;

    /// Number of CARD32 fields in _MOTIF_WM_HINTS
    pub const MOTIF_HINTS_LEN: usize = 5;

    /// Number of CARD32 fields in _NET_WM_STRUT_PARTIAL
    pub const STRUT_PARTIAL_LEN: usize = 12;

    /// Number of CARD32 fields in _NET_WM_STRUT
    pub const STRUT_LEN: usize = 4;
}

/// App-bar message protocol constants
pub mod appbar {
    /// Callback message id placed in every record (no callbacks are consumed)
    pub const NO_CALLBACK_MESSAGE: u32 = 0;

    /// Reserved parameter placed in every record
    pub const NO_PARAM: i32 = 0;
}

/// Config file location
pub mod config {
    /// Directory under the user's config dir
    pub const APP_DIR: &str = "sidebar-dock";

    /// Config file name
    pub const FILENAME: &str = "sidebar.json";
}

/// Default dock parameters
pub mod defaults {
    /// Width of the reserved strip in pixels
    pub const WIDTH: u32 = 300;

    /// Distance from the top of the monitor in pixels
    pub const TOP_OFFSET: u32 = 0;

    /// Persist on every mutation and transition
    pub const AUTO_SAVE: bool = true;
}

/// Config value validation ranges
pub mod validation {
    /// Smallest accepted strip width / height
    pub const MIN_DIMENSION: u32 = 1;

    /// Largest accepted strip width / height
    pub const MAX_DIMENSION: u32 = 8192;

    /// Largest accepted top offset
    pub const MAX_TOP_OFFSET: u32 = 8192;
}
