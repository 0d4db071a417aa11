use bitflags::bitflags;

use crate::error::DockResult;
use crate::geometry::{Rect, WindowGeometry, WindowId};

bitflags! {
    /// Window presentation attributes toggled between free-floating and docked
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChromeFlags: u32 {
        /// Title bar and border drawn by the window manager
        const DECORATED = 1 << 0;
        /// Stacked above normal windows
        const STAYS_ON_TOP = 1 << 1;
        /// Hidden from taskbars and pagers
        const SKIP_TASKBAR = 1 << 2;
    }
}

impl ChromeFlags {
    /// Style used when no saved flags are available
    pub fn bordered() -> Self {
        ChromeFlags::DECORATED
    }

    /// Chromeless, always-on-top variant of `self`
    pub fn docked(self) -> Self {
        (self - ChromeFlags::DECORATED) | ChromeFlags::STAYS_ON_TOP | ChromeFlags::SKIP_TASKBAR
    }
}

/// Capabilities the dock needs from the window it manages
pub trait HostWindow {
    fn id(&self) -> WindowId;

    fn geometry(&self) -> DockResult<WindowGeometry>;

    fn set_geometry(&mut self, geometry: WindowGeometry) -> DockResult<()>;

    fn chrome(&self) -> DockResult<ChromeFlags>;

    fn set_chrome(&mut self, flags: ChromeFlags) -> DockResult<()>;

    /// Move to `rect` and raise above other windows without taking focus
    fn place_above(&mut self, rect: Rect) -> DockResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docked_strips_decorations() {
        let docked = ChromeFlags::bordered().docked();
        assert!(!docked.contains(ChromeFlags::DECORATED));
        assert!(docked.contains(ChromeFlags::STAYS_ON_TOP | ChromeFlags::SKIP_TASKBAR));
    }

    #[test]
    fn test_docked_from_empty() {
        assert_eq!(
            ChromeFlags::empty().docked(),
            ChromeFlags::STAYS_ON_TOP | ChromeFlags::SKIP_TASKBAR
        );
    }
}
