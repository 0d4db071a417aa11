use crate::error::DockResult;
use crate::geometry::{MonitorInfo, Rect, WindowId};

/// Looks up the display that currently owns a window.
///
/// Implementations must query fresh on every call; the window may have moved
/// to another display since the last lookup.
pub trait MonitorResolver {
    fn resolve(&self, window: WindowId) -> DockResult<MonitorInfo>;
}

/// A display as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub name: String,
    pub bounds: Rect,
    pub primary: bool,
}

/// Pick the display holding most of `window`.
///
/// Falls back to the display nearest the window centre when the window does
/// not overlap any display, then to the primary (or first) display.
pub fn pick_display<'d>(window: &Rect, displays: &'d [Display]) -> Option<&'d Display> {
    let best_overlap = displays
        .iter()
        .map(|d| (d, d.bounds.intersect(window).area()))
        .filter(|(_, area)| *area > 0)
        .max_by_key(|(_, area)| *area)
        .map(|(d, _)| d);
    if best_overlap.is_some() {
        return best_overlap;
    }

    let (cx, cy) = window.center();
    let nearest = displays.iter().min_by_key(|d| distance_sq(&d.bounds, cx, cy));
    nearest.or_else(|| displays.iter().find(|d| d.primary).or_else(|| displays.first()))
}

/// Squared distance from a point to the closest point of a rectangle
fn distance_sq(rect: &Rect, x: i32, y: i32) -> i64 {
    let dx = axis_gap(x, rect.left, rect.right) as i64;
    let dy = axis_gap(y, rect.top, rect.bottom) as i64;
    dx * dx + dy * dy
}

fn axis_gap(v: i32, start: i32, end: i32) -> i32 {
    if v < start {
        start - v
    } else if v >= end {
        v - end + 1
    } else {
        0
    }
}
