//! Target rectangle for a reserved strip
//!
//! The rectangle is always computed from the monitor's full bounds, not its
//! work area, so the strip spans the whole display height including any strip
//! a taskbar already reserved.

use crate::geometry::{Edge, Rect};

/// Compute the strip rectangle for `edge` on a monitor with bounds `full`.
///
/// `thickness` is the width for Left/Right and the height for Top/Bottom.
/// `length` of `None` fills the rest of the edge after `offset`.
/// Keeping the result inside `full` is up to the caller. Coordinates
/// saturate at the `i32` range instead of overflowing.
pub fn compute(edge: Edge, full: Rect, thickness: u32, length: Option<u32>, offset: u32) -> Rect {
    let px = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
    let thickness = px(thickness);
    let offset = px(offset);

    match edge {
        Edge::Left | Edge::Right => {
            let top = full.top.saturating_add(offset);
            let bottom = match length {
                Some(h) => top.saturating_add(px(h)),
                None => full.bottom,
            };
            let (left, right) = if edge == Edge::Left {
                (full.left, full.left.saturating_add(thickness))
            } else {
                (full.right.saturating_sub(thickness), full.right)
            };
            Rect { left, top, right, bottom }
        }
        Edge::Top | Edge::Bottom => {
            let left = full.left.saturating_add(offset);
            let right = match length {
                Some(w) => left.saturating_add(px(w)),
                None => full.right,
            };
            let (top, bottom) = if edge == Edge::Top {
                (full.top, full.top.saturating_add(thickness))
            } else {
                (full.bottom.saturating_sub(thickness), full.bottom)
            };
            Rect { left, top, right, bottom }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HD: Rect = Rect::new(0, 0, 1920, 1080);

    #[test]
    fn test_left_full_height() {
        assert_eq!(compute(Edge::Left, FULL_HD, 300, None, 0), Rect::new(0, 0, 300, 1080));
    }

    #[test]
    fn test_right_with_offset() {
        assert_eq!(compute(Edge::Right, FULL_HD, 300, None, 50), Rect::new(1620, 50, 1920, 1080));
    }

    #[test]
    fn test_explicit_height() {
        let rect = compute(Edge::Left, FULL_HD, 250, Some(600), 100);
        assert_eq!(rect, Rect::new(0, 100, 250, 700));
    }

    #[test]
    fn test_secondary_monitor_offsets() {
        // Monitor placed to the right of a 1920 wide primary, with a taller panel
        let full = Rect::new(1920, -200, 4480, 1240);
        let left = compute(Edge::Left, full, 320, None, 40);
        assert_eq!(left, Rect::new(1920, -160, 2240, 1240));
        let right = compute(Edge::Right, full, 320, None, 0);
        assert_eq!(right, Rect::new(4160, -200, 4480, 1240));
    }

    #[test]
    fn test_side_edges_dimensions_hold_for_many_inputs() {
        let monitors = [
            Rect::new(0, 0, 1920, 1080),
            Rect::new(-1280, 0, 0, 1024),
            Rect::new(2560, 360, 5120, 1800),
        ];
        for full in monitors {
            for width in [1u32, 64, 300, 1000] {
                for offset in [0u32, 1, 50, 300] {
                    for edge in [Edge::Left, Edge::Right] {
                        let rect = compute(edge, full, width, None, offset);
                        assert_eq!(rect.width(), width as i32);
                        assert_eq!(rect.height(), full.bottom - full.top - offset as i32);
                        match edge {
                            Edge::Left => assert_eq!(rect.left, full.left),
                            _ => assert_eq!(rect.right, full.right),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_huge_inputs_saturate() {
        let right = compute(Edge::Right, FULL_HD, u32::MAX, None, 0);
        assert_eq!(right, Rect::new(1920 - i32::MAX, 0, 1920, 1080));

        let left = compute(Edge::Left, Rect::new(1920, 0, 3840, 1080), 2_147_483_648, Some(u32::MAX), u32::MAX);
        assert_eq!(left.right, i32::MAX);
        assert_eq!(left.top, i32::MAX);
        assert_eq!(left.bottom, i32::MAX);
    }

    #[test]
    fn test_top_and_bottom_swap_axes() {
        assert_eq!(compute(Edge::Top, FULL_HD, 40, None, 0), Rect::new(0, 0, 1920, 40));
        assert_eq!(compute(Edge::Bottom, FULL_HD, 40, Some(800), 100), Rect::new(100, 1040, 900, 1080));
    }
}
