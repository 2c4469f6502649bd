//! Virtualization window.

use std::ops::Range;

/// Rows to render for a scroll position.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualWindow {
    /// Row indices to render, overscan included.
    pub range: Range<usize>,
    /// Pixel offset of the first rendered row.
    pub offset_top: f64,
    /// Height of the whole scrollable content.
    pub total_height: f64,
}

/// Computes the rendered row range for fixed-height rows.
///
/// `overscan` extra rows are rendered on each side of the visible range.
/// A non-positive row height or viewport renders nothing.
pub fn visible_window(
    row_count: usize,
    row_height: f64,
    scroll_top: f64,
    viewport_height: f64,
    overscan: usize,
) -> VirtualWindow {
    if row_count == 0 || row_height <= 0.0 || viewport_height <= 0.0 {
        return VirtualWindow {
            range: 0..0,
            offset_top: 0.0,
            total_height: row_count as f64 * row_height.max(0.0),
        };
    }

    let total_height = row_count as f64 * row_height;
    let max_scroll = (total_height - viewport_height).max(0.0);
    let scroll_top = scroll_top.clamp(0.0, max_scroll);

    let first_visible = ((scroll_top / row_height).floor() as usize).min(row_count - 1);
    let visible_count = (viewport_height / row_height).ceil() as usize + 1;

    let start = first_visible.saturating_sub(overscan);
    let end = (first_visible + visible_count + overscan).min(row_count);

    VirtualWindow {
        range: start..end,
        offset_top: start as f64 * row_height,
        total_height,
    }
}

/// Scroll position that brings `index` into view, or `None` if it already is.
pub fn scroll_to_index(index: usize, row_height: f64, scroll_top: f64, viewport_height: f64) -> Option<f64> {
    let top = index as f64 * row_height;
    let bottom = top + row_height;
    if top < scroll_top {
        Some(top)
    } else if bottom > scroll_top + viewport_height {
        Some((bottom - viewport_height).max(0.0))
    } else {
        None
    }
}
