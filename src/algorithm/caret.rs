use crate::models::geometry::{Point, Rect};

/// Width oracle for caret estimation. Adapters back this with whatever text
/// measurement the toolkit offers; tests use a fixed advance.
pub trait TextMeasure {
    fn width_of(&self, text: &str) -> f64;
}

/// Fixed-advance measurer for fonts whose metrics are not queryable; the
/// advance is an average glyph width in pixels.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceMeasure {
    pub char_width: f64,
}

impl TextMeasure for FixedAdvanceMeasure {
    fn width_of(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width.max(0.1)
    }
}

/// Estimates the caret char offset for a dwell point inside a text block.
///
/// Used when the surface exposes no native point-to-offset resolution: the
/// line comes from the vertical position and line height, the column from a
/// binary search of measured prefix widths against the horizontal position,
/// snapping to the nearer glyph boundary. The result is a char offset into
/// `text`, clamped to valid caret positions.
pub fn caret_offset_at_point(
    text: &str,
    rect: Rect,
    point: Point,
    line_height: f64,
    measure: &dyn TextMeasure,
) -> usize {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.is_empty() {
        return 0;
    }

    let safe_line_height = if line_height.is_finite() && line_height > 0.0 {
        line_height
    } else {
        rect.height.max(1.0) / lines.len() as f64
    };

    let local_y = (point.y - rect.y).max(0.0);
    let line_index = ((local_y / safe_line_height) as usize).min(lines.len() - 1);

    let local_x = (point.x - rect.x).max(0.0);
    let column = column_at_x(lines[line_index], local_x, measure);

    // Char offset of the line start: preceding line lengths plus their '\n'.
    let line_start: usize = lines[..line_index]
        .iter()
        .map(|line| line.chars().count() + 1)
        .sum();

    line_start + column
}

/// Binary search over prefix widths: largest prefix not wider than `x`, then
/// snap to whichever neighboring boundary is closer.
fn column_at_x(line: &str, x: f64, measure: &dyn TextMeasure) -> usize {
    let chars: Vec<char> = line.chars().collect();
    let total = chars.len();
    if total == 0 {
        return 0;
    }

    let prefix_width = |count: usize| -> f64 {
        let prefix: String = chars[..count].iter().collect();
        measure.width_of(&prefix)
    };

    if x >= prefix_width(total) {
        return total;
    }

    let mut lo = 0usize;
    let mut hi = total;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if prefix_width(mid) <= x {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    if lo < total {
        let here = prefix_width(lo);
        let next = prefix_width(lo + 1);
        if (next - x) < (x - here) {
            return lo + 1;
        }
    }

    lo
}
