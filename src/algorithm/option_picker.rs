use crate::models::geometry::{Point, Rect, ViewportSize};

/// Row height sized for dwell pointing, not mouse precision.
const ROW_HEIGHT_PX: f64 = 44.0;
const MIN_WIDTH_PX: f64 = 180.0;

/// Mirrored option list standing in for a native selection control.
///
/// Native dropdown popups cannot be driven reliably with synthetic events
/// across embedding boundaries, so the engine lays out an equivalent flat list
/// anchored to the control and lets dwell activation operate on its rows. The
/// picker only models geometry and the highlighted row; rendering belongs to
/// the surface adapter.
#[derive(Debug, Clone)]
pub struct OptionPicker {
    options: Vec<String>,
    rows: Vec<Rect>,
    highlighted: Option<usize>,
}

impl OptionPicker {
    /// Lays the rows out against the anchor rect: below the control when they
    /// fit, above it otherwise, clamped into the viewport horizontally.
    pub fn layout(anchor: Rect, options: Vec<String>, viewport: ViewportSize) -> Self {
        let width = anchor.width.max(MIN_WIDTH_PX).min(viewport.width.max(1.0));
        let max_x = (viewport.width - width).max(0.0);
        let x = anchor.x.clamp(0.0, max_x);

        let total_height = ROW_HEIGHT_PX * options.len() as f64;
        let below_top = anchor.bottom();
        let above_top = anchor.y - total_height;

        let top = if below_top + total_height <= viewport.height || above_top < 0.0 {
            below_top
        } else {
            above_top
        };

        let rows = (0..options.len())
            .map(|index| Rect::new(x, top + ROW_HEIGHT_PX * index as f64, width, ROW_HEIGHT_PX))
            .collect();

        Self {
            options,
            rows,
            highlighted: None,
        }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn row_rect(&self, index: usize) -> Option<Rect> {
        self.rows.get(index).copied()
    }

    /// Index of the row under the point, if any.
    pub fn row_at(&self, point: Point) -> Option<usize> {
        self.rows.iter().position(|row| row.contains(point))
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn set_highlighted(&mut self, index: Option<usize>) {
        self.highlighted = match index {
            Some(value) if value < self.options.len() => Some(value),
            _ => None,
        };
    }
}
