use crate::models::geometry::{Point, ViewportSize};

/// Projects a point from the tracker viewport into the surface viewport.
///
/// Each axis is scaled independently by the ratio of the viewport sizes, so
/// the same semantic on-screen location lands on the matching pixel in either
/// space. A degenerate source or target dimension falls back to `1`, which
/// leaves the coordinate unscaled instead of dividing by zero.
pub fn map_point(point: Point, source: ViewportSize, target: ViewportSize) -> Point {
    let sx = safe_dimension(source.width);
    let sy = safe_dimension(source.height);
    let tx = safe_dimension(target.width);
    let ty = safe_dimension(target.height);

    Point {
        x: point.x * (tx / sx),
        y: point.y * (ty / sy),
    }
}

/// Same projection plus a constant calibration offset applied after scaling.
pub fn map_point_with_offset(
    point: Point,
    source: ViewportSize,
    target: ViewportSize,
    x_offset: f64,
    y_offset: f64,
) -> Point {
    map_point(point, source, target).offset_by(x_offset, y_offset)
}

fn safe_dimension(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}
