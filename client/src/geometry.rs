use floorplan_shared::{CanvasPoint, CanvasRect, CANVAS_HEIGHT, CANVAS_WIDTH};

pub const HANDLE_SIZE: f64 = 10.0;
pub const MIN_BOOTH_SIZE: f64 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, point: CanvasPoint) -> (f64, f64) {
        (
            point.x * self.zoom + self.pan_x,
            point.y * self.zoom + self.pan_y,
        )
    }

    pub fn screen_to_world(&self, x: f64, y: f64) -> Option<CanvasPoint> {
        let point = CanvasPoint::new((x - self.pan_x) / self.zoom, (y - self.pan_y) / self.zoom);
        point.is_finite().then_some(point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn point(self, rect: &CanvasRect) -> CanvasPoint {
        match self {
            Corner::TopLeft => CanvasPoint::new(rect.x, rect.y),
            Corner::TopRight => CanvasPoint::new(rect.right(), rect.y),
            Corner::BottomLeft => CanvasPoint::new(rect.x, rect.bottom()),
            Corner::BottomRight => CanvasPoint::new(rect.right(), rect.bottom()),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// Which resize handle of `rect` (if any) sits under the screen point.
pub fn handle_hit_test(
    viewport: &Viewport,
    rect: &CanvasRect,
    screen_x: f64,
    screen_y: f64,
) -> Option<Corner> {
    Corner::ALL.into_iter().find(|corner| {
        let (cx, cy) = viewport.world_to_screen(corner.point(rect));
        hit_rect(screen_x, screen_y, cx, cy, HANDLE_SIZE)
    })
}

fn hit_rect(x: f64, y: f64, cx: f64, cy: f64, size: f64) -> bool {
    let half = size / 2.0;
    x >= cx - half && x <= cx + half && y >= cy - half && y <= cy + half
}

/// Rectangle spanned by a fixed anchor corner and the pointer, never smaller
/// than `MIN_BOOTH_SIZE` on either side and kept on the canvas.
pub fn resize_from_anchor(anchor: CanvasPoint, pointer: CanvasPoint) -> CanvasRect {
    let pointer = CanvasPoint::new(
        pointer.x.clamp(0.0, CANVAS_WIDTH),
        pointer.y.clamp(0.0, CANVAS_HEIGHT),
    );
    let width = (pointer.x - anchor.x).abs().max(MIN_BOOTH_SIZE);
    let depth = (pointer.y - anchor.y).abs().max(MIN_BOOTH_SIZE);
    let x = if pointer.x < anchor.x {
        anchor.x - width
    } else {
        anchor.x
    };
    let y = if pointer.y < anchor.y {
        anchor.y - depth
    } else {
        anchor.y
    };
    clamp_to_canvas(CanvasRect::new(x, y, width, depth))
}

/// Slides a rectangle back inside the canvas without changing its size.
pub fn clamp_to_canvas(rect: CanvasRect) -> CanvasRect {
    let width = rect.width.min(CANVAS_WIDTH);
    let depth = rect.depth.min(CANVAS_HEIGHT);
    CanvasRect::new(
        rect.x.clamp(0.0, CANVAS_WIDTH - width),
        rect.y.clamp(0.0, CANVAS_HEIGHT - depth),
        width,
        depth,
    )
}

pub fn pinch_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn screen_and_world_round_trip_through_the_viewport() {
        let viewport = Viewport {
            zoom: 2.0,
            pan_x: 30.0,
            pan_y: -10.0,
        };
        let (x, y) = viewport.world_to_screen(CanvasPoint::new(100.0, 50.0));
        assert_eq!((x, y), (230.0, 90.0));
        assert_eq!(
            viewport.screen_to_world(x, y),
            Some(CanvasPoint::new(100.0, 50.0))
        );
    }

    #[test]
    fn handles_are_found_at_scaled_corners() {
        let viewport = Viewport {
            zoom: 2.0,
            ..Viewport::default()
        };
        let rect = CanvasRect::new(10.0, 10.0, 40.0, 20.0);
        assert_eq!(
            handle_hit_test(&viewport, &rect, 100.0, 60.0),
            Some(Corner::BottomRight)
        );
        assert_eq!(
            handle_hit_test(&viewport, &rect, 22.0, 18.0),
            Some(Corner::TopLeft)
        );
        assert_eq!(handle_hit_test(&viewport, &rect, 60.0, 40.0), None);
    }

    #[test]
    fn resize_enforces_minimum_and_flips_across_anchor() {
        let anchor = CanvasPoint::new(200.0, 200.0);
        assert_eq!(
            resize_from_anchor(anchor, CanvasPoint::new(205.0, 300.0)),
            CanvasRect::new(200.0, 200.0, MIN_BOOTH_SIZE, 100.0)
        );
        assert_eq!(
            resize_from_anchor(anchor, CanvasPoint::new(150.0, 120.0)),
            CanvasRect::new(150.0, 120.0, 50.0, 80.0)
        );
    }

    #[test]
    fn clamping_keeps_the_rect_on_the_canvas() {
        assert_eq!(
            clamp_to_canvas(CanvasRect::new(1190.0, -5.0, 80.0, 60.0)),
            CanvasRect::new(1120.0, 0.0, 80.0, 60.0)
        );
    }
}
