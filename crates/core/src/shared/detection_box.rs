/// An axis-aligned face rectangle in color-frame pixel coordinates.
///
/// Boxes carry no identity: every frame's detections are independent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub score: f32,
}

impl DetectionBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32, score: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            score,
        }
    }

    /// Builds a box from corner coordinates, truncating toward zero.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, score: f32) -> Self {
        Self::new(
            x1 as i32,
            y1 as i32,
            (x2 - x1).max(0.0) as i32,
            (y2 - y1).max(0.0) as i32,
            score,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Intersection with the `frame_width x frame_height` image rectangle.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> DetectionBox {
        let fw = frame_width as i64;
        let fh = frame_height as i64;
        let x1 = (self.x as i64).clamp(0, fw);
        let y1 = (self.y as i64).clamp(0, fh);
        let x2 = (self.x as i64 + self.width as i64).clamp(0, fw);
        let y2 = (self.y as i64 + self.height as i64).clamp(0, fh);
        DetectionBox::new(
            x1 as i32,
            y1 as i32,
            (x2 - x1).max(0) as i32,
            (y2 - y1).max(0) as i32,
            self.score,
        )
    }

    /// Square box sharing this box's center, with side `max(w, h) * scale`.
    ///
    /// The result is not clamped; callers sample out-of-frame pixels as black.
    pub fn square_around(&self, scale: f64) -> DetectionBox {
        let (cx, cy) = self.center();
        let side = (self.width.max(self.height) as f64 * scale).round().max(1.0);
        DetectionBox::new(
            (cx - side / 2.0).round() as i32,
            (cy - side / 2.0).round() as i32,
            side as i32,
            side as i32,
            self.score,
        )
    }
}
