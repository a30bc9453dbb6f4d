use crate::shared::detection_box::DetectionBox;

/// Candidate box in corner form, before suppression.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawDetection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

impl RawDetection {
    fn area(&self) -> f64 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &RawDetection) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clips to the frame and converts to an integer box.
    pub fn to_box(&self, frame_width: u32, frame_height: u32) -> DetectionBox {
        DetectionBox::from_corners(
            self.x1.clamp(0.0, frame_width as f64),
            self.y1.clamp(0.0, frame_height as f64),
            self.x2.clamp(0.0, frame_width as f64),
            self.y2.clamp(0.0, frame_height as f64),
            self.score as f32,
        )
    }
}

/// Greedy non-maximum suppression over the `top_k` best candidates.
pub(crate) fn nms(mut dets: Vec<RawDetection>, iou_thresh: f64, top_k: usize) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    dets.truncate(top_k);

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        if keep.iter().all(|k| k.iou(&det) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}
