//! In-place drawing of detections, landmarks and status text.
//!
//! All primitives clip silently: coordinates outside the frame are skipped.

use crate::shared::detection_box::DetectionBox;
use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::landmark_set::{FrameAnnotations, LandmarkSet};

/// Color in red, green, blue order; converted to the frame's layout on write.
pub type Rgb = [u8; 3];

pub const GREEN: Rgb = [0, 255, 0];
pub const WHITE: Rgb = [255, 255, 255];

const LANDMARK_RADIUS: i32 = 1;
const TEXT_SCALE: i32 = 3;
const TEXT_MARGIN: i32 = 8;

/// Point index ranges of the 68-point layout that form open contours.
const CONTOURS_68: &[(usize, usize)] = &[
    (0, 17),  // jaw
    (17, 22), // right brow
    (22, 27), // left brow
    (27, 31), // nose bridge
    (31, 36), // lower nose
];

/// Closed loops of the 68-point layout.
const LOOPS_68: &[(usize, usize)] = &[
    (36, 42), // right eye
    (42, 48), // left eye
    (48, 60), // outer lips
    (60, 68), // inner lips
];

/// Draws every box and landmark set of the current frame.
pub fn annotate(frame: &mut Frame, annotations: &FrameAnnotations) {
    for face in annotations.faces() {
        draw_box(frame, face, GREEN);
    }
    for set in annotations.landmarks() {
        draw_landmarks(frame, set, GREEN);
    }
}

/// One-pixel rectangle outline. Edges outside the frame are not drawn.
pub fn draw_box(frame: &mut Frame, bbox: &DetectionBox, color: Rgb) {
    let (fw, fh) = (frame.width(), frame.height());
    let visible = bbox.clamped(fw, fh);
    if bbox.is_empty() || visible.is_empty() {
        return;
    }
    let left_in = bbox.x >= 0;
    let top_in = bbox.y >= 0;
    let right_in = bbox.x as i64 + bbox.width as i64 <= fw as i64;
    let bottom_in = bbox.y as i64 + bbox.height as i64 <= fh as i64;

    let x2 = visible.x + visible.width - 1;
    let y2 = visible.y + visible.height - 1;
    for x in visible.x..=x2 {
        if top_in {
            put_pixel(frame, x, visible.y, color);
        }
        if bottom_in {
            put_pixel(frame, x, y2, color);
        }
    }
    for y in visible.y..=y2 {
        if left_in {
            put_pixel(frame, visible.x, y, color);
        }
        if right_in {
            put_pixel(frame, x2, y, color);
        }
    }
}

/// Dots for every point, plus facial contours for 68-point sets.
pub fn draw_landmarks(frame: &mut Frame, set: &LandmarkSet, color: Rgb) {
    let points = set.points();
    if points.len() == 68 {
        for &(start, end) in CONTOURS_68 {
            draw_polyline(frame, &points[start..end], false, color);
        }
        for &(start, end) in LOOPS_68 {
            draw_polyline(frame, &points[start..end], true, color);
        }
    }
    for &(x, y) in points.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
        draw_dot(frame, (x.round() as i32, y.round() as i32), LANDMARK_RADIUS, color);
    }
}

/// `FPS: <n>` in the top-left corner.
pub fn draw_fps(frame: &mut Frame, fps: u32) {
    draw_text(frame, TEXT_MARGIN, TEXT_MARGIN, &format!("FPS: {fps}"), TEXT_SCALE, WHITE);
}

/// Renders `text` with the built-in 3x5 font, `scale` pixels per font cell.
pub fn draw_text(frame: &mut Frame, x: i32, y: i32, text: &str, scale: i32, color: Rgb) {
    let scale = scale.max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        let rows = glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let px = pen_x + col * scale;
                let py = y + row as i32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put_pixel(frame, px + dx, py + dy, color);
                    }
                }
            }
        }
        pen_x += 4 * scale;
    }
}

fn draw_polyline(frame: &mut Frame, points: &[(f32, f32)], closed: bool, color: Rgb) {
    for pair in points.windows(2) {
        draw_line(frame, pair[0], pair[1], color);
    }
    if closed && points.len() > 2 {
        draw_line(frame, points[points.len() - 1], points[0], color);
    }
}

/// Bresenham line over the part of the segment inside the frame.
fn draw_line(frame: &mut Frame, p0: (f32, f32), p1: (f32, f32), color: Rgb) {
    let Some((p0, p1)) = clip_segment(p0, p1, frame.width(), frame.height()) else {
        return;
    };
    let (mut x0, mut y0) = (p0.0.round() as i32, p0.1.round() as i32);
    let (x1, y1) = (p1.0.round() as i32, p1.1.round() as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel(frame, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Liang-Barsky clip of a segment to `[0, w-1] x [0, h-1]`.
///
/// `None` when the segment misses the frame or has a non-finite endpoint.
fn clip_segment(
    p0: (f32, f32),
    p1: (f32, f32),
    width: u32,
    height: u32,
) -> Option<((f64, f64), (f64, f64))> {
    let (x0, y0) = (p0.0 as f64, p0.1 as f64);
    let (dx, dy) = (p1.0 as f64 - x0, p1.1 as f64 - y0);
    if ![x0, y0, dx, dy].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (x_max, y_max) = (width as f64 - 1.0, height as f64 - 1.0);

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0), (dx, x_max - x0), (-dy, y0), (dy, y_max - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        (x0 + t0 * dx, y0 + t0 * dy),
        (x0 + t1 * dx, y0 + t1 * dy),
    ))
}

fn draw_dot(frame: &mut Frame, center: (i32, i32), radius: i32, color: Rgb) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(frame, cx.saturating_add(dx), cy.saturating_add(dy), color);
            }
        }
    }
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: Rgb) {
    if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
        return;
    }
    let format = frame.format();
    let channels = frame.channels() as usize;
    let idx = (y as usize * frame.width() as usize + x as usize) * channels;
    let data = frame.data_mut();
    match format {
        PixelFormat::Rgb8 => data[idx..idx + 3].copy_from_slice(&color),
        PixelFormat::Bgr8 => data[idx..idx + 3].copy_from_slice(&[color[2], color[1], color[0]]),
        PixelFormat::Gray8 => data[idx] = color.iter().copied().max().unwrap_or(0),
    }
}

/// Rows of a 3x5 glyph, most significant of the low three bits leftmost.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => [0; 5],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &Frame, x: u32, y: u32) -> &[u8] {
        let c = frame.channels() as usize;
        let idx = (y * frame.width()) as usize * c + x as usize * c;
        &frame.data()[idx..idx + c]
    }

    fn lit_count(frame: &Frame) -> usize {
        frame
            .data()
            .chunks(frame.channels() as usize)
            .filter(|p| p.iter().any(|&v| v > 0))
            .count()
    }

    #[test]
    fn test_draw_box_outline_only() {
        let mut frame = Frame::blank(20, 20, PixelFormat::Rgb8);
        draw_box(&mut frame, &DetectionBox::new(5, 5, 10, 10, 1.0), GREEN);

        assert_eq!(pixel(&frame, 5, 5), &GREEN);
        assert_eq!(pixel(&frame, 14, 14), &GREEN);
        assert_eq!(pixel(&frame, 14, 5), &GREEN);
        assert_eq!(pixel(&frame, 10, 10), &[0, 0, 0]);
        // perimeter of a 10x10 square
        assert_eq!(lit_count(&frame), 36);
    }

    #[test]
    fn test_draw_box_clips_at_edges() {
        let mut frame = Frame::blank(10, 10, PixelFormat::Rgb8);
        draw_box(&mut frame, &DetectionBox::new(-5, -5, 30, 30, 1.0), GREEN);
        assert_eq!(lit_count(&frame), 0);

        draw_box(&mut frame, &DetectionBox::new(-5, 2, 10, 3, 1.0), GREEN);
        assert_eq!(pixel(&frame, 4, 2), &GREEN);
    }

    #[test]
    fn test_draw_box_far_off_frame_is_cheap_and_clipped() {
        let mut frame = Frame::blank(10, 10, PixelFormat::Rgb8);
        draw_box(&mut frame, &DetectionBox::new(-2_000_000_000, 3, i32::MAX, 4, 1.0), GREEN);
        // only the top and bottom edges cross the frame
        assert_eq!(pixel(&frame, 0, 3), &GREEN);
        assert_eq!(pixel(&frame, 9, 6), &GREEN);
        assert_eq!(pixel(&frame, 5, 4), &[0, 0, 0]);
        assert_eq!(lit_count(&frame), 20);
    }

    #[test]
    fn test_empty_box_draws_nothing() {
        let mut frame = Frame::blank(10, 10, PixelFormat::Rgb8);
        draw_box(&mut frame, &DetectionBox::new(2, 2, 0, 5, 1.0), GREEN);
        assert_eq!(lit_count(&frame), 0);
    }

    #[test]
    fn test_bgr_frames_receive_swapped_channels() {
        let mut frame = Frame::blank(4, 4, PixelFormat::Bgr8);
        put_pixel(&mut frame, 1, 1, [10, 20, 30]);
        assert_eq!(pixel(&frame, 1, 1), &[30, 20, 10]);
    }

    #[test]
    fn test_gray_frames_receive_brightest_channel() {
        let mut frame = Frame::blank(4, 4, PixelFormat::Gray8);
        put_pixel(&mut frame, 2, 3, GREEN);
        assert_eq!(pixel(&frame, 2, 3), &[255]);
    }

    #[test]
    fn test_five_point_landmarks_are_dots() {
        let mut frame = Frame::blank(50, 50, PixelFormat::Rgb8);
        let face = DetectionBox::new(0, 0, 50, 50, 1.0);
        let points = vec![(10.0, 10.0), (30.0, 10.0), (20.0, 20.0), (12.0, 30.0), (28.0, 30.0)];
        draw_landmarks(&mut frame, &LandmarkSet::new(face, points), GREEN);

        assert_eq!(pixel(&frame, 20, 20), &GREEN);
        assert_eq!(pixel(&frame, 21, 20), &GREEN);
        // no lines between points
        assert_eq!(pixel(&frame, 15, 10), &[0, 0, 0]);
        // five plus-shaped dots of five pixels
        assert_eq!(lit_count(&frame), 25);
    }

    #[test]
    fn test_sixty_eight_point_landmarks_draw_contours() {
        let mut frame = Frame::blank(100, 100, PixelFormat::Rgb8);
        let face = DetectionBox::new(0, 0, 100, 100, 1.0);
        let points: Vec<(f32, f32)> = (0..68).map(|i| (10.0 + i as f32, 50.0)).collect();
        draw_landmarks(&mut frame, &LandmarkSet::new(face, points), GREEN);
        // jaw runs along y=50 from x=10 to x=26 without gaps
        for x in 10..=26 {
            assert_eq!(pixel(&frame, x, 50), &GREEN, "gap at x={x}");
        }
    }

    #[test]
    fn test_draw_line_diagonal() {
        let mut frame = Frame::blank(10, 10, PixelFormat::Gray8);
        draw_line(&mut frame, (0.0, 0.0), (9.0, 9.0), WHITE);
        for i in 0..10 {
            assert_eq!(pixel(&frame, i, i), &[255]);
        }
        assert_eq!(lit_count(&frame), 10);
    }

    #[test]
    fn test_far_off_frame_contours_are_clipped() {
        let mut frame = Frame::blank(8, 8, PixelFormat::Gray8);
        let face = DetectionBox::new(0, 0, 8, 8, 1.0);
        let mut points = vec![(4.0, 4.0); 68];
        points[0] = (-1.5e9, 0.0);
        points[1] = (1.5e9, 0.0);
        points[2] = (f32::NAN, 2.0);
        points[3] = (f32::INFINITY, 3.0);

        draw_landmarks(&mut frame, &LandmarkSet::new(face, points), WHITE);

        // the huge first jaw segment crosses row 0 edge to edge
        for x in 0..8 {
            assert_eq!(pixel(&frame, x, 0), &[255], "gap at x={x}");
        }
        assert_eq!(pixel(&frame, 4, 4), &[255]);
    }

    #[test]
    fn test_clip_segment_rejects_misses_and_non_finite() {
        assert!(clip_segment((-5.0, -5.0), (-1.0, 20.0), 10, 10).is_none());
        assert!(clip_segment((0.0, 0.0), (f32::NAN, 1.0), 10, 10).is_none());
        let (a, b) = clip_segment((-10.0, 5.0), (20.0, 5.0), 10, 10).unwrap();
        assert!(a.0.abs() < 1e-9 && (b.0 - 9.0).abs() < 1e-9);
        assert_eq!((a.1, b.1), (5.0, 5.0));
    }

    #[test]
    fn test_draw_text_renders_digit() {
        let mut frame = Frame::blank(10, 10, PixelFormat::Gray8);
        draw_text(&mut frame, 0, 0, "1", 1, WHITE);
        // '1' glyph has 8 lit cells
        assert_eq!(lit_count(&frame), 8);
        assert_eq!(pixel(&frame, 1, 0), &[255]);
        assert_eq!(pixel(&frame, 0, 0), &[0]);
    }

    #[test]
    fn test_draw_fps_marks_top_left() {
        let mut frame = Frame::blank(200, 60, PixelFormat::Rgb8);
        draw_fps(&mut frame, 30);
        assert!(lit_count(&frame) > 0);
        // nothing drawn outside the text band
        for x in 0..200 {
            assert_eq!(pixel(&frame, x, 59), &[0, 0, 0]);
        }
    }

    #[test]
    fn test_annotate_draws_boxes_and_landmarks() {
        let mut frame = Frame::blank(40, 40, PixelFormat::Rgb8);
        let face = DetectionBox::new(5, 5, 20, 20, 0.9);
        let mut ann = FrameAnnotations::new();
        ann.reset(0);
        ann.set_faces(vec![face]);
        ann.set_landmarks(vec![LandmarkSet::new(face, vec![(15.0, 15.0)])]);

        annotate(&mut frame, &ann);

        assert_eq!(pixel(&frame, 5, 5), &GREEN);
        assert_eq!(pixel(&frame, 15, 15), &GREEN);
    }
}
