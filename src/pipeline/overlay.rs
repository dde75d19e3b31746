use crate::types::{Frame, SignalBundle, Subject};

use super::detector::{LEFT_ELBOW, LEFT_SHOULDER, RIGHT_ELBOW, RIGHT_SHOULDER};

/// COCO body edges.
pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    (5, 11),
    (6, 12),
    (11, 12),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
];

pub const SKELETON_LINE_THICKNESS: i32 = 5;
const BOX_THICKNESS: i32 = 3;
const GAUGE_HEIGHT: i32 = 14;
const GAUGE_MARGIN: i32 = 16;

const TRACKED_COLOR: [u8; 4] = [56, 189, 248, 255];
const OTHER_COLOR: [u8; 4] = [148, 163, 184, 255];
const POINT_COLOR: [u8; 4] = [248, 113, 113, 255];
const ARM_ACTIVE_COLOR: [u8; 4] = [34, 197, 94, 255];
const GAUGE_FRAME_COLOR: [u8; 4] = [226, 232, 240, 255];
const SWAY_COLOR: [u8; 4] = [250, 204, 21, 255];

/// Paints detections and the current signals onto the frame in place.
///
/// The followed person (subject 0) is drawn in colour with its bounding box;
/// others are greyed out. Arms that produced an angle get a green shoulder
/// marker, and the hip sway is shown as a gauge along the bottom edge.
pub fn annotate(
    frame: &mut Frame,
    subjects: &[Subject],
    signals: &SignalBundle,
    confidence_threshold: f32,
    sway_range: f32,
) {
    let (width, height) = (frame.width, frame.height);
    let buffer = frame.rgba.as_mut_slice();

    for (i, subject) in subjects.iter().enumerate().rev() {
        let color = if i == 0 { TRACKED_COLOR } else { OTHER_COLOR };
        draw_skeleton(buffer, width, height, subject, confidence_threshold, color);
    }

    if let Some(primary) = subjects.first() {
        let [x1, y1, x2, y2] = primary.bbox;
        if x2 > x1 && y2 > y1 {
            draw_rect(buffer, width, height, x1, y1, x2, y2, TRACKED_COLOR, BOX_THICKNESS);
        }

        for (angle, shoulder, elbow) in [
            (signals.left_arm, LEFT_SHOULDER, LEFT_ELBOW),
            (signals.right_arm, RIGHT_SHOULDER, RIGHT_ELBOW),
        ] {
            if angle.is_none() {
                continue;
            }
            if let (Some(s), Some(e)) = (primary.get(shoulder), primary.get(elbow)) {
                draw_line(
                    buffer,
                    width,
                    height,
                    &(s.x, s.y),
                    &(e.x, e.y),
                    ARM_ACTIVE_COLOR,
                    SKELETON_LINE_THICKNESS,
                );
                draw_circle(buffer, width, height, (s.x as i32, s.y as i32), 9, ARM_ACTIVE_COLOR);
            }
        }
    }

    if let Some(sway) = signals.hip_sway {
        draw_sway_gauge(buffer, width, height, sway, sway_range);
    }
}

fn draw_skeleton(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    subject: &Subject,
    threshold: f32,
    line_color: [u8; 4],
) {
    for &(a, b) in CONNECTIONS {
        if let (Some(pa), Some(pb)) = (subject.get(a), subject.get(b)) {
            if pa.is_confident(threshold) && pb.is_confident(threshold) {
                draw_line(
                    buffer,
                    width,
                    height,
                    &(pa.x, pa.y),
                    &(pb.x, pb.y),
                    line_color,
                    SKELETON_LINE_THICKNESS,
                );
            }
        }
    }

    let point_radius = (SKELETON_LINE_THICKNESS / 2).max(3) + 1;
    for kp in subject.keypoints.iter().filter(|k| k.is_confident(threshold)) {
        draw_circle(
            buffer,
            width,
            height,
            (kp.x as i32, kp.y as i32),
            point_radius,
            POINT_COLOR,
        );
    }
}

/// Horizontal gauge centred at the bottom of the frame; the marker sits at
/// `sway / range` of the half width, clamped to the gauge ends.
fn draw_sway_gauge(buffer: &mut [u8], width: u32, height: u32, sway: f32, range: f32) {
    let w = width as i32;
    let h = height as i32;
    if w < GAUGE_MARGIN * 4 || h < GAUGE_MARGIN * 2 + GAUGE_HEIGHT {
        return;
    }

    let left = GAUGE_MARGIN as f32;
    let right = (w - GAUGE_MARGIN) as f32;
    let bottom = (h - GAUGE_MARGIN) as f32;
    let top = bottom - GAUGE_HEIGHT as f32;
    draw_rect(buffer, width, height, left, top, right, bottom, GAUGE_FRAME_COLOR, 2);

    let center = (left + right) / 2.0;
    let ratio = if range > 0.0 { (sway / range).clamp(-1.0, 1.0) } else { 0.0 };
    let marker = center + ratio * (right - left) / 2.0;
    draw_line(
        buffer,
        width,
        height,
        &(center, top),
        &(center, bottom),
        GAUGE_FRAME_COLOR,
        1,
    );
    draw_line(
        buffer,
        width,
        height,
        &(marker, top + 2.0),
        &(marker, bottom - 2.0),
        SWAY_COLOR,
        7,
    );
}

fn draw_rect(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    color: [u8; 4],
    thickness: i32,
) {
    let corners = [(x1, y1), (x2, y1), (x2, y2), (x1, y2)];
    for i in 0..corners.len() {
        let next = corners[(i + 1) % corners.len()];
        draw_line(buffer, width, height, &corners[i], &next, color, thickness);
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: &(f32, f32),
    p1: &(f32, f32),
    color: [u8; 4],
    thickness: i32,
) {
    if !(p0.0.is_finite() && p0.1.is_finite() && p1.0.is_finite() && p1.1.is_finite()) {
        return;
    }
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        for ox in -radius..=radius {
            for oy in -radius..=radius {
                if ox.abs() + oy.abs() <= radius {
                    put_pixel_safe(buffer, width, height, x0 + ox, y0 + oy, color);
                }
            }
        }
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

fn draw_circle(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: [u8; 4],
) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_safe(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel_safe(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}
