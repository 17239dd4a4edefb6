//! Bresenham line stepping for wireframe overlays
//!
//! Lines share the band write path with triangles but skip the depth test.

use super::framebuffer::FrameBand;
use super::triangle::ScreenVertex;

/// Draw a line from (x0, y0) to (x1, y1), both endpoints included.
/// Returns the number of pixels written inside the band.
///
/// Only the part of the line whose major-axis coordinate falls inside the
/// band is stepped. The pixels are the ones the full line would produce.
pub fn draw_line(band: &mut FrameBand<'_>, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) -> usize {
    let (top, bottom) = (band.bounds.y_start as i64, band.bounds.y_end as i64 - 1);
    let right = band.width as i64 - 1;
    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);

    // Trivial reject when both ends sit on the same outside side of the band
    if (x0 < 0 && x1 < 0)
        || (x0 > right && x1 > right)
        || (y0 < top && y1 < top)
        || (y0 > bottom && y1 > bottom)
    {
        return 0;
    }

    // Step along the longer axis
    let steep = (x1 - x0).abs() < (y1 - y0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }

    // Always walk left to right
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let (lo, hi) = if steep { (top, bottom) } else { (0, right) };
    let first = x0.max(lo);
    let last = x1.min(hi);
    if first > last {
        return 0;
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let de = dy.abs() * 2;
    let step = if y1 > y0 { 1 } else { -1 };

    // Stepper state at `first`: after k steps the error stays in [-dx, dx)
    let (mut y, mut error) = if dx > 0 {
        let k = (first - x0) as i128;
        let (dx, de) = (dx as i128, de as i128);
        let steps = (k * de + dx) / (2 * dx);
        (y0 + step * steps as i64, (k * de - 2 * dx * steps) as i64)
    } else {
        (y0, 0)
    };
    let mut written = 0;

    for x in first..=last {
        let (px, py) = if steep { (y, x) } else { (x, y) };
        if band.set_pixel(to_i32(px), to_i32(py), color) {
            written += 1;
        }

        error += de;
        if error >= dx && dx > 0 {
            y += step;
            error -= dx * 2;
        }
    }

    written
}

/// Saturating narrow; anything saturated is far outside any band
fn to_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Outline a projected triangle. Vertices snap the same way the triangle
/// rasterizer snaps them.
pub fn draw_triangle_edges(band: &mut FrameBand<'_>, v: &[ScreenVertex; 3], color: u32) -> usize {
    let p = [v[0].snapped(), v[1].snapped(), v[2].snapped()];
    (0..3)
        .map(|i| {
            let (a, b) = (p[i], p[(i + 1) % 3]);
            draw_line(band, a.0, a.1, b.0, b.1, color)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::framebuffer::{BandBounds, DepthBuffer, Framebuffer};

    const GREEN: u32 = 0x00FF00FF;

    fn buffers(w: usize, h: usize) -> (Framebuffer, DepthBuffer) {
        (Framebuffer::new(w, h).unwrap(), DepthBuffer::new(w, h).unwrap())
    }

    #[test]
    fn test_horizontal_and_vertical() {
        let (mut fb, mut db) = buffers(16, 16);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        assert_eq!(draw_line(&mut band, 0, 3, 9, 3, GREEN), 10);
        assert_eq!(draw_line(&mut band, 12, 0, 12, 9, GREEN), 10);
        drop(band);
        assert_eq!(fb.get(9, 3), Some(GREEN));
        assert_eq!(fb.get(12, 9), Some(GREEN));
        assert_eq!(fb.count(GREEN), 20);
    }

    #[test]
    fn test_diagonal_both_directions() {
        let (mut fb, mut db) = buffers(8, 8);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        assert_eq!(draw_line(&mut band, 5, 5, 0, 0, GREEN), 6);
        drop(band);
        for i in 0..6 {
            assert_eq!(fb.get(i, i), Some(GREEN));
        }
    }

    #[test]
    fn test_steep_line_one_pixel_per_row() {
        let (mut fb, mut db) = buffers(16, 16);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        draw_line(&mut band, 2, 0, 5, 15, GREEN);
        drop(band);
        for y in 0..16 {
            let row = (0..16).filter(|&x| fb.get(x, y) == Some(GREEN)).count();
            assert_eq!(row, 1, "row {}", y);
        }
    }

    #[test]
    fn test_clipped_to_bounds() {
        let (mut fb, mut db) = buffers(8, 8);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        assert_eq!(draw_line(&mut band, -4, 2, 20, 2, GREEN), 8);
        assert_eq!(draw_line(&mut band, -10, -10, -2, -1, GREEN), 0);
    }

    #[test]
    fn test_ignores_depth() {
        let (mut fb, mut db) = buffers(8, 8);
        db.set(3, 3, 100.0);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        draw_line(&mut band, 0, 3, 7, 3, GREEN);
        drop(band);
        assert_eq!(fb.get(3, 3), Some(GREEN));
        assert_eq!(db.get(3, 3), Some(100.0));
    }

    #[test]
    fn test_far_endpoints_clipped_to_viewport() {
        let (mut fb, mut db) = buffers(16, 16);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        assert_eq!(draw_line(&mut band, i32::MIN + 1, 5, i32::MAX, 5, GREEN), 16);
        assert_eq!(draw_line(&mut band, 3, i32::MIN, 3, i32::MAX, GREEN), 16);
        let huge = [
            ScreenVertex::new(-1e10, 2.0, 0.5),
            ScreenVertex::new(1e10, 2.0, 0.5),
            ScreenVertex::new(0.0, 12.0, 0.5),
        ];
        assert!(draw_triangle_edges(&mut band, &huge, GREEN) >= 16);
        drop(band);
        assert!((0..16).all(|x| fb.get(x, 2) == Some(GREEN) && fb.get(x, 5) == Some(GREEN)));
    }

    #[test]
    fn test_clipped_start_matches_unclipped_line() {
        // The same line drawn fully on screen in a larger frame, offset by (50, 10)
        let (mut big_fb, mut big_db) = buffers(128, 64);
        let mut band = FrameBand::full(&mut big_fb, &mut big_db).unwrap();
        draw_line(&mut band, 10, 7, 100, 40, GREEN);
        draw_line(&mut band, 60, 2, 53, 60, GREEN);
        drop(band);

        let (mut fb, mut db) = buffers(16, 16);
        let mut band = FrameBand::full(&mut fb, &mut db).unwrap();
        draw_line(&mut band, -40, -3, 50, 30, GREEN);
        draw_line(&mut band, 10, -8, 3, 50, GREEN);
        drop(band);

        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(fb.get(x, y), big_fb.get(x + 50, y + 10), "pixel ({}, {})", x, y);
            }
        }
        assert!(fb.count(GREEN) > 0);
    }

    #[test]
    fn test_split_bands_match_full_frame() {
        let (mut full_fb, mut full_db) = buffers(20, 20);
        let mut band = FrameBand::full(&mut full_fb, &mut full_db).unwrap();
        draw_line(&mut band, 1, 0, 18, 19, GREEN);
        drop(band);

        let (mut fb, mut db) = buffers(20, 20);
        let partition = BandBounds::partition(20, 3);
        for mut band in FrameBand::split(&mut fb, &mut db, &partition).unwrap() {
            draw_line(&mut band, 1, 0, 18, 19, GREEN);
        }
        assert_eq!(fb.pixels(), full_fb.pixels());
    }
}
