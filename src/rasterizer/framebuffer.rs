//! Color and depth stores, and the row bands workers draw into

use crate::error::RenderError;

/// Depth value a cleared depth buffer holds.
///
/// The depth buffer stores reciprocal depth `1/z`, so larger is nearer and
/// an empty pixel is infinitely far away.
pub const FAR_DEPTH: f32 = 0.0;

fn alloc_cells<T: Copy>(width: usize, height: usize, fill: T, what: &'static str) -> Result<Vec<T>, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    let cells = width
        .checked_mul(height)
        .ok_or(RenderError::Allocation { what, cells: usize::MAX })?;
    let mut data = Vec::new();
    data.try_reserve_exact(cells)
        .map_err(|_| RenderError::Allocation { what, cells })?;
    data.resize(cells, fill);
    Ok(data)
}

/// Packed-color output grid (RGBA8888, row-major, `y * width + x`)
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        let pixels = alloc_cells(width, height, 0, "framebuffer")?;
        Ok(Self { width, height, pixels })
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Returns false (and writes nothing) for out-of-bounds coordinates
    pub fn set(&mut self, x: usize, y: usize, color: u32) -> bool {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
            true
        } else {
            false
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Count of pixels holding exactly `color`
    pub fn count(&self, color: u32) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// RGBA bytes, 4 per pixel, for presentation or saving
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_be_bytes()).collect()
    }
}

/// Per-pixel reciprocal depth
pub struct DepthBuffer {
    pub width: usize,
    pub height: usize,
    depth: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        let depth = alloc_cells(width, height, FAR_DEPTH, "depth buffer")?;
        Ok(Self { width, height, depth })
    }

    pub fn clear(&mut self) {
        self.depth.fill(FAR_DEPTH);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.depth[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, inv_depth: f32) -> bool {
        if x < self.width && y < self.height {
            self.depth[y * self.width + x] = inv_depth;
            true
        } else {
            false
        }
    }
}

/// Row range `[y_start, y_end)` owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandBounds {
    pub index: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl BandBounds {
    pub fn rows(&self) -> usize {
        self.y_end - self.y_start
    }

    /// Split `height` rows into `min(count, height)` contiguous bands.
    /// Every band gets `height / count` rows and the first `height % count`
    /// bands one extra.
    pub fn partition(height: usize, count: usize) -> Vec<BandBounds> {
        let count = count.clamp(1, height.max(1));
        let base = height / count;
        let extra = height % count;
        let mut y_start = 0;
        (0..count)
            .map(|index| {
                let rows = base + usize::from(index < extra);
                let band = BandBounds {
                    index,
                    y_start,
                    y_end: y_start + rows,
                };
                y_start += rows;
                band
            })
            .filter(|band| band.rows() > 0)
            .collect()
    }
}

/// Exclusive view over a horizontal band of the color and depth buffers.
///
/// Coordinates are framebuffer coordinates; writes outside the band are
/// dropped.
pub struct FrameBand<'a> {
    pub bounds: BandBounds,
    pub width: usize,
    pub height: usize,
    color: &'a mut [u32],
    depth: &'a mut [f32],
}

impl<'a> FrameBand<'a> {
    /// Whole-frame band for single-threaded drawing
    pub fn full(color: &'a mut Framebuffer, depth: &'a mut DepthBuffer) -> Result<Self, RenderError> {
        check_targets(color, depth)?;
        Ok(Self {
            bounds: BandBounds { index: 0, y_start: 0, y_end: color.height },
            width: color.width,
            height: color.height,
            color: &mut color.pixels,
            depth: &mut depth.depth,
        })
    }

    /// Split both buffers along the given partition
    pub fn split(
        color: &'a mut Framebuffer,
        depth: &'a mut DepthBuffer,
        partition: &[BandBounds],
    ) -> Result<Vec<Self>, RenderError> {
        check_targets(color, depth)?;
        let width = color.width;
        let height = color.height;

        let mut bands = Vec::with_capacity(partition.len());
        let mut color_rest: &'a mut [u32] = &mut color.pixels;
        let mut depth_rest: &'a mut [f32] = &mut depth.depth;

        for bounds in partition {
            let cells = bounds.rows() * width;
            let (c, c_tail) = std::mem::take(&mut color_rest).split_at_mut(cells);
            let (d, d_tail) = std::mem::take(&mut depth_rest).split_at_mut(cells);
            color_rest = c_tail;
            depth_rest = d_tail;
            bands.push(FrameBand { bounds: *bounds, width, height, color: c, depth: d });
        }

        Ok(bands)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0
            && (x as usize) < self.width
            && y >= self.bounds.y_start as i32
            && (y as usize) < self.bounds.y_end
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        (y - self.bounds.y_start) * self.width + x
    }

    /// Plain color write, no depth test
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        let idx = self.index(x as usize, y as usize);
        self.color[idx] = color;
        true
    }

    /// Depth-tested write. `shade` runs only when the fragment is nearer
    /// than what the pixel holds.
    #[inline]
    pub fn write_if_nearer(&mut self, x: i32, y: i32, inv_depth: f32, shade: impl FnOnce() -> u32) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        let idx = self.index(x as usize, y as usize);
        if inv_depth <= self.depth[idx] {
            return false;
        }
        self.depth[idx] = inv_depth;
        self.color[idx] = shade();
        true
    }
}

fn check_targets(color: &Framebuffer, depth: &DepthBuffer) -> Result<(), RenderError> {
    if color.width != depth.width || color.height != depth.height {
        return Err(RenderError::MismatchedTargets {
            color: (color.width, color.height),
            depth: (depth.width, depth.height),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Framebuffer::new(0, 10),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(DepthBuffer::new(10, 0).is_err());
    }

    #[test]
    fn test_get_set_bounds_checked() {
        let mut fb = Framebuffer::new(4, 3).unwrap();
        assert!(fb.set(3, 2, 7));
        assert_eq!(fb.get(3, 2), Some(7));
        assert!(!fb.set(4, 0, 1));
        assert_eq!(fb.get(0, 3), None);
        // row-major storage
        assert_eq!(fb.pixels()[2 * 4 + 3], 7);
    }

    #[test]
    fn test_depth_clear_to_far() {
        let mut db = DepthBuffer::new(2, 2).unwrap();
        db.set(1, 1, 3.0);
        db.clear();
        assert_eq!(db.get(1, 1), Some(FAR_DEPTH));
    }

    #[test]
    fn test_partition_covers_rows() {
        for (height, count) in [(600, 8), (7, 3), (5, 16), (1, 1), (100, 1)] {
            let bands = BandBounds::partition(height, count);
            assert_eq!(bands.len(), count.min(height));
            assert_eq!(bands[0].y_start, 0);
            assert_eq!(bands.last().unwrap().y_end, height);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].y_end, pair[1].y_start);
            }
            assert!(bands.iter().all(|b| b.rows() > 0));
        }
    }

    #[test]
    fn test_one_band_per_worker() {
        for (height, count) in [(9, 4), (600, 64), (10, 6), (600, 7), (3, 8)] {
            let bands = BandBounds::partition(height, count);
            assert_eq!(bands.len(), count.min(height), "{} rows / {} workers", height, count);
            let (min, max) = bands
                .iter()
                .fold((usize::MAX, 0), |(lo, hi), b| (lo.min(b.rows()), hi.max(b.rows())));
            assert!(max - min <= 1);
        }
        let rows: Vec<_> = BandBounds::partition(9, 4).iter().map(|b| b.rows()).collect();
        assert_eq!(rows, vec![3, 2, 2, 2]);
    }

    #[test]
    fn test_band_writes_stay_in_band() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut db = DepthBuffer::new(4, 4).unwrap();
        let partition = BandBounds::partition(4, 2);
        {
            let mut bands = FrameBand::split(&mut fb, &mut db, &partition).unwrap();
            assert!(bands[1].set_pixel(1, 3, 9));
            assert!(!bands[1].set_pixel(1, 0, 9));
            assert!(bands[0].write_if_nearer(0, 1, 0.5, || 5));
            assert!(!bands[0].write_if_nearer(0, 1, 0.25, || 6));
        }
        assert_eq!(fb.get(1, 3), Some(9));
        assert_eq!(fb.get(1, 0), Some(0));
        assert_eq!(fb.get(0, 1), Some(5));
        assert_eq!(db.get(0, 1), Some(0.5));
    }

    #[test]
    fn test_mismatched_targets() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut db = DepthBuffer::new(4, 5).unwrap();
        assert!(FrameBand::full(&mut fb, &mut db).is_err());
    }

    #[test]
    fn test_to_rgba8() {
        let mut fb = Framebuffer::new(1, 1).unwrap();
        fb.clear(0x11223344);
        assert_eq!(fb.to_rgba8(), vec![0x11, 0x22, 0x33, 0x44]);
    }
}
