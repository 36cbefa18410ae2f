/// Row-major flat grid. No per-cell objects, f32 friendly.
/// Heightmaps are square (`w == h`) and do not wrap at the edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

/// Square elevation grid, addressed `[row * size + col]`.
pub type Heightmap = Grid<f32>;

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    pub fn filled(n: usize, v: T) -> Self {
        Self {
            data: vec![v; n * n],
            w: n,
            h: n,
        }
    }

    /// Wrap an existing square buffer. Returns `None` when the length is not `n * n`.
    pub fn from_vec(n: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == n * n).then_some(Self { data, w: n, h: n })
    }

    /// Side length of a square grid.
    #[inline]
    pub fn size(&self) -> usize {
        debug_assert_eq!(self.w, self.h);
        self.w
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Top-left `n x n` window. Used to bring a `2^k+1` grid back to the requested size.
    pub fn crop(&self, n: usize) -> Self {
        debug_assert!(n <= self.w && n <= self.h);
        let mut out = Self::square(n);
        for (y, row) in out.data.chunks_mut(n).enumerate() {
            let start = y * self.w;
            row.copy_from_slice(&self.data[start..start + n]);
        }
        out
    }
}

impl Grid<f32> {
    /// Bilinear sample with coordinates clamped to the grid.
    #[inline]
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.w - 1) as f32);
        let y = y.clamp(0.0, (self.h - 1) as f32);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.w - 1);
        let y1 = (y0 + 1).min(self.h - 1);
        let sx = x - x0 as f32;
        let sy = y - y0 as f32;

        let v00 = self.get(x0, y0);
        let v10 = self.get(x1, y0);
        let v01 = self.get(x0, y1);
        let v11 = self.get(x1, y1);

        let top = v00 + (v10 - v00) * sx;
        let bot = v01 + (v11 - v01) * sx;
        top + (bot - top) * sy
    }

    /// Min and max over finite samples. `None` if there are none.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        min_max_strided(&self.data, 1)
    }

    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        (sum / self.data.len() as f64) as f32
    }

    /// Sum in f64, for mass accounting.
    pub fn total(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }
}

pub(crate) fn min_max_strided(data: &[f32], stride: usize) -> Option<(f32, f32)> {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in data.iter().step_by(stride.max(1)) {
        if !v.is_finite() {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo <= hi).then_some((lo, hi))
}

/// Mean of the `(2r+1)^2` window around `(x, y)`, clipped to the grid.
/// `include_center = false` gives the ring average used by relaxation passes.
#[inline]
pub fn window_mean(src: &[f32], n: usize, x: usize, y: usize, r: usize, include_center: bool) -> f32 {
    let x0 = x.saturating_sub(r);
    let y0 = y.saturating_sub(r);
    let x1 = (x + r).min(n - 1);
    let y1 = (y + r).min(n - 1);
    let mut sum = 0.0;
    let mut count = 0u32;
    for yy in y0..=y1 {
        let row = &src[yy * n..yy * n + n];
        for (xx, &v) in row.iter().enumerate().take(x1 + 1).skip(x0) {
            if !include_center && xx == x && yy == y {
                continue;
            }
            sum += v;
            count += 1;
        }
    }
    if count > 0 { sum / count as f32 } else { src[y * n + x] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_keeps_top_left() {
        let mut g: Grid<f32> = Grid::square(5);
        for y in 0..5 {
            for x in 0..5 {
                g.set(x, y, (y * 5 + x) as f32);
            }
        }
        let c = g.crop(3);
        assert_eq!(c.size(), 3);
        assert_eq!(c.data, vec![0.0, 1.0, 2.0, 5.0, 6.0, 7.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn bilinear_hits_cell_values_and_midpoints() {
        let g = Grid::from_vec(2, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(g.sample_bilinear(0.0, 0.0), 0.0);
        assert_eq!(g.sample_bilinear(1.0, 1.0), 3.0);
        assert!((g.sample_bilinear(0.5, 0.5) - 1.5).abs() < 1e-6);
        // Clamped outside the grid.
        assert_eq!(g.sample_bilinear(-4.0, -4.0), 0.0);
        assert_eq!(g.sample_bilinear(9.0, 9.0), 3.0);
    }

    #[test]
    fn min_max_skips_non_finite() {
        let g = Grid::from_vec(2, vec![f32::NAN, 0.25, f32::INFINITY, 0.75]).unwrap();
        assert_eq!(g.min_max(), Some((0.25, 0.75)));
        let bad = Grid::from_vec(1, vec![f32::NAN]).unwrap();
        assert_eq!(bad.min_max(), None);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Grid::from_vec(3, vec![0.0f32; 8]).is_none());
    }

    #[test]
    fn window_mean_ring_excludes_center() {
        let g = Grid::from_vec(3, vec![1.0, 1.0, 1.0, 1.0, 9.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(window_mean(&g.data, 3, 1, 1, 1, false), 1.0);
        assert!((window_mean(&g.data, 3, 1, 1, 1, true) - 17.0 / 9.0).abs() < 1e-6);
        // Corner sees a clipped 2x2 window.
        assert!((window_mean(&g.data, 3, 0, 0, 1, true) - 3.0).abs() < 1e-6);
    }
}
