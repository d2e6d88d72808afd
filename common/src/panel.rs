use crate::color::Pixel;
use serde::{Deserialize, Serialize};

/// One rectangular grid of pixels.
///
/// Storage is row-major; `(x, y)` addresses column `x` of row `y`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<Pixel>>", into = "Vec<Vec<Pixel>>")]
pub struct PanelGrid {
    cols: usize,
    rows: usize,
    pixels: Vec<Pixel>,
}

impl PanelGrid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self::filled(cols, rows, Pixel::BLACK)
    }

    pub fn filled(cols: usize, rows: usize, fill: Pixel) -> Self {
        Self {
            cols,
            rows,
            pixels: vec![fill; cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.cols && y < self.rows).then(|| y * self.cols + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Pixel> {
        self.index(x, y).map(|idx| self.pixels[idx])
    }

    /// Writes outside the grid are dropped; the return value says whether the write landed.
    pub fn set(&mut self, x: usize, y: usize, pixel: Pixel) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.pixels[idx] = pixel;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, pixel: Pixel) {
        self.pixels.fill(pixel);
    }

    /// New grid of the requested size; overlapping cells keep their value, the rest are black.
    pub fn resized(&self, cols: usize, rows: usize) -> Self {
        let mut out = Self::new(cols, rows);
        for y in 0..rows.min(self.rows) {
            for x in 0..cols.min(self.cols) {
                out.pixels[y * cols + x] = self.pixels[y * self.cols + x];
            }
        }

        out
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[Pixel]> {
        // chunks() rejects a zero size
        self.pixels.chunks(self.cols.max(1)).take(self.rows)
    }

    /// `(x, y, pixel)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, Pixel)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .map(|(idx, px)| (idx % self.cols, idx / self.cols, *px))
    }

    /// Flat `R,G,B` bytes, row-major; the device framebuffer layout.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|px| px.to_array()).collect()
    }

    /// Inverse of [`PanelGrid::to_rgb_bytes`]; missing bytes read as 0.
    pub fn from_rgb_bytes(cols: usize, rows: usize, bytes: &[u8]) -> Self {
        let byte = |idx: usize| bytes.get(idx).copied().unwrap_or(0);
        let pixels = (0..cols * rows)
            .map(|idx| Pixel::new(byte(idx * 3), byte(idx * 3 + 1), byte(idx * 3 + 2)))
            .collect();

        Self { cols, rows, pixels }
    }
}

impl From<Vec<Vec<Pixel>>> for PanelGrid {
    fn from(data: Vec<Vec<Pixel>>) -> Self {
        let rows = data.len();
        let cols = data.iter().map(Vec::len).max().unwrap_or(0);

        let mut grid = Self::new(cols, rows);
        for (y, row) in data.into_iter().enumerate() {
            for (x, pixel) in row.into_iter().enumerate() {
                grid.set(x, y, pixel);
            }
        }

        grid
    }
}

impl From<PanelGrid> for Vec<Vec<Pixel>> {
    fn from(grid: PanelGrid) -> Self {
        grid.rows_iter().map(<[Pixel]>::to_vec).collect()
    }
}
