//! Display-independent rendering of walls and onion-skin layers.

use crate::{
    color::Pixel,
    frames::FrameSequence,
    wall::{ActivePanels, PANEL_COUNT, Wall},
};
use serde::{Deserialize, Serialize};

/// Tint of the previous frame's ghost.
pub const PREV_TINT: Pixel = Pixel::new(40, 40, 140);
/// Tint of the next frame's ghost.
pub const NEXT_TINT: Pixel = Pixel::new(140, 40, 40);
/// Gap between cells when laid out on a canvas, in canvas units.
pub const CELL_GAP: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OnionSkin {
    pub prev: bool,
    pub next: bool,
    /// 1 shows neighbours in their true color, 0 shows only the tint.
    pub alpha: f32,
}

impl OnionSkin {
    pub fn weight(self) -> f32 {
        1.0 - self.alpha.clamp(0.0, 1.0)
    }
}

impl Default for OnionSkin {
    fn default() -> Self {
        Self {
            prev: true,
            next: true,
            alpha: 0.6,
        }
    }
}

/// World position of a panel's top-left cell in the 2×2 layout.
pub fn panel_origin(panel: usize, cols: usize, rows: usize) -> (usize, usize) {
    ((panel % 2) * cols, (panel / 2) * rows)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelOutline {
    pub panel: usize,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Final colors for every world cell covered by the active panels' bounding box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composite {
    pub width: usize,
    pub height: usize,
    pub panel_cols: usize,
    pub panel_rows: usize,
    pub pixels: Vec<Pixel>,
    pub outlines: Vec<PanelOutline>,
}

impl Composite {
    /// Black buffer sized for `active` panels of `cols × rows`.
    pub fn blank(cols: usize, rows: usize, active: ActivePanels) -> Self {
        let wide = if active.get() > 1 { 2 } else { 1 };
        let tall = if active.get() > 2 { 2 } else { 1 };
        let (width, height) = (cols * wide, rows * tall);

        Self {
            width,
            height,
            panel_cols: cols,
            panel_rows: rows,
            pixels: vec![Pixel::BLACK; width * height],
            outlines: Vec::new(),
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Pixel> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    fn plot(&mut self, x: usize, y: usize, pixel: Pixel) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = pixel;
        }
    }

    fn covers(&self, panel: usize) -> bool {
        let (x, y) = panel_origin(panel, self.panel_cols, self.panel_rows);
        x < self.width && y < self.height
    }

    fn draw_panel(&mut self, wall: &Wall, panel: usize, shade: impl Fn(Pixel) -> Pixel) {
        let Some(grid) = wall.panel(panel) else {
            return;
        };

        let (ox, oy) = panel_origin(panel, self.panel_cols, self.panel_rows);
        for (x, y, pixel) in grid.pixels() {
            if x < self.panel_cols && y < self.panel_rows {
                self.plot(ox + x, oy + y, shade(pixel));
            }
        }
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[Pixel]> {
        self.pixels.chunks(self.width.max(1)).take(self.height)
    }
}

/// Render one wall: active panels in true color, inactive panels in the box dimmed.
pub fn render_frame(wall: &Wall, active: ActivePanels) -> Composite {
    let mut out = Composite::blank(wall.cols(), wall.rows(), active);
    draw_current(&mut out, wall, active);
    out
}

fn draw_current(out: &mut Composite, wall: &Wall, active: ActivePanels) {
    for panel in 0..PANEL_COUNT {
        if !out.covers(panel) {
            continue;
        }

        if active.contains(panel) {
            out.draw_panel(wall, panel, |px| px);
        } else {
            out.draw_panel(wall, panel, Pixel::dimmed);
        }
    }
}

/// Blend the active panels of a neighbouring frame toward `tint` into `out`.
pub fn render_onion_layer(
    out: &mut Composite,
    neighbor: &Wall,
    tint: Pixel,
    weight: f32,
    active: ActivePanels,
) {
    for panel in (0..PANEL_COUNT).filter(|panel| active.contains(*panel)) {
        out.draw_panel(neighbor, panel, |px| px.blend_toward(tint, weight));
    }
}

pub fn outlines(cols: usize, rows: usize, active: ActivePanels) -> Vec<PanelOutline> {
    (0..active.get())
        .map(|panel| {
            let (x, y) = panel_origin(panel, cols, rows);
            PanelOutline {
                panel,
                x,
                y,
                width: cols,
                height: rows,
            }
        })
        .collect()
}

/// Full editor view of a sequence.
///
/// Layers are drawn previous ghost, next ghost, working wall, then outlines;
/// each layer overwrites the cells below it.
pub fn render_sequence(seq: &FrameSequence, active: ActivePanels, onion: OnionSkin) -> Composite {
    let working = seq.working();
    let mut out = Composite::blank(working.cols(), working.rows(), active);

    if onion.prev {
        if let Some(prev) = seq.previous_frame() {
            render_onion_layer(&mut out, prev, PREV_TINT, onion.weight(), active);
        }
    }
    if onion.next {
        if let Some(next) = seq.next_frame() {
            render_onion_layer(&mut out, next, NEXT_TINT, onion.weight(), active);
        }
    }

    draw_current(&mut out, working, active);
    out.outlines = outlines(working.cols(), working.rows(), active);
    out
}

/// Placement of the cell grid inside a canvas of a given size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_size: f64,
}

impl Viewport {
    fn stride(&self) -> f64 {
        self.pixel_size + CELL_GAP
    }

    /// Top-left corner of a centered `cols × rows` grid.
    pub fn origin(&self, cols: usize, rows: usize) -> (f64, f64) {
        let extent =
            |cells: usize| cells as f64 * self.pixel_size + (cells as f64 - 1.0) * CELL_GAP;
        ((self.width - extent(cols)) / 2.0, (self.height - extent(rows)) / 2.0)
    }

    /// Canvas point to world cell, `None` outside the grid.
    pub fn canvas_to_world(
        &self,
        cx: f64,
        cy: f64,
        cols: usize,
        rows: usize,
    ) -> Option<(i32, i32)> {
        let (x0, y0) = self.origin(cols, rows);
        let (rx, ry) = (cx - x0, cy - y0);
        if rx < 0.0 || ry < 0.0 {
            return None;
        }

        let wx = (rx / self.stride()).floor();
        let wy = (ry / self.stride()).floor();
        if wx >= cols as f64 || wy >= rows as f64 {
            return None;
        }

        Some((wx as i32, wy as i32))
    }
}
