use crate::{color::Pixel, panel::PanelGrid};
use serde::{Deserialize, Serialize};

pub const PANEL_COUNT: usize = 4;

/// How many panels of a wall take part in editing and device sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct ActivePanels(u8);

impl ActivePanels {
    pub const ONE: Self = Self(1);

    /// Clamps into `1..=4`.
    pub fn new(count: i64) -> Self {
        Self(count.clamp(1, PANEL_COUNT as i64) as u8)
    }

    pub fn get(self) -> usize {
        usize::from(self.0)
    }

    pub fn contains(self, panel: usize) -> bool {
        panel < self.get()
    }
}

impl Default for ActivePanels {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<i64> for ActivePanels {
    fn from(count: i64) -> Self {
        Self::new(count)
    }
}

impl From<ActivePanels> for u8 {
    fn from(active: ActivePanels) -> Self {
        active.0
    }
}

/// Panel-local address resolved from world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelCoord {
    pub panel: usize,
    pub x: usize,
    pub y: usize,
}

/// Four equally sized panels in a 2×2 layout.
///
/// `0` is top-left, `1` top-right, `2` bottom-left, `3` bottom-right.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PanelGrid>", into = "Vec<PanelGrid>")]
pub struct Wall {
    cols: usize,
    rows: usize,
    panels: [PanelGrid; PANEL_COUNT],
}

impl Wall {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            panels: std::array::from_fn(|_| PanelGrid::new(cols, rows)),
        }
    }

    /// Wall whose panel 0 holds a row-major RGB framebuffer.
    pub fn from_device(cols: usize, rows: usize, bytes: &[u8]) -> Self {
        let mut wall = Self::new(cols, rows);
        wall.panels[0] = PanelGrid::from_rgb_bytes(cols, rows, bytes);
        wall
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn panels(&self) -> &[PanelGrid; PANEL_COUNT] {
        &self.panels
    }

    pub fn panel(&self, idx: usize) -> Option<&PanelGrid> {
        self.panels.get(idx)
    }

    pub fn panel_mut(&mut self, idx: usize) -> Option<&mut PanelGrid> {
        self.panels.get_mut(idx)
    }

    /// Resolve world coordinates to a panel cell.
    ///
    /// The panel index is `floor(wx / cols) + floor(wy / rows)` with both
    /// coordinates bounded by a single panel, so every in-bounds cell lands on
    /// panel 0. Layout rendering uses `row_block * 2 + col_block` instead; see
    /// [`crate::compositor::panel_origin`].
    pub fn world_to_panel(&self, wx: i32, wy: i32, active: ActivePanels) -> Option<PanelCoord> {
        let (wx, wy) = (usize::try_from(wx).ok()?, usize::try_from(wy).ok()?);
        if wx >= self.cols || wy >= self.rows {
            return None;
        }

        let panel = wx / self.cols + wy / self.rows;
        if !active.contains(panel) {
            return None;
        }

        Some(PanelCoord {
            panel,
            x: wx % self.cols,
            y: wy % self.rows,
        })
    }

    /// Returns whether the write landed on an active panel.
    pub fn set_pixel(&mut self, wx: i32, wy: i32, pixel: Pixel, active: ActivePanels) -> bool {
        match self.world_to_panel(wx, wy, active) {
            Some(at) => self.panels[at.panel].set(at.x, at.y, pixel),
            None => false,
        }
    }

    pub fn get_pixel(&self, wx: i32, wy: i32, active: ActivePanels) -> Option<Pixel> {
        let at = self.world_to_panel(wx, wy, active)?;
        self.panels[at.panel].get(at.x, at.y)
    }

    pub fn resized(&self, cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            panels: std::array::from_fn(|idx| self.panels[idx].resized(cols, rows)),
        }
    }
}

impl From<Vec<PanelGrid>> for Wall {
    fn from(panels: Vec<PanelGrid>) -> Self {
        let (cols, rows) = panels
            .first()
            .map_or((0, 0), |panel| (panel.cols(), panel.rows()));

        let mut wall = Self::new(cols, rows);
        for (slot, panel) in wall.panels.iter_mut().zip(panels) {
            *slot = if (panel.cols(), panel.rows()) == (cols, rows) {
                panel
            } else {
                panel.resized(cols, rows)
            };
        }

        wall
    }
}

impl From<Wall> for Vec<PanelGrid> {
    fn from(wall: Wall) -> Self {
        wall.panels.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Pixel = Pixel::new(255, 0, 0);

    #[test]
    fn active_panels_clamp() {
        assert_eq!(ActivePanels::new(0).get(), 1);
        assert_eq!(ActivePanels::new(9).get(), 4);
        assert_eq!(ActivePanels::new(3).get(), 3);
    }

    #[test]
    fn in_bounds_cells_map_to_panel_zero() {
        let wall = Wall::new(16, 16);
        for active in 1..=4 {
            let at = wall.world_to_panel(15, 15, ActivePanels::new(active)).unwrap();
            assert_eq!(at, PanelCoord { panel: 0, x: 15, y: 15 });
        }
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut wall = Wall::new(16, 16);
        let active = ActivePanels::ONE;
        assert_eq!(wall.world_to_panel(20, 3, active), None);
        assert_eq!(wall.world_to_panel(-1, 3, active), None);
        assert_eq!(wall.world_to_panel(3, 16, active), None);
        assert!(!wall.set_pixel(20, 3, RED, active));
        assert_eq!(wall.get_pixel(20, 3, active), None);
    }

    #[test]
    fn set_then_get() {
        let mut wall = Wall::new(8, 8);
        assert!(wall.set_pixel(3, 3, RED, ActivePanels::ONE));
        assert_eq!(wall.get_pixel(3, 3, ActivePanels::ONE), Some(RED));
        assert_eq!(wall.panel(0).unwrap().get(3, 3), Some(RED));
        assert_eq!(wall.panel(1).unwrap().get(3, 3), Some(Pixel::BLACK));
    }

    #[test]
    fn deserialize_normalizes_panels() {
        let wall: Wall = serde_json::from_str("[[[[1,2,3],[4,5,6]]], [[[9,9,9]]]]").unwrap();
        assert_eq!((wall.cols(), wall.rows()), (2, 1));
        assert_eq!(wall.panels().len(), 4);
        assert_eq!(wall.panel(1).unwrap().get(0, 0), Some(Pixel::new(9, 9, 9)));
        assert_eq!(wall.panel(1).unwrap().get(1, 0), Some(Pixel::BLACK));
        assert_eq!(wall.panel(3).unwrap().cols(), 2);
    }

    #[test]
    fn active_panels_serialize_as_number() {
        assert_eq!(serde_json::to_string(&ActivePanels::new(3)).unwrap(), "3");
        let active: ActivePanels = serde_json::from_str("7").unwrap();
        assert_eq!(active.get(), 4);
    }
}
