use crate::{
    color::Pixel,
    compositor::{self, Composite, OnionSkin},
    device::DeviceState,
    frames::{FrameSequence, MAX_FPS, MIN_FPS},
    wall::{ActivePanels, Wall},
};
use tracing::debug;

pub const MIN_PANEL_SIZE: usize = 2;
pub const MAX_PANEL_SIZE: usize = 128;
pub const DEFAULT_PANEL_SIZE: usize = 16;
pub const DEFAULT_PIXEL_SIZE: u32 = 18;
pub const DEFAULT_FPS: u32 = 12;
pub const DEFAULT_COLOR: Pixel = Pixel::new(255, 0, 128);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Paint,
    Erase,
}

/// Everything the editor tracks for one open project.
#[derive(Clone, Debug)]
pub struct EditorSession {
    pub tool: Tool,
    pub color: Pixel,
    pub pixel_size: u32,
    pub show_grid: bool,
    pub onion: OnionSkin,
    pub playing: bool,
    fps: u32,
    panel_cols: usize,
    panel_rows: usize,
    active_panels: ActivePanels,
    frames: FrameSequence,
    stroke: bool,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(DEFAULT_PANEL_SIZE, DEFAULT_PANEL_SIZE)
    }
}

impl EditorSession {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            tool: Tool::Paint,
            color: DEFAULT_COLOR,
            pixel_size: DEFAULT_PIXEL_SIZE,
            show_grid: true,
            onion: OnionSkin::default(),
            playing: false,
            fps: DEFAULT_FPS,
            panel_cols: cols,
            panel_rows: rows,
            active_panels: ActivePanels::ONE,
            frames: FrameSequence::new(Wall::new(cols, rows)),
            stroke: false,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn panel_size(&self) -> (usize, usize) {
        (self.panel_cols, self.panel_rows)
    }

    pub fn active_panels(&self) -> ActivePanels {
        self.active_panels
    }

    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }

    pub fn working(&self) -> &Wall {
        self.frames.working()
    }

    pub fn blank_wall(&self) -> Wall {
        Wall::new(self.panel_cols, self.panel_rows)
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Invalid input selects the fallback red, like the color picker would.
    pub fn set_color_hex(&mut self, hex: &str) {
        self.color = Pixel::from_hex(hex);
    }

    pub fn set_fps(&mut self, fps: i64) {
        self.fps = fps.clamp(i64::from(MIN_FPS), i64::from(MAX_FPS)) as u32;
    }

    pub fn set_active_panels(&mut self, count: i64) {
        self.active_panels = ActivePanels::new(count);
    }

    pub fn set_onion_alpha(&mut self, alpha: f32) {
        self.onion.alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    }

    pub fn set_onion_prev(&mut self, enabled: bool) {
        self.onion.prev = enabled;
    }

    pub fn set_onion_next(&mut self, enabled: bool) {
        self.onion.next = enabled;
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    pub fn set_pixel_size(&mut self, size: u32) {
        self.pixel_size = size.max(1);
    }

    /// Paint or erase one world cell and mark a stroke as in progress.
    pub fn apply_tool(&mut self, wx: i32, wy: i32) -> bool {
        self.stroke = true;
        let pixel = match self.tool {
            Tool::Paint => self.color,
            Tool::Erase => Pixel::BLACK,
        };

        self.frames.working_mut().set_pixel(wx, wy, pixel, self.active_panels)
    }

    /// Pick the color under a world cell.
    pub fn eyedrop(&mut self, wx: i32, wy: i32) -> Option<Pixel> {
        let pixel = self.frames.working().get_pixel(wx, wy, self.active_panels)?;
        self.color = pixel;
        Some(pixel)
    }

    /// Commit the working wall if a stroke was in progress.
    pub fn end_stroke(&mut self) {
        if std::mem::take(&mut self.stroke) {
            self.frames.commit();
        }
    }

    /// Resize every frame; dimensions are clamped to `2..=128`.
    pub fn apply_size(&mut self, cols: i64, rows: i64) {
        let clamp = |v: i64| v.clamp(MIN_PANEL_SIZE as i64, MAX_PANEL_SIZE as i64) as usize;
        let (cols, rows) = (clamp(cols), clamp(rows));
        debug!(cols, rows, "resizing panels");

        self.resize_to(cols, rows);
    }

    fn resize_to(&mut self, cols: usize, rows: usize) {
        self.panel_cols = cols;
        self.panel_rows = rows;
        self.frames.resize_all(cols, rows);
    }

    pub fn clear_wall(&mut self) {
        *self.frames.working_mut() = self.blank_wall();
        self.frames.commit();
    }

    pub fn prev_frame(&mut self) -> bool {
        self.frames.goto_prev()
    }

    pub fn next_frame(&mut self) -> bool {
        self.frames.goto_next()
    }

    /// Insert a copy of the working wall after the current frame.
    pub fn add_frame(&mut self) {
        let copy = self.frames.working().clone();
        self.frames.insert_after_current(Some(copy));
    }

    pub fn duplicate_frame(&mut self) {
        self.frames.duplicate_current();
    }

    pub fn delete_frame(&mut self) -> bool {
        self.frames.delete_current()
    }

    pub fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.frames.stop_clock();
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn toggle_playback(&mut self) {
        if self.playing { self.stop() } else { self.play() }
    }

    /// Drive playback from an animation callback; `now` in milliseconds.
    pub fn tick(&mut self, now: f64) -> bool {
        self.frames.tick(now, self.fps, self.playing)
    }

    pub fn render(&self) -> Composite {
        compositor::render_sequence(&self.frames, self.active_panels, self.onion)
    }

    /// `"3/7"` style position indicator.
    pub fn frame_label(&self) -> String {
        format!("{}/{}", self.frames.current_index() + 1, self.frames.len())
    }

    /// Adopt a device framebuffer as a single-frame project.
    ///
    /// Empty framebuffers are ignored and leave the session untouched.
    pub fn apply_device_state(&mut self, state: &DeviceState) -> bool {
        if state.width == 0 || state.height == 0 {
            return false;
        }

        self.panel_cols = state.width;
        self.panel_rows = state.height;
        self.frames
            .reset(Wall::from_device(state.width, state.height, &state.framebuffer));
        self.stroke = false;

        true
    }

    pub(crate) fn replace_frames(&mut self, cols: usize, rows: usize, frames: Vec<Wall>) {
        let frames = frames
            .into_iter()
            .map(|wall| {
                if (wall.cols(), wall.rows()) == (cols, rows) {
                    wall
                } else {
                    wall.resized(cols, rows)
                }
            })
            .collect();

        self.panel_cols = cols;
        self.panel_rows = rows;
        self.frames = FrameSequence::from_frames(frames, || Wall::new(cols, rows));
        self.stroke = false;
    }

    /// Replace the working wall and commit it; other frames are resized to match.
    pub(crate) fn replace_current(&mut self, wall: Wall) {
        if (wall.cols(), wall.rows()) != self.panel_size() {
            self.resize_to(wall.cols(), wall.rows());
        }

        *self.frames.working_mut() = wall;
        self.frames.commit();
    }
}
