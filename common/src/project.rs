//! Project (`.ledproj`) and sprite files.

use crate::{
    error::{Error, Result},
    session::EditorSession,
    wall::{ActivePanels, Wall},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info};

pub const PROJECT_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub version: u32,
    pub panel_cols: usize,
    pub panel_rows: usize,
    pub active_panels: ActivePanels,
    pub pixel_size: u32,
    pub show_grid: bool,
    pub onion_prev: bool,
    pub onion_next: bool,
    pub onion_alpha: f32,
    pub fps: u32,
    pub frames: Vec<Wall>,
}

impl Project {
    /// Snapshot of the session, including uncommitted edits of the current frame.
    pub fn capture(session: &EditorSession) -> Self {
        let (panel_cols, panel_rows) = session.panel_size();
        Self {
            version: PROJECT_VERSION,
            panel_cols,
            panel_rows,
            active_panels: session.active_panels(),
            pixel_size: session.pixel_size,
            show_grid: session.show_grid,
            onion_prev: session.onion.prev,
            onion_next: session.onion.next,
            onion_alpha: session.onion.alpha,
            fps: session.fps(),
            frames: session.frames().snapshot(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Project as read from disk; older files may lack any field.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: Option<u32>,
    pub panel_cols: Option<usize>,
    pub panel_rows: Option<usize>,
    pub active_panels: Option<ActivePanels>,
    pub pixel_size: Option<u32>,
    pub show_grid: Option<bool>,
    pub onion_prev: Option<bool>,
    pub onion_next: Option<bool>,
    pub onion_alpha: Option<f32>,
    pub fps: Option<i64>,
    pub frames: Option<Vec<Wall>>,
}

impl ProjectFile {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Single-frame export.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprite {
    pub panel_cols: usize,
    pub panel_rows: usize,
    pub data: Wall,
}

impl Sprite {
    pub fn capture(session: &EditorSession) -> Self {
        let (panel_cols, panel_rows) = session.panel_size();
        Self {
            panel_cols,
            panel_rows,
            data: session.working().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteFile {
    pub panel_cols: Option<usize>,
    pub panel_rows: Option<usize>,
    pub data: Option<Wall>,
}

impl SpriteFile {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl EditorSession {
    /// Load a project, keeping the current value of every field the file lacks.
    pub fn load_project(&mut self, file: ProjectFile) {
        debug!(version = ?file.version, "loading project");

        let (cur_cols, cur_rows) = self.panel_size();
        let cols = file.panel_cols.filter(|cols| *cols > 0).unwrap_or(cur_cols);
        let rows = file.panel_rows.filter(|rows| *rows > 0).unwrap_or(cur_rows);

        if let Some(active) = file.active_panels {
            self.set_active_panels(active.get() as i64);
        }
        if let Some(size) = file.pixel_size {
            self.set_pixel_size(size);
        }
        if let Some(show) = file.show_grid {
            self.show_grid = show;
        }
        if let Some(prev) = file.onion_prev {
            self.set_onion_prev(prev);
        }
        if let Some(next) = file.onion_next {
            self.set_onion_next(next);
        }
        if let Some(alpha) = file.onion_alpha {
            self.set_onion_alpha(alpha);
        }
        if let Some(fps) = file.fps {
            self.set_fps(fps);
        }

        let frames = match file.frames {
            Some(frames) if !frames.is_empty() => frames,
            _ => self.frames().snapshot(),
        };
        self.replace_frames(cols, rows, frames);
    }

    /// Replace the current frame with a sprite and adopt its dimensions.
    ///
    /// Incomplete sprites are rejected without touching the session.
    pub fn import_sprite(&mut self, file: SpriteFile) -> Result<()> {
        let cols = file
            .panel_cols
            .filter(|cols| *cols > 0)
            .ok_or(Error::IncompleteSprite("panelCols"))?;
        let rows = file
            .panel_rows
            .filter(|rows| *rows > 0)
            .ok_or(Error::IncompleteSprite("panelRows"))?;
        let data = file.data.ok_or(Error::IncompleteSprite("data"))?;

        let wall = if (data.cols(), data.rows()) == (cols, rows) {
            data
        } else {
            data.resized(cols, rows)
        };
        self.replace_current(wall);

        Ok(())
    }
}

pub fn read_project(path: &Path) -> Result<ProjectFile> {
    let text = fs::read_to_string(path)?;
    ProjectFile::from_json(&text)
}

/// Open a project file into a fresh session.
pub fn open_project(path: &Path) -> Result<EditorSession> {
    let mut session = EditorSession::default();
    session.load_project(read_project(path)?);
    info!(path = %path.display(), frames = session.frames().len(), "opened project");
    Ok(session)
}

pub fn write_project(path: &Path, session: &EditorSession) -> Result<()> {
    fs::write(path, Project::capture(session).to_json()?)?;
    info!(path = %path.display(), "saved project");
    Ok(())
}

pub fn read_sprite(path: &Path) -> Result<SpriteFile> {
    let text = fs::read_to_string(path)?;
    SpriteFile::from_json(&text)
}

pub fn write_sprite(path: &Path, session: &EditorSession) -> Result<()> {
    fs::write(path, Sprite::capture(session).to_json()?)?;
    info!(path = %path.display(), "exported sprite");
    Ok(())
}
