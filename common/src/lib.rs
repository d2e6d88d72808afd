pub mod color;
pub mod compositor;
pub mod device;
pub mod error;
pub mod frames;
pub mod panel;
pub mod project;
pub mod session;
pub mod wall;

pub use self::{
    color::{PALETTE_32, Pixel, nearest_palette_index},
    compositor::{Composite, OnionSkin, render_frame, render_onion_layer, render_sequence},
    device::{DeviceState, DeviceSync, Request, Transport},
    error::{Error, Result},
    frames::FrameSequence,
    panel::PanelGrid,
    project::{Project, ProjectFile, Sprite, SpriteFile},
    session::{EditorSession, Tool},
    wall::{ActivePanels, PanelCoord, Wall},
};
