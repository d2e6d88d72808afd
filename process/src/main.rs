#[macro_use]
extern crate tracing;

use image::{GenericImageView, Pixel as _, Rgb, RgbImage};
use itertools::Itertools;
use panelforge_common::{
    Composite, EditorSession, PanelGrid, Pixel, ProjectFile, Wall,
    project::{self, read_sprite},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const GRID_COLOR: Rgb<u8> = Rgb([0x22, 0x28, 0x3a]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([0xff, 0xf0, 0x80]);
const CELL_GAP: u32 = 1;

#[derive(argh::FromArgs)]
/// offline tooling for panelforge projects
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(argh::FromArgs)]
#[argh(subcommand)]
enum Command {
    Import(ImportArgs),
    Render(RenderArgs),
    SpriteExport(SpriteExportArgs),
    SpriteImport(SpriteImportArgs),
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "import")]
/// turn a directory of images into a project, one frame per image
struct ImportArgs {
    #[argh(positional)]
    /// path to the directory with image files
    path: PathBuf,

    #[argh(option)]
    /// path to output file
    output: PathBuf,

    #[argh(option, default = "12")]
    /// playback frame rate
    fps: i64,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "render")]
/// render project frames, onion skins included, to PNG files
struct RenderArgs {
    #[argh(positional)]
    /// project file
    project: PathBuf,

    #[argh(option)]
    /// output directory
    output: PathBuf,

    #[argh(option)]
    /// only render this frame
    frame: Option<usize>,

    #[argh(option)]
    /// override the project's pixel size
    pixel_size: Option<u32>,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "sprite-export")]
/// write one frame as a sprite file
struct SpriteExportArgs {
    #[argh(positional)]
    /// project file
    project: PathBuf,

    #[argh(option)]
    /// sprite file to write
    output: PathBuf,

    #[argh(option, default = "0")]
    /// frame to export
    frame: usize,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "sprite-import")]
/// replace one frame of a project with a sprite
struct SpriteImportArgs {
    #[argh(positional)]
    /// project file
    project: PathBuf,

    #[argh(positional)]
    /// sprite file
    sprite: PathBuf,

    #[argh(option, default = "0")]
    /// frame to replace
    frame: usize,

    #[argh(option)]
    /// where to save the result, defaults to the project file
    output: Option<PathBuf>,
}

fn read_frame(entry_path: &Path) -> anyhow::Result<PanelGrid> {
    let image = image::open(entry_path)?;
    let (cols, rows) = image.dimensions();

    let mut grid = PanelGrid::new(cols as usize, rows as usize);
    for (y, x_lane) in &image.pixels().chunk_by(|(_x, y, _pixel)| *y) {
        for (x, _y, pixel) in x_lane {
            let [r, g, b] = pixel.to_rgb().0;
            grid.set(x as usize, y as usize, Pixel::new(r, g, b));
        }
    }

    Ok(grid)
}

fn import(args: ImportArgs) -> anyhow::Result<()> {
    let mut files: Vec<PathBuf> = fs::read_dir(&args.path)?
        .map_ok(|entry| entry.path())
        .try_collect()?;
    files.sort();

    let mut frames = Vec::with_capacity(files.len());
    for path in &files {
        let grid = read_frame(path)?;
        info!(path = %path.display(), cols = grid.cols(), rows = grid.rows(), "read frame");

        let mut wall = Wall::new(grid.cols(), grid.rows());
        if let Some(panel) = wall.panel_mut(0) {
            *panel = grid;
        }
        frames.push(wall);
    }

    let Some((cols, rows)) = frames.first().map(|wall| (wall.cols(), wall.rows())) else {
        anyhow::bail!("no images in {}", args.path.display());
    };

    let mut session = EditorSession::default();
    session.load_project(ProjectFile {
        panel_cols: Some(cols),
        panel_rows: Some(rows),
        fps: Some(args.fps),
        frames: Some(frames),
        ..Default::default()
    });
    project::write_project(&args.output, &session)?;

    Ok(())
}

/// Move the session cursor onto `frame`, clamped to the last frame.
fn seek(session: &mut EditorSession, frame: usize) -> usize {
    while session.prev_frame() {}
    for _ in 0..frame {
        if !session.next_frame() {
            break;
        }
    }

    session.frames().current_index()
}

/// Scale a composite up to canvas pixels, with cell gaps, grid and panel outlines.
fn rasterize(composite: &Composite, pixel_size: u32, show_grid: bool) -> RgbImage {
    let stride = pixel_size + CELL_GAP;
    let extent = |cells: usize| (cells as u32 * stride).saturating_sub(CELL_GAP).max(1);
    let mut canvas = RgbImage::new(extent(composite.width), extent(composite.height));

    for (y, row) in composite.rows_iter().enumerate() {
        for (x, pixel) in row.iter().enumerate() {
            let (x0, y0) = (x as u32 * stride, y as u32 * stride);
            for dy in 0..pixel_size {
                for dx in 0..pixel_size {
                    let edge = dx == 0 || dy == 0 || dx + 1 == pixel_size || dy + 1 == pixel_size;
                    let color = if show_grid && edge && pixel_size > 2 {
                        GRID_COLOR
                    } else {
                        Rgb(pixel.to_array())
                    };
                    canvas.put_pixel(x0 + dx, y0 + dy, color);
                }
            }
        }
    }

    for outline in &composite.outlines {
        let (x0, y0) = (outline.x as u32 * stride, outline.y as u32 * stride);
        let (x1, y1) = (
            (x0 + extent(outline.width)).min(canvas.width()) - 1,
            (y0 + extent(outline.height)).min(canvas.height()) - 1,
        );

        for x in x0..=x1 {
            canvas.put_pixel(x, y0, OUTLINE_COLOR);
            canvas.put_pixel(x, y1, OUTLINE_COLOR);
        }
        for y in y0..=y1 {
            canvas.put_pixel(x0, y, OUTLINE_COLOR);
            canvas.put_pixel(x1, y, OUTLINE_COLOR);
        }
    }

    canvas
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    let mut session = project::open_project(&args.project)?;
    if let Some(size) = args.pixel_size {
        session.set_pixel_size(size);
    }
    fs::create_dir_all(&args.output)?;

    let targets = match args.frame {
        Some(frame) => vec![frame],
        None => (0..session.frames().len()).collect(),
    };

    for target in targets {
        let frame = seek(&mut session, target);
        let canvas = rasterize(&session.render(), session.pixel_size, session.show_grid);

        let path = args.output.join(format!("frame_{frame:04}.png"));
        canvas.save(&path)?;
        info!(path = %path.display(), "rendered {}", session.frame_label());
    }

    Ok(())
}

fn sprite_export(args: SpriteExportArgs) -> anyhow::Result<()> {
    let mut session = project::open_project(&args.project)?;
    seek(&mut session, args.frame);
    project::write_sprite(&args.output, &session)?;
    Ok(())
}

fn sprite_import(args: SpriteImportArgs) -> anyhow::Result<()> {
    let mut session = project::open_project(&args.project)?;
    seek(&mut session, args.frame);
    session.import_sprite(read_sprite(&args.sprite)?)?;

    let output = args.output.as_deref().unwrap_or(&args.project);
    project::write_project(output, &session)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    match args.command {
        Command::Import(cmd) => import(cmd),
        Command::Render(cmd) => render(cmd),
        Command::SpriteExport(cmd) => sprite_export(cmd),
        Command::SpriteImport(cmd) => sprite_import(cmd),
    }
}
