#[macro_use]
extern crate tracing;

mod link;

use self::link::HttpLink;
use panelforge_common::{DeviceSync, EditorSession, Pixel, Wall, project};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const DEFAULT_DEVICE: &str = "http://192.168.4.1";

/// How often playback checks whether the next frame is due.
const TICK_INTERVAL: Duration = Duration::from_millis(4);

#[derive(argh::FromArgs)]
/// Drive an LED panel over its HTTP framebuffer API
struct Args {
    #[argh(option, default = "String::from(DEFAULT_DEVICE)")]
    /// base address of the panel, e.g. http://192.168.4.1
    addr: String,

    #[argh(subcommand)]
    command: Command,
}

#[derive(argh::FromArgs)]
#[argh(subcommand)]
enum Command {
    Pull(PullArgs),
    Push(PushArgs),
    Play(PlayArgs),
    Set(SetArgs),
    Clear(ClearArgs),
    Resize(ResizeArgs),
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "pull")]
/// save the panel's framebuffer as a single-frame project
struct PullArgs {
    #[argh(option)]
    /// path of the project file to write
    output: PathBuf,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "push")]
/// upload one frame of a project to the panel
struct PushArgs {
    #[argh(positional)]
    /// project file
    project: PathBuf,

    #[argh(option, default = "0")]
    /// frame to upload
    frame: usize,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "play")]
/// play a project's animation on the panel
struct PlayArgs {
    #[argh(positional)]
    /// project file
    project: PathBuf,

    #[argh(option)]
    /// override the project's frame rate
    fps: Option<i64>,

    #[argh(option, default = "0")]
    /// stop after this many loops (0 plays forever)
    loops: usize,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "set")]
/// set a single pixel
struct SetArgs {
    #[argh(option)]
    /// column
    x: usize,

    #[argh(option)]
    /// row
    y: usize,

    #[argh(option)]
    /// color as #rrggbb
    color: String,
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "clear")]
/// clear the panel to black
struct ClearArgs {}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "resize")]
/// change the panel's framebuffer size
struct ResizeArgs {
    #[argh(option)]
    /// width in pixels
    width: usize,

    #[argh(option)]
    /// height in pixels
    height: usize,
}

type Link = DeviceSync<HttpLink>;

/// Load `frame` of a project, clamped to the last frame.
fn project_frame(path: &Path, frame: usize) -> anyhow::Result<Wall> {
    let session = project::open_project(path)?;
    let frames = session.frames().snapshot();
    let idx = frame.min(frames.len() - 1);
    if idx != frame {
        warn!(requested = frame, using = idx, "frame out of range");
    }

    Ok(frames[idx].clone())
}

/// Current panel content, used as the baseline for differential uploads.
async fn device_wall(sync: &mut Link) -> anyhow::Result<Wall> {
    let mut scratch = EditorSession::default();
    sync.fetch_state(&mut scratch).await?;
    Ok(scratch.working().clone())
}

async fn pull(sync: &mut Link, args: PullArgs) -> anyhow::Result<()> {
    let mut session = EditorSession::default();
    sync.fetch_state(&mut session).await?;
    project::write_project(&args.output, &session)?;
    Ok(())
}

async fn push(sync: &mut Link, args: PushArgs) -> anyhow::Result<()> {
    let wall = project_frame(&args.project, args.frame)?;
    let on_device = device_wall(sync).await?;

    let sent = sync.push_wall(&wall, Some(&on_device)).await?;
    info!(sent, "frame uploaded");
    Ok(())
}

async fn play(sync: &mut Link, args: PlayArgs) -> anyhow::Result<()> {
    let mut session = project::open_project(&args.project)?;
    if let Some(fps) = args.fps {
        session.set_fps(fps);
    }

    let mut shown = Some(device_wall(sync).await?);
    info!(frames = session.frames().len(), fps = session.fps(), "starting playback");

    let start = Instant::now();
    let mut loops = 0;
    session.play();

    loop {
        let frame = session.working().clone();
        match sync.push_wall(&frame, shown.as_ref()).await {
            Ok(sent) => {
                debug!(frame = session.frames().current_index(), sent, "frame shown");
                shown = Some(frame);
            }
            Err(error) => {
                // resend everything next time, the panel state is unknown now
                warn!(%error, "{}", sync.status());
                shown = None;
            }
        }

        loop {
            monoio::time::sleep(TICK_INTERVAL).await;
            if session.tick(start.elapsed().as_secs_f64() * 1000.0) {
                break;
            }
        }

        if session.frames().current_index() == 0 {
            loops += 1;
            info!(loops, "loop finished");
            if args.loops != 0 && loops >= args.loops {
                session.stop();
                return Ok(());
            }
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let base = link::parse_base(&args.addr)?;
    let transport = HttpLink::new(&base)?;
    let mut sync = DeviceSync::new(transport.base().to_owned(), transport);

    let result = match args.command {
        Command::Pull(cmd) => pull(&mut sync, cmd).await,
        Command::Push(cmd) => push(&mut sync, cmd).await,
        Command::Play(cmd) => play(&mut sync, cmd).await,
        Command::Set(cmd) => {
            let pixel = Pixel::try_from_hex(&cmd.color)?;
            sync.push_pixel(cmd.x, cmd.y, pixel).await.map_err(Into::into)
        }
        Command::Clear(ClearArgs {}) => {
            let mut session = EditorSession::default();
            sync.clear_device(&mut session).await.map_err(Into::into)
        }
        Command::Resize(cmd) => {
            let mut session = EditorSession::default();
            sync.resize_device(cmd.width, cmd.height, &mut session)
                .await
                .map_err(Into::into)
        }
    };

    info!("{}", sync.status());
    result
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let mut runtime = monoio::RuntimeBuilder::<monoio::FusionDriver>::new()
        .enable_timer()
        .build()?;

    runtime.block_on(run(args))
}
