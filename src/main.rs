mod app;
mod config;
mod core;
mod effect;
mod event;
mod framebuffer;
mod keymap;
mod platform;
mod player;
mod x11;

use anyhow::Result;
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use app::App;
use platform::UnixProcessOps;
use player::PlayerCommands;
use x11::X11Session;

/// X11 window control for omxplayer: move or resize the window and the
/// video overlay follows, half a second after the gesture settles.
#[derive(FromArgs)]
struct Cli {
    /// media file to play
    #[argh(positional)]
    file: String,
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("omxwin {} starting", env!("CARGO_PKG_VERSION"));

    platform::install_signal_handlers()?;

    let scale = framebuffer::probe();
    let session = X11Session::connect(&cli.file, scale)?;
    let procs = UnixProcessOps::new(Some(session.raw_fd()));
    let commands = PlayerCommands::new(std::process::id(), &cli.file);

    App::new(session, procs, commands, scale).run()
}
