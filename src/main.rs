use std::sync::Arc;

use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        BoolishValueParser, Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotdeck::{
    cli, config, error,
    types::{PkceToken, RepeatMode},
    utils,
};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the web player server
    Serve(ServeOptions),

    /// Authorize the terminal remote with Spotify
    Login,

    /// Forget the cached terminal token
    Logout,

    /// Show the current track
    Now(NowOptions),

    /// Start playback of a track or context, or resume
    Play(PlayOptions),

    /// Pause playback
    Pause(DeviceOption),

    /// Resume playback
    Resume(DeviceOption),

    /// Pause when playing, resume otherwise
    Toggle(DeviceOption),

    /// Skip to the next track
    Next(DeviceOption),

    /// Go back to the previous track
    Previous(DeviceOption),

    /// Seek within the current track
    Seek(SeekOptions),

    /// Turn shuffle on or off
    Shuffle(ShuffleOptions),

    /// Set the repeat mode
    Repeat(RepeatOptions),

    /// Set the volume
    Volume(VolumeOptions),

    /// List available playback devices
    Devices,

    /// Move playback to another device
    Transfer(TransferOptions),

    /// List your playlists, recently played first
    Playlists,

    /// Show recently played tracks
    Recent(RecentOptions),

    /// Show the home feed
    Home,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS
    #[clap(long)]
    pub addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeviceOption {
    /// Target device id, defaults to the active device
    #[clap(long)]
    pub device: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct NowOptions {
    /// Keep following playback until Ctrl-C
    #[clap(long, short)]
    pub follow: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    /// Track, album, playlist or artist URI
    pub uri: Option<String>,

    /// Track index within the context
    #[clap(long)]
    pub offset: Option<u32>,

    /// Start position (seconds, m:ss or h:mm:ss)
    #[clap(long, value_parser = utils::parse_position)]
    pub position: Option<u64>,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct SeekOptions {
    /// Position (seconds, m:ss or h:mm:ss)
    #[clap(value_parser = utils::parse_position)]
    pub position: u64,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct ShuffleOptions {
    /// on/off
    #[clap(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub state: bool,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct RepeatOptions {
    /// off, context or track
    pub mode: RepeatMode,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct VolumeOptions {
    /// Volume in percent
    #[clap(value_parser = clap::value_parser!(u8).range(0..=100))]
    pub percent: u8,

    #[clap(flatten)]
    pub device: DeviceOption,
}

#[derive(Parser, Debug, Clone)]
pub struct TransferOptions {
    /// Target device id, see `spotdeck devices`
    pub device_id: String,

    /// Start playing on the new device
    #[clap(long)]
    pub play: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RecentOptions {
    /// Number of tracks (max 50)
    #[clap(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => cli::serve(opt.addr).await,
        Command::Login => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }
        Command::Logout => cli::logout().await,
        Command::Now(opt) => cli::now_playing(opt.follow).await,
        Command::Play(opt) => {
            cli::play(opt.uri, opt.offset, opt.position, opt.device.device).await
        }
        Command::Pause(opt) => cli::pause(opt.device).await,
        Command::Resume(opt) => cli::resume(opt.device).await,
        Command::Toggle(opt) => cli::toggle(opt.device).await,
        Command::Next(opt) => cli::next(opt.device).await,
        Command::Previous(opt) => cli::previous(opt.device).await,
        Command::Seek(opt) => cli::seek(opt.position, opt.device.device).await,
        Command::Shuffle(opt) => cli::shuffle(opt.state, opt.device.device).await,
        Command::Repeat(opt) => cli::repeat(opt.mode, opt.device.device).await,
        Command::Volume(opt) => cli::volume(opt.percent, opt.device.device).await,
        Command::Devices => cli::devices().await,
        Command::Transfer(opt) => cli::transfer(opt.device_id, opt.play).await,
        Command::Playlists => cli::playlists().await,
        Command::Recent(opt) => cli::recent(opt.limit).await,
        Command::Home => cli::home().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
