mod commands;

use clap::{Parser, Subcommand};

use commands::args::{self, MoveArgs};
use commands::group::GroupCommands;
use commands::layout::LayoutCommands;
use commands::preset::PresetCommands;
use lucent_core::Command;

#[derive(Parser)]
#[command(
    name = "lucent",
    version,
    about = "Window opacity, always-on-top, click-through and linked drag for Windows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the background daemon
    Start,
    /// Stop the background daemon
    Stop,
    /// Show whether the daemon is running
    Status,
    /// List tracked windows
    List,
    /// Rescan the window list now instead of waiting for the next poll
    Refresh,
    /// Set a window's opacity
    Opacity {
        /// Window handle (decimal or hex with 0x prefix)
        #[arg(value_parser = args::parse_hwnd)]
        hwnd: usize,
        /// Opacity in percent, 0-100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Toggle always-on-top for a window
    Topmost {
        #[arg(value_parser = args::parse_hwnd)]
        hwnd: usize,
    },
    /// Toggle click-through for a window
    ClickThrough {
        #[arg(value_parser = args::parse_hwnd)]
        hwnd: usize,
    },
    /// Move and resize a window
    Move(MoveArgs),
    /// Set the opacity of every tracked window
    BulkOpacity {
        /// Opacity in percent; defaults to the configured bulk opacity
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: Option<u8>,
    },
    /// Manage window groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Manage window presets
    Preset {
        #[command(subcommand)]
        command: PresetCommands,
    },
    /// Manage saved layouts
    Layout {
        #[command(subcommand)]
        command: LayoutCommands,
    },
    /// Settings file operations
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Run the daemon (internal, not for direct use)
    #[command(hide = true)]
    Daemon,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Write the daemon's current settings to disk
    Save,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => commands::start::execute(),
        Commands::Stop => commands::stop::execute(),
        Commands::Status => commands::status::execute(),
        Commands::Daemon => commands::daemon::execute(),
        Commands::List => commands::list::execute(),
        Commands::Refresh => commands::send::execute(Command::Refresh),
        Commands::Opacity { hwnd, percent } => {
            commands::send::execute(Command::SetOpacity { hwnd, percent });
        }
        Commands::Topmost { hwnd } => commands::send::execute(Command::ToggleTopmost { hwnd }),
        Commands::ClickThrough { hwnd } => {
            commands::send::execute(Command::ToggleClickThrough { hwnd });
        }
        Commands::Move(args) => commands::send::execute(Command::MoveWindow {
            hwnd: args.hwnd,
            rect: args.rect(),
        }),
        Commands::BulkOpacity { percent } => {
            commands::send::execute(Command::BulkOpacity { percent });
        }
        Commands::Group { command } => commands::group::execute(command),
        Commands::Preset { command } => commands::preset::execute(command),
        Commands::Layout { command } => commands::layout::execute(command),
        Commands::Settings { command } => match command {
            SettingsCommands::Save => commands::send::execute(Command::SaveSettings),
        },
    }
}
