//! nvim-remote CLI
//!
//! Inspect and arrange nvim windows over RPC.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use nvim_remote_api::{RemoteChannel, SocketChannel, Window};
use nvim_remote_config::Config;

#[derive(Parser, Debug)]
#[command(name = "nvim-remote")]
#[command(about = "Drive nvim windows over RPC")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/nvim-remote/config.kdl")]
    config: String,

    /// Socket to connect to (overrides config and $NVIM)
    #[arg(short, long)]
    socket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show buffer, cursor, size and position of a window
    Info { window: i64 },

    /// Print a window's configuration as JSON
    Config { window: i64 },

    /// Apply a named layout from the configuration file
    Apply { window: i64, layout: String },

    /// Change a window's size
    Resize {
        window: i64,
        #[arg(long)]
        width: Option<i64>,
        #[arg(long)]
        height: Option<i64>,
    },

    /// Move the cursor (row is 1-based, col is 0-based)
    Cursor { window: i64, row: i64, col: i64 },

    /// Show another buffer in a window
    SetBuf { window: i64, buffer: i64 },

    /// Close a window
    Close {
        window: i64,
        /// Discard unsaved changes
        #[arg(short, long)]
        force: bool,
    },

    /// Close a window, keeping its buffer loaded
    Hide { window: i64 },

    /// Validate the configuration file
    Validate,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    if let Commands::Validate = cli.command {
        init_tracing(None);
        return cmd_validate(&config_path);
    }

    let config = load_config(&config_path)?;
    init_tracing(Some(&config));

    let socket = cli
        .socket
        .as_deref()
        .map(|s| PathBuf::from(shellexpand::tilde(s).into_owned()))
        .or_else(|| config.global.socket.clone());

    let channel: Arc<dyn RemoteChannel> = Arc::new(
        SocketChannel::connect_with_retry(socket.as_deref(), config.global.connect_retries)
            .into_diagnostic()?,
    );

    match cli.command {
        Commands::Info { window } => cmd_info(&Window::new(window, channel)),
        Commands::Config { window } => cmd_config(&Window::new(window, channel)),
        Commands::Apply { window, layout } => {
            cmd_apply(&Window::new(window, channel), &config, &layout)
        }
        Commands::Resize {
            window,
            width,
            height,
        } => cmd_resize(&Window::new(window, channel), width, height),
        Commands::Cursor { window, row, col } => Window::new(window, channel)
            .set_cursor((row, col))
            .into_diagnostic(),
        Commands::SetBuf { window, buffer } => Window::new(window, channel)
            .set_buffer(buffer)
            .into_diagnostic(),
        Commands::Close { window, force } => Window::new(window, channel)
            .close(force)
            .into_diagnostic(),
        Commands::Hide { window } => Window::new(window, channel).hide().into_diagnostic(),
        Commands::Validate => unreachable!("handled before connecting"),
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over the config file
fn init_tracing(config: Option<&Config>) {
    let default_level = config
        .map(|c| c.global.log_level.as_filter())
        .unwrap_or("warn");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file, falling back to defaults when it doesn't exist
fn load_config(config_path: &Path) -> miette::Result<Config> {
    if !config_path.exists() {
        return Ok(Config::default());
    }
    Ok(nvim_remote_config::parse_config(config_path)?)
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = nvim_remote_config::parse_config(config_path)?;

    println!("Configuration is valid!");
    println!("  Log level: {}", config.global.log_level.as_filter());
    if let Some(socket) = &config.global.socket {
        println!("  Socket: {}", socket.display());
    }
    println!("  Layouts: {}", config.layouts.len());
    for (name, layout) in &config.layouts {
        println!(
            "    - {} ({})",
            name,
            if layout.is_floating() { "floating" } else { "split" }
        );
    }

    Ok(())
}

fn cmd_info(window: &Window) -> miette::Result<()> {
    if !window.is_valid().into_diagnostic()? {
        println!("window {} is not valid", window.id());
        return Ok(());
    }

    let (row, col) = window.position().into_diagnostic()?;
    let (cursor_row, cursor_col) = window.cursor().into_diagnostic()?;

    println!("window {}", window.id());
    println!("  number:   {}", window.number().into_diagnostic()?);
    println!("  buffer:   {}", window.buffer().into_diagnostic()?.id());
    println!("  tabpage:  {}", window.tabpage().into_diagnostic()?.id());
    println!("  cursor:   {}:{}", cursor_row, cursor_col);
    println!(
        "  size:     {}x{}",
        window.width().into_diagnostic()?,
        window.height().into_diagnostic()?
    );
    println!("  position: {},{}", row, col);

    Ok(())
}

fn cmd_config(window: &Window) -> miette::Result<()> {
    let config = window.config().into_diagnostic()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&config).into_diagnostic()?
    );
    Ok(())
}

fn cmd_apply(window: &Window, config: &Config, name: &str) -> miette::Result<()> {
    let Some(layout) = config.layouts.get(name) else {
        miette::bail!("Unknown layout '{}'", name);
    };

    tracing::info!(window = window.id(), layout = name, "applying layout");
    window.set_config(layout).into_diagnostic()
}

fn cmd_resize(window: &Window, width: Option<i64>, height: Option<i64>) -> miette::Result<()> {
    if width.is_none() && height.is_none() {
        miette::bail!("Nothing to do: pass --width and/or --height");
    }
    if let Some(width) = width {
        window.set_width(width).into_diagnostic()?;
    }
    if let Some(height) = height {
        window.set_height(height).into_diagnostic()?;
    }
    Ok(())
}
