//! Asciiscape CLI
//!
//! Animated ASCII art in the terminal, or rendered headless to stdout.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{bail, Context};
use asciiscape::device::EnvDeviceSignals;
use asciiscape::effects::EffectSelection;
use asciiscape::surface::{HeadlessSurface, TerminalSurface};
use asciiscape::theme::{FileThemeStore, MemoryThemeStore, ThemeStore};
use asciiscape::tui::App;
use asciiscape::{AsciiAnimationSystem, Config, EffectKind};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Asciiscape - ASCII-art particle animation with Vim-style theme switching
#[derive(Parser, Debug)]
#[command(name = "asciiscape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/asciiscape/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start on this theme: a number from 1 or a name such as "matrix"
    #[arg(long)]
    theme: Option<String>,

    /// Seed for particle phases, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Fixed frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Where the active theme is stored
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Render off-screen and print the last frame
    #[arg(long)]
    headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value_t = 60)]
    frames: u64,

    /// Headless canvas width
    #[arg(long, default_value_t = 100)]
    width: u16,

    /// Headless canvas height
    #[arg(long, default_value_t = 30)]
    height: u16,

    /// Write logs here (the interactive mode logs nowhere otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;
    let theme = cli.theme.as_deref().map(parse_theme).transpose()?;
    let store = FileThemeStore::new(
        config
            .state_file
            .clone()
            .unwrap_or_else(FileThemeStore::default_path),
    );

    if cli.headless {
        run_headless(&cli, config, theme, store)
    } else {
        run_tui(config, theme, store).await
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else if cli.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
    // Interactive mode without a log file stays silent so the screen is not
    // overwritten.
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(fps) = cli.fps {
        config = config.with_fps(fps);
    }
    if let Some(path) = &cli.state_file {
        config = config.with_state_file(path.clone());
    }
    Ok(config)
}

/// `--theme` argument: 1-based number or any accepted theme name.
fn parse_theme(arg: &str) -> anyhow::Result<EffectSelection> {
    if let Ok(n) = arg.trim().parse::<usize>() {
        return Ok(EffectSelection::Index(n.saturating_sub(1)));
    }
    match EffectKind::from_name(arg) {
        Some(kind) => {
            let index = EffectKind::ALL
                .iter()
                .position(|k| *k == kind)
                .unwrap_or_default();
            Ok(EffectSelection::Index(index))
        }
        None => bail!(
            "unknown theme {:?} (expected 1-{} or one of: {})",
            arg,
            EffectKind::ALL.len(),
            EffectKind::ALL.map(|k| k.name()).join(", ")
        ),
    }
}

/// Headless runs read the stored theme but never write it back.
fn run_headless(
    cli: &Cli,
    config: Config,
    theme: Option<EffectSelection>,
    file: FileThemeStore,
) -> anyhow::Result<()> {
    let store = match file.read_raw() {
        Some(raw) => MemoryThemeStore::with_raw(raw),
        None => MemoryThemeStore::new(),
    };
    let surface = HeadlessSurface::new(cli.width, cli.height);
    let mut system =
        AsciiAnimationSystem::new(surface, config, Box::new(EnvDeviceSignals), Box::new(store))?;

    let mut now = Instant::now();
    if let Some(selection) = theme {
        system.switch_theme(selection, now);
    }
    system.start();
    info!(theme = system.theme_info().name, frames = cli.frames, "rendering headless");

    let interval = system.budget().interval();
    let mut drawn = 0;
    while drawn < cli.frames && system.is_running() {
        if system.frame(now)? {
            drawn += 1;
        }
        now += interval;
    }

    println!("{}", system.surface().text());
    system.destroy();
    Ok(())
}

async fn run_tui(
    config: Config,
    theme: Option<EffectSelection>,
    store: FileThemeStore,
) -> anyhow::Result<()> {
    let surface = TerminalSurface::new().context("setting up the terminal")?;
    let mut system =
        AsciiAnimationSystem::new(surface, config, Box::new(EnvDeviceSignals), Box::new(store))?;
    if let Some(selection) = theme {
        system.switch_theme(selection, Instant::now());
    }

    let mut app = App::new(system);
    app.run().await?;
    Ok(())
}
