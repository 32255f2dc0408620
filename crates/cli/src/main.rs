//! Enea command line frontend.
//!
//! Scans the configured ROM folder, lists the playable games and launches one
//! of them in the emulator with the bindings of the connected input devices.
//!
//! ```bash
//! # List the games found in ~/.enea/roms
//! enea --list
//!
//! # Play Street Fighter II from another folder
//! enea --rom-dir /media/usb/roms --launch sf2
//! ```

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use enea_core::{config, AppConfig, Context, Game};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Arcade ROM frontend
#[derive(Parser, Debug)]
#[command(name = "enea")]
#[command(about = "Arcade ROM frontend")]
#[command(version)]
struct Args {
    /// Folder scanned for ROMs, overriding the configuration
    #[arg(long)]
    rom_dir: Option<PathBuf>,

    /// Print the playable games
    #[arg(long)]
    list: bool,

    /// Play the game whose ROM file is named STEM
    #[arg(long, value_name = "STEM")]
    launch: Option<String>,

    /// Do not write the scan cache on exit
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let base = config::base_dir()?;
    config::ensure_default_config(&base)?;
    let mut config = AppConfig::load()?;
    if let Some(rom_dir) = args.rom_dir {
        config.rom_dir = rom_dir;
    }
    config.ensure_directories()?;
    init_logging(&config.log_dir())?;
    info!("enea {} starting with roms from {}", enea_core::VERSION, config.rom_dir.display());

    let context = Context::new(config);
    let source = Arc::new(context.rom_source());
    source
        .spawn_monitor()
        .await
        .context("rom scan task failed")?;

    let games = source.games();
    info!("{} games available", games.len());

    if args.list {
        for game in &games {
            println!("{:<12} {}", game.stem().unwrap_or_default(), game.display_name());
        }
    }

    let launched = match &args.launch {
        Some(stem) => launch(&context, &games, stem).await,
        None => Ok(()),
    };

    if !args.no_cache {
        if let Err(err) = source.write_cache() {
            warn!("Cache not written: {err}");
        }
    }

    launched
}

async fn launch(context: &Context, games: &[Game], stem: &str) -> Result<()> {
    let Some(game) = games.iter().find(|game| game.stem() == Some(stem)) else {
        bail!("no playable game named {stem}");
    };

    let emulator = context.emulator();
    match emulator.info().await {
        Some(info) => info!("Using {} {}", info.name, info.version),
        None => warn!("Emulator {} did not report a version", emulator.program()),
    }

    let control_string = context.input_manager().control_string()?;
    emulator
        .run(game, &control_string)
        .await
        .with_context(|| format!("failed to play {}", game.display_name()))?;
    Ok(())
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join("enea.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_launch_arguments() {
        let args = Args::try_parse_from(["enea", "--rom-dir", "/media/usb/roms", "--launch", "sf2", "--no-cache"])
            .unwrap();
        assert_eq!(args.rom_dir, Some(PathBuf::from("/media/usb/roms")));
        assert_eq!(args.launch.as_deref(), Some("sf2"));
        assert!(args.no_cache);
        assert!(!args.list);
    }
}
