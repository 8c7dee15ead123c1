//! Mergetui: 2048-style sliding tile puzzle in the terminal.

mod app;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Options derived from the CLI that affect the game and its presentation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub size: usize,
    pub seed: Option<u64>,
    pub animate: bool,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        theme::Theme::default_for_palette(args.palette)
    });
    let config = GameConfig {
        size: usize::from(args.size),
        seed: args.seed,
        animate: !args.no_animation,
        frame_rate: args.frame_rate,
    };
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// Logs go to a file only; the game owns the terminal.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// 2048-style sliding tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "mergetui",
    version,
    about = "2048-style sliding tile puzzle in the terminal. Slide tiles, merge equal numbers, don't run out of moves.",
    long_about = "Mergetui is a terminal take on the 2048 sliding tile puzzle.\n\n\
        Every move slides all tiles as far as they go. Two equal tiles that collide merge into one \
        of double value and add that value to your score. After each move that changes the board a \
        new 2 (or sometimes 4) appears. The game ends when no move changes the board.\n\n\
        CONTROLS:\n  Arrows / hjkl / wasd  Move    N / R  New game    Q / Esc  Quit"
)]
pub struct Args {
    /// Board size (cells per side).
    #[arg(long, default_value = "4", value_name = "N", value_parser = clap::value_parser!(u16).range(2..=8))]
    pub size: u16,

    /// Seed for tile spawns; the same seed and moves replay the same game.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the classic colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable slide, merge and spawn animations.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["mergetui"]).unwrap();
        assert_eq!(args.size, 4);
        assert_eq!(args.seed, None);
        assert_eq!(args.palette, Palette::Normal);
        assert!(!args.no_animation);
    }

    #[test]
    fn test_args_size_range() {
        assert!(Args::try_parse_from(["mergetui", "--size", "1"]).is_err());
        assert!(Args::try_parse_from(["mergetui", "--size", "9"]).is_err());
        let args = Args::try_parse_from(["mergetui", "--size", "6", "--seed", "7"]).unwrap();
        assert_eq!((args.size, args.seed), (6, Some(7)));
    }

    #[test]
    fn test_palette_aliases() {
        let args = Args::try_parse_from(["mergetui", "--palette", "colourblind"]).unwrap();
        assert_eq!(args.palette, Palette::Colorblind);
    }
}
