use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::debug;
use partedit_core::{FileSectorStore, ImageContext, SchemeContext};

mod prompt;
mod repl;

#[derive(Parser)]
#[command(name = "partedit")]
#[command(about = "Partition table editor for raw disk images", long_about = None)]
#[command(version)]
struct Cli {
    /// Image file to edit (created if missing)
    image: PathBuf,

    /// Diagnostic verbosity
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Logical sector size in bytes (512, 1024, 2048 or 4096)
    #[arg(long, default_value_t = 512)]
    sector_size: u64,

    /// Grow the image to at least this many bytes before editing
    #[arg(long)]
    min_img_size: Option<u64>,

    /// Partition alignment in sectors (power of two); defaults to 1 MiB
    /// worth of sectors
    #[arg(long)]
    alignment: Option<u64>,

    /// Heads per cylinder for CHS encoding (1-255)
    #[arg(long, default_value_t = 255)]
    heads: u8,

    /// Sectors per track for CHS encoding (1-63)
    #[arg(long, default_value_t = 63)]
    sectors: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> log::LevelFilter {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::None => log::LevelFilter::Off,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .format_timestamp(None)
        .init();

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&cli.image)
        .with_context(|| format!("unable to open {}", cli.image.display()))?;

    if let Some(min_size) = cli.min_img_size {
        let current = file.metadata()?.len();
        if current < min_size {
            debug!("growing image from {current} to {min_size} bytes");
            file.set_len(min_size)
                .context("unable to grow the image file")?;
        }
    }

    let image_size = file.metadata()?.len();
    let mut img = ImageContext::new(image_size, cli.sector_size)?;
    if let Some(alignment) = cli.alignment {
        img.set_alignment(alignment)?;
    }
    img.set_chs_geometry(cli.heads, cli.sectors)?;

    let mut store = FileSectorStore::new(file, image_size, cli.sector_size);
    let mut context = SchemeContext::new();
    context.load(&mut store, &img)?;

    println!("partedit {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Image: {} ({} bytes, {} sectors of {})\n",
        cli.image.display(),
        image_size,
        img.total_sectors(),
        cli.sector_size
    );

    repl::run(&mut context, &mut store, &img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn option_parsing() {
        let cli = Cli::parse_from([
            "partedit",
            "--log-level",
            "none",
            "--sector-size",
            "4096",
            "--min-img-size",
            "1048576",
            "--alignment",
            "256",
            "--heads",
            "16",
            "--sectors",
            "32",
            "disk.img",
        ]);
        assert_eq!(cli.log_level, LogLevel::None);
        assert_eq!(cli.sector_size, 4096);
        assert_eq!(cli.min_img_size, Some(1_048_576));
        assert_eq!(cli.alignment, Some(256));
        assert_eq!(cli.heads, 16);
        assert_eq!(cli.sectors, 32);
        assert_eq!(cli.image, PathBuf::from("disk.img"));
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["partedit", "disk.img"]);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.sector_size, 512);
        assert_eq!(cli.min_img_size, None);
        assert_eq!(cli.alignment, None);
        assert_eq!(cli.heads, 255);
        assert_eq!(cli.sectors, 63);
    }
}
