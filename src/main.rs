//! `tiff` — inspect and round-trip TIFF/BigTIFF whole-slide images.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_tiff_codec::config::{Cli, Command, InspectConfig, RoundtripConfig};
use wsi_tiff_codec::tiff::Tiff;
use wsi_tiff_codec::wire;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Inspect(config) => run_inspect(config),
        Command::Roundtrip(config) => run_roundtrip(config),
    }
}

fn run_inspect(config: InspectConfig) -> ExitCode {
    let slide = match Tiff::open(&config.path) {
        Ok(slide) => slide,
        Err(e) => {
            error!("failed to parse {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", config.path.display());
    println!("  file size:      {} bytes", slide.filesize);
    println!(
        "  byte order:     {}",
        if slide.is_big_endian { "big-endian" } else { "little-endian" }
    );
    println!("  BigTIFF:        {}", slide.is_bigtiff);
    println!("  IFDs:           {}", slide.ifds.len());
    println!("  levels:         {}", slide.level_count);
    println!("  mpp:            {:.4} x {:.4}", slide.mpp_x, slide.mpp_y);
    println!("  main image:     IFD {}", slide.main_image_index);
    print_role("macro image", slide.macro_image_index);
    print_role("label image", slide.label_image_index);
    print_role("first level", slide.level_image_index);

    for ifd in &slide.ifds {
        println!(
            "  IFD {:>3}: {:?} {}x{} tiles={}x{} count={}",
            ifd.ifd_index,
            ifd.subimage_type,
            ifd.image_width,
            ifd.image_height,
            ifd.tile_width,
            ifd.tile_height,
            ifd.tile_count,
        );
    }

    ExitCode::SUCCESS
}

fn print_role(label: &str, index: Option<usize>) {
    match index {
        Some(i) => println!("  {:<12}  IFD {}", label, i),
        None => println!("  {:<12}  (none)", label),
    }
}

fn run_roundtrip(config: RoundtripConfig) -> ExitCode {
    let slide = match Tiff::open(&config.path) {
        Ok(slide) => slide,
        Err(e) => {
            error!("failed to parse {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let compress = config.compress();
    let bytes = wire::serialize(&slide, compress);
    info!(
        bytes = bytes.len(),
        compressed = compress,
        "serialized wire payload"
    );

    let restored = match wire::deserialize(&bytes) {
        Ok(restored) => restored,
        Err(e) => {
            error!("failed to deserialize wire payload: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let matches = restored.ifds.len() == slide.ifds.len()
        && restored.level_count == slide.level_count
        && restored.main_image_index == slide.main_image_index
        && restored.macro_image_index == slide.macro_image_index
        && restored.label_image_index == slide.label_image_index
        && restored.level_image_index == slide.level_image_index;

    println!("{}", config.path.display());
    println!("  wire bytes:  {}", bytes.len());
    println!("  compressed:  {}", compress);
    println!("  round-trip:  {}", if matches { "OK" } else { "MISMATCH" });

    if matches {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_tiff_codec=debug"
    } else {
        "wsi_tiff_codec=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
