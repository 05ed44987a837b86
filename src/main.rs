//! dicom-slicer - step through a DICOM series slice by slice.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dicom_slicer::{
    config::ViewerConfig,
    navigation::{InputEvent, SliceNavigationController},
    viewer::{StatusOverlay, USAGE_HINT, VolumeStack},
    volume_loader::VolumeLoader,
};

type Controller = SliceNavigationController<VolumeStack, StatusOverlay>;

fn main() -> ExitCode {
    let config = ViewerConfig::parse();
    init_logging(config.verbose);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: ViewerConfig) -> Result<()> {
    config.validate()?;

    let output = config.output.as_deref();
    if let Some(dir) = output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let volume = VolumeLoader::load_from_path(&config.path, config.sort_by)
        .with_context(|| format!("Failed to load DICOM series from {}", config.path.display()))?;
    let (depth, height, width) = volume.dim();
    info!(
        "Loaded volume {}x{}x{} from {}",
        width,
        height,
        depth,
        config.path.display()
    );

    let stack = VolumeStack::new(volume, config.orientation, config.interpolation());
    let mut controller = SliceNavigationController::from_provider(stack, StatusOverlay::new())?;

    for line in USAGE_HINT.lines() {
        info!(target: "overlay", "{}", line);
    }
    controller.show_current();
    save_frame(&controller, output)?;

    match config.events {
        Some(events) => {
            for event in events {
                dispatch(&mut controller, event, output)?;
            }
        }
        None => {
            for line in io::stdin().lock().lines() {
                let line = line.context("Failed to read input events")?;
                let token = line.trim();
                if token.is_empty() {
                    continue;
                }
                if token.eq_ignore_ascii_case("q") || token.eq_ignore_ascii_case("quit") {
                    break;
                }
                match token.parse::<InputEvent>() {
                    Ok(event) => dispatch(&mut controller, event, output)?,
                    Err(e) => warn!("{}", e),
                }
            }
        }
    }

    info!(
        "Session ended at slice {} ({} redraws)",
        controller.slice_index(),
        controller.sink().redraws()
    );
    Ok(())
}

fn dispatch(controller: &mut Controller, event: InputEvent, output: Option<&Path>) -> Result<()> {
    if controller.handle_input(event) {
        save_frame(controller, output)?;
    }
    Ok(())
}

fn save_frame(controller: &Controller, output: Option<&Path>) -> Result<()> {
    let Some(dir) = output else {
        return Ok(());
    };
    if let Some(path) = controller
        .provider()
        .save_frame(dir)
        .context("Failed to write slice image")?
    {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dicom_slicer=debug,overlay=debug"
    } else {
        "dicom_slicer=info,overlay=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
