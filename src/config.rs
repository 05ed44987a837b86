//! Command-line configuration for the slice viewer.
//!
//! Every option can also be given through an environment variable with the
//! `SLICER_` prefix:
//!
//! - `SLICER_PATH` - DICOM file or directory holding a series
//! - `SLICER_ORIENTATION` - axis to slice along (default: axial)
//! - `SLICER_SORT_BY` - slice ordering key (default: image-position-patient)
//! - `SLICER_INTERPOLATE` - resample coronal/sagittal slices to isotropic aspect
//! - `SLICER_EVENTS` - comma separated input events instead of stdin
//! - `SLICER_OUTPUT` - directory receiving a PNG per rendered slice

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::enums::{Interpolation, Orientation, SortBy};
use crate::navigation::InputEvent;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Input path does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Output path exists and is not a directory: {}", .0.display())]
    OutputNotDirectory(PathBuf),
}

/// Interactive DICOM slice viewer.
///
/// Loads a DICOM series and steps through its slices with mouse wheel or
/// Up/Down key events, read from `--events` or one per line from stdin.
#[derive(Parser, Debug, Clone)]
#[command(name = "dicom-slicer")]
#[command(author, version, about, long_about = None)]
pub struct ViewerConfig {
    /// DICOM file or directory containing the series.
    #[arg(env = "SLICER_PATH")]
    pub path: PathBuf,

    /// Axis to slice the volume along.
    #[arg(long, value_enum, default_value_t = Orientation::Axial, env = "SLICER_ORIENTATION")]
    pub orientation: Orientation,

    /// Key used to order slices within the series.
    #[arg(long, value_enum, default_value_t = SortBy::ImagePositionPatient, env = "SLICER_SORT_BY")]
    pub sort_by: SortBy,

    /// Resample coronal and sagittal slices to isotropic pixel aspect.
    #[arg(long, env = "SLICER_INTERPOLATE")]
    pub interpolate: bool,

    /// Input events to replay (wheel-up, wheel-down, up, down).
    #[arg(long, value_delimiter = ',', env = "SLICER_EVENTS")]
    pub events: Option<Vec<InputEvent>>,

    /// Directory to write each rendered slice to as PNG.
    #[arg(short, long, env = "SLICER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::MissingInput(self.path.clone()));
        }
        if let Some(output) = &self.output {
            if output.exists() && !output.is_dir() {
                return Err(ConfigError::OutputNotDirectory(output.clone()));
            }
        }
        Ok(())
    }

    pub fn interpolation(&self) -> Interpolation {
        if self.interpolate {
            Interpolation::Bilinear
        } else {
            Interpolation::None
        }
    }
}
