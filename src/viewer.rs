//! Concrete collaborators for [`SliceNavigationController`] backed by a
//! [`Volume`].
//!
//! [`SliceNavigationController`]: crate::navigation::SliceNavigationController

use std::path::{Path, PathBuf};

use image::GrayImage;
use tracing::{info, warn};

use crate::{
    enums::{Interpolation, Orientation},
    navigation::{ImageStackProvider, StatusSink},
    volume::Volume,
};

/// Help text drawn in the top-left corner of the viewer.
pub const USAGE_HINT: &str = "Slice with mouse wheel\n  or Up/Down-Key\n- Zoom with pressed right\n  mouse button while dragging";

/// Renders slices of a volume along one axis into an 8-bit frame.
pub struct VolumeStack {
    volume: Volume,
    orientation: Orientation,
    interpolation: Interpolation,
    frame: Option<(usize, GrayImage)>,
}

impl VolumeStack {
    pub fn new(volume: Volume, orientation: Orientation, interpolation: Interpolation) -> Self {
        Self {
            volume,
            orientation,
            interpolation,
            frame: None,
        }
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Last rendered frame and the slice it shows
    pub fn frame(&self) -> Option<(usize, &GrayImage)> {
        self.frame.as_ref().map(|(index, image)| (*index, image))
    }

    /// Write the last rendered frame to `dir` as `slice_NNNN.png`.
    ///
    /// Returns the written path, or `None` if nothing has been rendered yet.
    pub fn save_frame(&self, dir: &Path) -> Result<Option<PathBuf>, image::ImageError> {
        let Some((index, image)) = &self.frame else {
            return Ok(None);
        };
        let path = dir.join(format!("slice_{index:04}.png"));
        image.save(&path)?;
        Ok(Some(path))
    }
}

impl ImageStackProvider for VolumeStack {
    fn slice_count(&self) -> usize {
        self.volume.slice_count(self.orientation)
    }

    fn render_slice_at(&mut self, index: usize) {
        match self
            .volume
            .get_image_from_axis(index, self.orientation, self.interpolation)
        {
            Some(image) => self.frame = Some((index, image)),
            None => warn!(index, "Slice could not be rendered"),
        }
    }
}

/// Text overlay holding the current status line.
#[derive(Debug, Default)]
pub struct StatusOverlay {
    text: String,
    redraws: usize,
}

impl StatusOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of times the overlay has been redrawn
    pub fn redraws(&self) -> usize {
        self.redraws
    }
}

impl StatusSink for StatusOverlay {
    fn set_status_text(&mut self, text: &str) {
        text.clone_into(&mut self.text);
    }

    fn refresh(&mut self) {
        self.redraws += 1;
        info!(target: "overlay", "{}", self.text);
    }
}
