//! # DICOM-slicer library
//!
//! This crate loads a DICOM series as a volume and lets a user step through
//! its slices one at a time.
//!
//! The volume side builds on the dicom-rs ecosystem. Volumes can either be
//! loaded from multiple [`FileDicomObject<InMemDicomObject>`], from a list
//! of files, from a single file or from a folder holding a series. The
//! volume can be sliced in the three different medical axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Coronal and Sagittal slices can optionally be interpolated to preserve
//! the aspect ratio between the images. DICOM files are assumed to have the
//! following attributes:
//!   - Axial data set (Only Coronal and Sagittal axes are interpolated)
//!   - No multiframe (always the first frame is used)
//!   - Images from the same series (Series Instance UID) and acquisition
//!     (Acquisition Number)
//!
//! Navigation is handled by [`SliceNavigationController`], a saturating
//! slice counter driven by mouse wheel and Up/Down key events. It renders
//! through an [`ImageStackProvider`] and reports progress to a
//! [`StatusSink`]; [`viewer`] provides both for a loaded [`Volume`].
//!
//! # Examples
//!
//! ## Stepping through a series
//!
//! ```no_run
//! # use dicom_slicer::{
//! #     Interpolation, InputEvent, Orientation, SliceNavigationController, SortBy,
//! #     StatusOverlay, VolumeLoader, VolumeStack,
//! # };
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let stack = VolumeStack::new(volume, Orientation::Axial, Interpolation::None);
//! let mut controller = SliceNavigationController::from_provider(stack, StatusOverlay::new())
//!     .expect("series should not be empty");
//! controller.handle_input(InputEvent::WheelUp);
//! controller.provider().save_frame("out".as_ref()).expect("should have written slice");
//! ```
//!
//! [`FileDicomObject<InMemDicomObject>`]: https://docs.rs/dicom-object/latest/dicom_object/struct.FileDicomObject.html

pub mod config;
pub mod enums;
mod interpolator;
pub mod navigation;
pub mod viewer;
pub mod volume;
pub mod volume_loader;

pub use enums::{Interpolation, Orientation, SortBy};
pub use navigation::{
    ImageStackProvider, InputEvent, NavigationError, NavigationEvent, SliceNavigationController,
    StatusMessage, StatusSink,
};
pub use viewer::{StatusOverlay, VolumeStack};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
