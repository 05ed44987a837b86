use crate::{enums::SortBy, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

/// Sort key paired with the source object and its decoded first frame
type SortableImage<'a> = (
    Option<f32>,
    (&'a FileDicomObject<InMemDicomObject>, Array2<u16>),
);

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut images_with_order: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_image_with_order(dicom_object, sort_by))
            .collect();

        if images_with_order.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        if images_with_order.len() < dicom_objects.len() {
            warn!(
                "Stacking {} of {} DICOM objects, the rest had no decodable image",
                images_with_order.len(),
                dicom_objects.len()
            );
        }

        Self::sort_images(&mut images_with_order, sort_by);

        let (objects, images): (Vec<_>, Vec<_>) = images_with_order
            .into_iter()
            .map(|(_, entry)| entry)
            .unzip();

        Self::validate_dimensions(&images)?;

        let volume_array = Self::build_volume_array(&images);
        let spacing = Self::get_spacing(&objects);
        let (depth, height, width) = volume_array.dim();
        info!(
            depth,
            height,
            width,
            "Slicer: Min = 0, Max = {}",
            depth - 1
        );

        Ok(Volume::new(volume_array, spacing))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing DICOM files.
    ///
    /// Files ending in ".dcm" and files without an extension are considered;
    /// those that cannot be parsed as DICOM are skipped.
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && Self::is_candidate(path))
            .collect();
        paths.sort();

        let objects: Vec<_> = paths
            .iter()
            .filter_map(|path| match open_file(path) {
                Ok(object) => Some(object),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        if objects.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        debug!(
            "Read {} DICOM file(s) from {}",
            objects.len(),
            path.as_ref().display()
        );

        Self::load_from_dicom_objects(&objects, sort_by)
    }

    /// Load a volume from either a directory or a single DICOM file
    pub fn load_from_path(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_from_directory(path, sort_by)
        } else {
            Self::load_from_file_paths(&[path], sort_by)
        }
    }

    fn is_candidate(path: &Path) -> bool {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) => ext.eq_ignore_ascii_case("dcm"),
            None => true,
        }
    }

    fn extract_image_with_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<SortableImage<'_>> {
        let order = Self::get_sort_order(dicom_object, sort_by);
        let image_2d = Self::decode_image(dicom_object)?;
        Some((order, (dicom_object, image_2d)))
    }

    /// Objects lacking the sort key yield `None`, which orders before any key.
    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<f32> {
        match sort_by {
            SortBy::ImagePositionPatient => dicom_object
                .element(tags::IMAGE_POSITION_PATIENT)
                .ok()?
                .to_multi_float32()
                .ok()?
                .get(2)
                .copied(),
            SortBy::TablePosition => dicom_object
                .element(tags::TABLE_POSITION)
                .ok()?
                .to_float32()
                .ok(),
            SortBy::InstanceNumber => dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()?
                .to_int::<i32>()
                .ok()
                .map(|n| n as f32),
            SortBy::None => Some(0.0),
        }
    }

    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<u16>> {
        let pixel_data = match dicom_object.decode_pixel_data() {
            Ok(pixel_data) => pixel_data,
            Err(e) => {
                warn!("Dropping DICOM object, pixel data could not be decoded: {}", e);
                return None;
            }
        };
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        match pixel_data.to_ndarray_with_options::<u16>(&options) {
            Ok(arr) => Some(arr.slice_move(s![0, .., .., 0])),
            Err(e) => {
                warn!("Dropping DICOM object, pixel data could not be converted: {}", e);
                None
            }
        }
    }

    fn sort_images<T>(images_with_order: &mut [(Option<f32>, T)], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            images_with_order
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            images_with_order.reverse();
        }
    }

    fn validate_dimensions(images: &[Array2<u16>]) -> Result<(), VolumeLoaderError> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(images: &[Array2<u16>]) -> Array3<u16> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<u16>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }

    /// Spacing as (x, y, z). PixelSpacing holds (row, column) spacing, i.e. (y, x).
    fn get_spacing(dicom_objects: &[&FileDicomObject<InMemDicomObject>]) -> (f32, f32, f32) {
        let pixel_spacing = dicom_objects.iter().find_map(|dicom_object| {
            let spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;
            Some((*spacing.get(1)?, *spacing.first()?))
        });
        let slice_thickness = dicom_objects.iter().find_map(|dicom_object| {
            dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()?
                .to_float32()
                .ok()
        });

        let (x, y) = pixel_spacing.unwrap_or_else(|| {
            debug!("No PixelSpacing found, assuming 1.0");
            (1.0, 1.0)
        });
        let z = slice_thickness.unwrap_or_else(|| {
            debug!("No SliceThickness found, assuming 1.0");
            1.0
        });
        (x, y, z)
    }
}
