use crate::enums::Interpolation;
use crate::enums::Orientation;
use crate::interpolator::Interpolator;

use image::GrayImage;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;

#[derive(Debug, Default, Clone)]
pub struct Volume {
    pub data: Array3<u16>,
    pub spacing: (f32, f32, f32),
    pub interpolated_dim: (u32, u32, u32),
}

impl Volume {
    pub fn new(data: Array3<u16>, spacing: (f32, f32, f32)) -> Self {
        let original_dim = data.dim();
        Self {
            data,
            spacing,
            interpolated_dim: Interpolator::get_isotropic_dimensions(spacing, original_dim),
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u16> {
        &self.data
    }

    /// Voxel spacing as (column spacing, row spacing, slice thickness)
    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    /// Number of slices available along `orientation`
    pub fn slice_count(&self, orientation: Orientation) -> usize {
        let (depth, height, width) = self.data.dim();
        match orientation {
            Orientation::Axial => depth,
            Orientation::Coronal => height,
            Orientation::Sagittal => width,
        }
    }

    #[inline]
    fn normalize_to_u8(value: f32) -> u8 {
        ((value / 65535.0) * 255.0).clamp(0.0, 255.0) as u8
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, u16>> {
        if index >= self.slice_count(orientation) {
            return None;
        }
        let slice = match orientation {
            Orientation::Axial => self.data.slice(s![index, .., ..]),
            Orientation::Coronal => self.data.slice(s![.., index, ..]),
            Orientation::Sagittal => self.data.slice(s![.., .., index]),
        };
        Some(slice)
    }

    fn get_output_dimensions(&self, orientation: Orientation) -> (u32, u32) {
        // Always return (width, height) - standard image convention
        match orientation {
            // Looking down Z-axis: X is width, Y is height
            Orientation::Axial => (self.interpolated_dim.2, self.interpolated_dim.1),
            // Looking down Y-axis: X is width, Z is height
            Orientation::Coronal => (self.interpolated_dim.2, self.interpolated_dim.0),
            // Looking down X-axis: Y is width, Z is height
            Orientation::Sagittal => (self.interpolated_dim.1, self.interpolated_dim.0),
        }
    }

    fn slice_to_image(slice: &ArrayView2<'_, u16>) -> Option<GrayImage> {
        let (height, width) = slice.dim();
        let pixel_data: Vec<u8> = slice
            .iter()
            .map(|&v| Self::normalize_to_u8(f32::from(v)))
            .collect();
        GrayImage::from_raw(width as u32, height as u32, pixel_data)
    }

    /// Render the slice at `index` along `orientation` into an 8-bit image.
    ///
    /// Returns `None` if `index` is outside the volume.
    pub fn get_image_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
        interpolation: Interpolation,
    ) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, orientation)?;

        match interpolation {
            Interpolation::None => Self::slice_to_image(&slice),
            Interpolation::Bilinear => {
                // Axial doesn't need interpolation (already isotropic in-plane)
                if matches!(orientation, Orientation::Axial) {
                    return Self::slice_to_image(&slice);
                }
                let (width, height) = self.get_output_dimensions(orientation);
                Self::interpolate_slice(&slice, width, height)
            }
        }
    }

    fn interpolate_slice(slice: &ArrayView2<'_, u16>, width: u32, height: u32) -> Option<GrayImage> {
        let (slice_height, slice_width) = slice.dim();
        if slice_height == 0 || slice_width == 0 {
            return None;
        }

        let pixel_data: Vec<u8> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    // Normalized coordinates with half-pixel offset
                    let norm_x = (x as f32 + 0.5) / width as f32;
                    let norm_y = (y as f32 + 0.5) / height as f32;

                    let src_x = (norm_x * slice_width as f32 - 0.5)
                        .clamp(0.0, (slice_width - 1) as f32);
                    let src_y = (norm_y * slice_height as f32 - 0.5)
                        .clamp(0.0, (slice_height - 1) as f32);

                    let value = Interpolator::bilinear_interpolate(slice, src_y, src_x);
                    Self::normalize_to_u8(value)
                })
            })
            .collect();

        GrayImage::from_raw(width, height, pixel_data)
    }
}
