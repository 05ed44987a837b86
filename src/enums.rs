use clap::ValueEnum;

/// Axis a volume is sliced along.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Orientation {
    #[default]
    Axial,
    Coronal,
    Sagittal,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Resample Coronal and Sagittal slices to isotropic pixel aspect
    Bilinear,
    // TODO: Trilinear when slices between acquired planes are requested
    #[default]
    None,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
