use image::GrayImage;
use imageproc::distance_transform::Norm;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Level above which a mask pixel counts as foreground.
pub const BINARY_THRESHOLD: u8 = 127;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MorphOp {
    Dilate,
    Erode,
}

impl MorphOp {
    pub const ALL: [MorphOp; 2] = [MorphOp::Dilate, MorphOp::Erode];
}

/// Force a grayscale mask to {0, 255}.
pub fn binarize(mask: &GrayImage) -> GrayImage {
    imageproc::contrast::threshold(mask, BINARY_THRESHOLD)
}

/// Apply `op` with a square all-ones structuring element of side
/// `kernel_size`, `iterations` times.
///
/// A square element of side `2r + 1` is the L-infinity ball of radius `r`,
/// which is what the distance-transform morphology in `imageproc` uses.
pub fn apply_morphology(
    mask: &GrayImage,
    op: MorphOp,
    kernel_size: u8,
    iterations: u8,
) -> GrayImage {
    let radius = kernel_size / 2;
    let mut result = binarize(mask);
    if radius == 0 {
        return result;
    }
    for _ in 0..iterations {
        match op {
            MorphOp::Dilate => imageproc::morphology::dilate_mut(&mut result, Norm::LInf, radius),
            MorphOp::Erode => imageproc::morphology::erode_mut(&mut result, Norm::LInf, radius),
        }
    }
    result
}
