//! Image/mask pairing for training sets.
//!
//! An image and a mask belong together when their file names match with
//! the extension stripped. Files without a partner are left out silently.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, ImageBuffer, Pixel, RgbImage};
use serde::Serialize;

use crate::{
    error::Result,
    pipeline::{has_extension, list_files},
};

/// Image extensions in order of preference
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];
/// Mask extensions in order of preference
pub const MASK_EXTENSIONS: [&str; 2] = ["png", "jpg"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamplePair {
    pub stem: String,
    pub image: PathBuf,
    pub mask: PathBuf,
}

/// Pair images and masks by basename, sorted by basename.
pub fn pair_by_basename(image_dir: &Path, mask_dir: &Path) -> Result<Vec<SamplePair>> {
    let images = index_by_stem(image_dir, &IMAGE_EXTENSIONS)?;
    let masks = index_by_stem(mask_dir, &MASK_EXTENSIONS)?;

    Ok(images
        .into_iter()
        .filter_map(|(stem, image)| {
            masks.get(&stem).map(|mask| SamplePair {
                mask: mask.clone(),
                image,
                stem,
            })
        })
        .collect())
}

/// stem -> path, keeping the most preferred extension per stem.
fn index_by_stem(dir: &Path, extensions: &[&str]) -> Result<BTreeMap<String, PathBuf>> {
    let rank = |path: &Path| {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        extensions
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(ext))
            .unwrap_or(usize::MAX)
    };

    let mut index: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in list_files(dir, |p| has_extension(p, extensions))? {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        match index.get(&stem) {
            Some(existing) if rank(existing) <= rank(&path) => {}
            _ => {
                index.insert(stem, path);
            }
        }
    }
    Ok(index)
}

impl SamplePair {
    /// Load the image as RGB and the mask as single-channel grayscale.
    pub fn load(&self) -> Result<(RgbImage, GrayImage)> {
        let image = image::open(&self.image)?.to_rgb8();
        let mask = image::open(&self.mask)?.to_luma8();
        Ok((image, mask))
    }
}

/// Crop to the largest centred square.
pub fn crop_center_square<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let left = (width - side) / 2;
    let top = (height - side) / 2;
    imageops::crop_imm(image, left, top, side, side).to_image()
}
