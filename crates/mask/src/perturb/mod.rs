//! Rough-mask synthesis.
//!
//! A perturbation is one dilate-or-erode pass with a random square kernel
//! and iteration count, followed by a small random rotation that expands
//! the canvas. All randomness comes from the generator handed to the
//! engine, so a seeded generator reproduces the exact same masks.

use std::path::{Path, PathBuf};

use image::GrayImage;
use rand::{rngs::StdRng, Rng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    algorithms::{morphology::{apply_morphology, MorphOp}, rotation::rotate_expand},
    catalog::rebase_file_name,
    error::{MaskError, Result},
    traits::MaskPerturber,
    types::CanvasSize,
};

/// Option sets the engine draws from, each uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PerturbationConfig {
    /// Side lengths of the square structuring element (odd)
    pub kernel_sizes: Vec<u8>,
    /// Number of times the morphology is repeated
    pub iteration_counts: Vec<u8>,
    /// Rotation is drawn from `[-max_angle_degrees, max_angle_degrees]`
    #[schemars(range(min = 0.0, max = 180.0))]
    pub max_angle_degrees: f32,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            kernel_sizes: vec![3, 5, 7],
            iteration_counts: vec![1, 2, 3],
            max_angle_degrees: 5.0,
        }
    }
}

impl PerturbationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kernel_sizes.is_empty() {
            return Err(MaskError::InvalidConfig("kernel_sizes must not be empty".into()));
        }
        if let Some(size) = self.kernel_sizes.iter().find(|&&k| k % 2 == 0) {
            return Err(MaskError::InvalidConfig(format!("kernel size {size} is not odd")));
        }
        if self.iteration_counts.is_empty() {
            return Err(MaskError::InvalidConfig("iteration_counts must not be empty".into()));
        }
        if self.iteration_counts.contains(&0) {
            return Err(MaskError::InvalidConfig("iteration counts must be at least 1".into()));
        }
        if !self.max_angle_degrees.is_finite() || !(0.0..=180.0).contains(&self.max_angle_degrees) {
            return Err(MaskError::InvalidConfig(format!(
                "max_angle_degrees {} is outside [0, 180]",
                self.max_angle_degrees
            )));
        }
        Ok(())
    }
}

/// The choices made for one perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerturbationParams {
    pub operation: MorphOp,
    pub kernel_size: u8,
    pub iterations: u8,
    pub angle_degrees: f32,
}

impl PerturbationParams {
    /// Morphology then rotation. Deterministic for fixed parameters.
    pub fn apply(&self, mask: &GrayImage) -> GrayImage {
        let morphed = apply_morphology(mask, self.operation, self.kernel_size, self.iterations);
        rotate_expand(&morphed, self.angle_degrees)
    }
}

/// A perturbed mask together with how it was produced. The canvas may be
/// larger than the source mask's; it is never cropped back.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedMask {
    pub image: GrayImage,
    pub params: PerturbationParams,
}

/// Outcome of perturbing one mask file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerturbationRecord {
    pub source: PathBuf,
    pub output: PathBuf,
    pub params: PerturbationParams,
    pub input_size: CanvasSize,
    pub output_size: CanvasSize,
}

pub struct PerturbationEngine<R> {
    rng: R,
    config: PerturbationConfig,
}

impl<R: Rng> PerturbationEngine<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            config: PerturbationConfig::default(),
        }
    }

    pub fn with_config(rng: R, config: PerturbationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { rng, config })
    }

    pub fn config(&self) -> &PerturbationConfig {
        &self.config
    }

    /// Draw operation, kernel size, iteration count and angle, in that order.
    pub fn sample_params(&mut self) -> PerturbationParams {
        let operation = MorphOp::ALL[self.rng.gen_range(0..MorphOp::ALL.len())];
        let kernel_size =
            self.config.kernel_sizes[self.rng.gen_range(0..self.config.kernel_sizes.len())];
        let iterations =
            self.config.iteration_counts[self.rng.gen_range(0..self.config.iteration_counts.len())];
        let max_angle = self.config.max_angle_degrees;
        let angle_degrees = self.rng.gen_range(-max_angle..=max_angle);

        PerturbationParams {
            operation,
            kernel_size,
            iterations,
            angle_degrees,
        }
    }

    pub fn perturb(&mut self, mask: &GrayImage) -> PerturbedMask {
        let params = self.sample_params();
        PerturbedMask {
            image: params.apply(mask),
            params,
        }
    }
}

impl PerturbationEngine<StdRng> {
    /// Reproducible engine for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> MaskPerturber for PerturbationEngine<R> {
    type Params = PerturbationParams;

    fn perturb(&mut self, mask: &GrayImage) -> (GrayImage, PerturbationParams) {
        let PerturbedMask { image, params } = PerturbationEngine::perturb(self, mask);
        (image, params)
    }
}

/// Perturb the mask at `mask_path` and write it under the same file name
/// in `output_dir`. Nothing is written if the mask cannot be read.
pub fn perturb_file<P>(
    perturber: &mut P,
    mask_path: &Path,
    output_dir: &Path,
) -> Result<PerturbationRecord>
where
    P: MaskPerturber<Params = PerturbationParams>,
{
    let mask = image::open(mask_path)
        .map_err(|source| MaskError::MaskRead {
            path: mask_path.to_path_buf(),
            source,
        })?
        .to_luma8();

    let output = rebase_file_name(mask_path, output_dir).ok_or_else(|| MaskError::MaskRead {
        path: mask_path.to_path_buf(),
        source: image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "mask path has no file name",
        )),
    })?;

    let (image, params) = perturber.perturb(&mask);
    info!(
        "Applying {} with kernel size {} and {} iterations, rotation {:.2} degrees to {:?}",
        params.operation, params.kernel_size, params.iterations, params.angle_degrees, mask_path
    );

    image.save(&output).map_err(|source| MaskError::MaskWrite {
        path: output.clone(),
        source,
    })?;
    debug!("Saved rough mask to {:?}", output);

    Ok(PerturbationRecord {
        source: mask_path.to_path_buf(),
        output,
        params,
        input_size: mask.dimensions(),
        output_size: image.dimensions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::collections::HashSet;

    fn test_mask() -> GrayImage {
        let mut img = GrayImage::new(60, 40);
        for y in 10..30 {
            for x in 15..45 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    #[test]
    fn test_params_stay_within_option_sets() {
        let mut engine = PerturbationEngine::seeded(7);
        let mut ops = HashSet::new();
        for _ in 0..200 {
            let params = engine.sample_params();
            ops.insert(params.operation);
            assert!([3, 5, 7].contains(&params.kernel_size));
            assert!([1, 2, 3].contains(&params.iterations));
            assert!((-5.0..=5.0).contains(&params.angle_degrees));
        }
        assert_eq!(ops.len(), 2, "both operations should be drawn");
    }

    #[test]
    fn test_same_seed_same_output() {
        let mask = test_mask();
        let a = PerturbationEngine::seeded(42).perturb(&mask);
        let b = PerturbationEngine::seeded(42).perturb(&mask);
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_never_smaller_than_input() {
        let mask = test_mask();
        let mut engine = PerturbationEngine::seeded(3);
        for _ in 0..20 {
            let perturbed = engine.perturb(&mask);
            let (w, h) = perturbed.image.dimensions();
            assert!(w >= 60 && h >= 40);
            assert!(perturbed.image.pixels().all(|p| p[0] == 0 || p[0] == 255));
        }
    }

    #[test]
    fn test_apply_matches_engine_result() {
        let mask = test_mask();
        let perturbed = PerturbationEngine::seeded(11).perturb(&mask);
        assert_eq!(perturbed.params.apply(&mask), perturbed.image);
    }

    fn roughen_with<P: MaskPerturber>(perturber: &mut P, mask: &GrayImage) -> GrayImage {
        perturber.perturb(mask).0
    }

    #[test]
    fn test_engine_as_mask_perturber() {
        let mask = test_mask();
        let via_trait = roughen_with(&mut PerturbationEngine::seeded(8), &mask);
        let direct = PerturbationEngine::seeded(8).perturb(&mask);
        assert_eq!(via_trait, direct.image);
    }

    #[test]
    fn test_custom_config_is_respected() {
        let config = PerturbationConfig {
            kernel_sizes: vec![5],
            iteration_counts: vec![2],
            max_angle_degrees: 0.0,
        };
        let mut engine = PerturbationEngine::with_config(StdRng::seed_from_u64(1), config).unwrap();
        let perturbed = engine.perturb(&test_mask());
        assert_eq!(perturbed.params.kernel_size, 5);
        assert_eq!(perturbed.params.iterations, 2);
        assert_eq!(perturbed.params.angle_degrees, 0.0);
        assert_eq!(perturbed.image.dimensions(), (60, 40));
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let bad = [
            PerturbationConfig { kernel_sizes: vec![], ..Default::default() },
            PerturbationConfig { kernel_sizes: vec![4], ..Default::default() },
            PerturbationConfig { iteration_counts: vec![0], ..Default::default() },
            PerturbationConfig { max_angle_degrees: f32::NAN, ..Default::default() },
            PerturbationConfig { max_angle_degrees: -1.0, ..Default::default() },
        ];
        for config in bad {
            assert!(PerturbationEngine::with_config(StdRng::seed_from_u64(0), config).is_err());
        }
    }

    #[test]
    fn test_perturb_file_keeps_basename() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("17_2.png");
        test_mask().save(&source).unwrap();
        let out_dir = dir.path().join("rough");
        std::fs::create_dir(&out_dir).unwrap();

        let record = perturb_file(&mut PerturbationEngine::seeded(5), &source, &out_dir).unwrap();
        assert_eq!(record.output, out_dir.join("17_2.png"));
        assert_eq!(record.input_size, (60, 40));

        let written = image::open(&record.output).unwrap().to_luma8();
        assert_eq!(written.dimensions(), record.output_size);
    }

    #[test]
    fn test_unreadable_mask_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.png");
        std::fs::write(&source, b"not a png").unwrap();
        let out_dir = dir.path().join("rough");
        std::fs::create_dir(&out_dir).unwrap();

        let err = perturb_file(&mut PerturbationEngine::seeded(5), &source, &out_dir).unwrap_err();
        assert!(matches!(err, MaskError::MaskRead { .. }));
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);
    }
}
