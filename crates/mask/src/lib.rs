//! # Annotation Mask Library
//!
//! Materializes binary segmentation masks from polygon annotations and
//! synthesizes "rough" variants of them, simulating imprecise human
//! annotation for training robust segmentation models.
//!
//! ## Core Features
//!
//! - **Annotation parsing**: XML or JSON `case -> mark` documents, with
//!   single-record and collection forms canonicalized to sequences
//! - **Rasterization**: polygons filled onto canvases sized to their source image
//! - **File conventions**: `{case}_1.jpg` sources, `{case}_{region}.png` masks
//! - **Perturbation**: seeded random dilate/erode plus rotation with canvas growth
//! - **Pairing**: image/mask pairing by basename for dataset loaders
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask::{MaskGenerator, PerturbationEngine, Roughener};
//! use std::path::Path;
//!
//! let generator = MaskGenerator::builder()
//!     .image_dir("../data")
//!     .output_dir("./drew")
//!     .build();
//! let report = generator.generate_directory(Path::new("../data"))?;
//! println!("wrote {} masks", report.masks_written());
//!
//! let mut roughener = Roughener::new(PerturbationEngine::seeded(42));
//! roughener.roughen_directory(Path::new("./drew"), Path::new("./processed_masks"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod document;
pub mod catalog;
pub mod perturb;
pub mod pipeline;
pub mod dataset;

// Re-exports for convenience
pub use error::{MaskError, Result};
pub use types::{AnnotationDocument, CanvasSize, Case, Mark, Mask, Point, Polygon};
pub use traits::*;
pub use algorithms::*;
pub use catalog::MaskFileCatalog;
pub use document::DocumentFormat;
pub use perturb::{
    perturb_file, PerturbationConfig, PerturbationEngine, PerturbationParams, PerturbedMask,
};
pub use pipeline::{
    builder::MaskGeneratorBuilder, GenerationReport, MaskGenerator, Roughener, RougheningReport,
};
pub use dataset::{crop_center_square, pair_by_basename, SamplePair};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_feed_perturbation_and_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let annotations = dir.path().join("annotations");
        let masks = dir.path().join("drew");
        let rough = dir.path().join("processed_masks");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&annotations).unwrap();

        image::GrayImage::new(32, 24).save(images.join("8_1.jpg")).unwrap();
        let svg = r#"[{"points":[{"x":4,"y":4},{"x":20,"y":5},{"x":18,"y":18},{"x":5,"y":16}]}]"#;
        let document = serde_json::json!({"case": {"number": 8, "mark": {"svg": svg}}});
        std::fs::write(annotations.join("doc.json"), document.to_string()).unwrap();

        let generator = MaskGenerator::builder().image_dir(&images).output_dir(&masks).build();
        let generated = generator.generate_directory(&annotations).unwrap();
        assert_eq!(generated.masks_written(), 1);

        let rough_report = Roughener::new(PerturbationEngine::seeded(1))
            .roughen_directory(&masks, &rough)
            .unwrap();
        assert_eq!(rough_report.written.len(), 1);
        let (w, h) = rough_report.written[0].output_size;
        assert!(w >= 32 && h >= 24);

        // the source image is 8_1.jpg and the first region mask is 8_1.png
        let pairs = pair_by_basename(&images, &rough).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].stem, "8_1");
    }
}
