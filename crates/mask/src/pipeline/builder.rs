use std::path::PathBuf;

use crate::{
    algorithms::ScanlineRasterizer,
    catalog::MaskFileCatalog,
    pipeline::generate::MaskGenerator,
    traits::PolygonRasterizer,
};

/// Builder for creating mask generators with a fluent API
pub struct MaskGeneratorBuilder {
    image_dir: PathBuf,
    output_dir: PathBuf,
    image_extensions: Vec<String>,
    rasterizer: Option<Box<dyn PolygonRasterizer>>,
}

impl MaskGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            image_dir: PathBuf::from("."),
            output_dir: PathBuf::from("masks"),
            image_extensions: Vec::new(),
            rasterizer: None,
        }
    }

    /// Directory holding the `{case}_1.jpg` source images
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    /// Directory receiving the `{case}_{region}.png` masks
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Source image extension to try; may be called several times
    pub fn add_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extensions.push(extension.into());
        self
    }

    /// Set the rasterizer (replaces any existing one)
    pub fn set_rasterizer<Z>(mut self, rasterizer: Z) -> Self
    where
        Z: PolygonRasterizer + 'static,
    {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    /// Build the generator, defaulting to the scanline rasterizer
    pub fn build(self) -> MaskGenerator {
        let rasterizer = self
            .rasterizer
            .unwrap_or_else(|| Box::new(ScanlineRasterizer));
        let catalog = MaskFileCatalog::new(self.image_dir, self.output_dir)
            .with_image_extensions(self.image_extensions);

        MaskGenerator::new(catalog, rasterizer)
    }
}

impl Default for MaskGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
