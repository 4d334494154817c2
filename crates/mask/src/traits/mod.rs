use image::GrayImage;
use crate::types::{CanvasSize, Point};

/// Trait for polygon rasterization backends
pub trait PolygonRasterizer: Send + Sync {
    /// Rasterize a polygon onto a fresh zeroed canvas of `canvas` size.
    /// Interior and outline are set to 255; out-of-canvas parts are clipped.
    fn rasterize(&self, canvas: CanvasSize, points: &[Point]) -> GrayImage;
}

/// Trait for mask perturbation strategies
pub trait MaskPerturber {
    /// Parameters describing one applied perturbation
    type Params;

    /// Produce a perturbed copy of `mask` along with the parameters used.
    fn perturb(&mut self, mask: &GrayImage) -> (GrayImage, Self::Params);
}
