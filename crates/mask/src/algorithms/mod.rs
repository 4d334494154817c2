pub mod morphology;
pub mod rasterization;
pub mod rotation;

pub use morphology::{apply_morphology, binarize, MorphOp};
pub use rasterization::ScanlineRasterizer;
pub use rotation::{expanded_size, rotate_expand};
