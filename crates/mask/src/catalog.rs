use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MaskError, Result};

/// Naming conventions tying cases to source images and output masks.
///
/// Source images live at `{image_dir}/{case_id}_1.{ext}` and raw masks are
/// written to `{output_dir}/{case_id}_{region_index}.png`.
#[derive(Debug, Clone)]
pub struct MaskFileCatalog {
    image_dir: PathBuf,
    output_dir: PathBuf,
    image_extensions: Vec<String>,
}

impl MaskFileCatalog {
    pub const DEFAULT_IMAGE_EXTENSION: &'static str = "jpg";
    pub const MASK_EXTENSION: &'static str = "png";

    pub fn new(image_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            output_dir: output_dir.into(),
            image_extensions: vec![Self::DEFAULT_IMAGE_EXTENSION.to_string()],
        }
    }

    /// Source image extensions to try, in order. An empty list keeps the default.
    pub fn with_image_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        if !extensions.is_empty() {
            self.image_extensions = extensions;
        }
        self
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn image_extensions(&self) -> &[String] {
        &self.image_extensions
    }

    /// Find the source image for a case.
    pub fn locate_image(&self, case_id: &str) -> Result<PathBuf> {
        self.image_extensions
            .iter()
            .map(|ext| self.image_dir.join(format!("{case_id}_1.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| MaskError::MissingImage {
                case_id: case_id.to_string(),
                directory: self.image_dir.clone(),
            })
    }

    /// File name for the `region_index`-th (1-based) polygon of a case.
    pub fn name_output(case_id: &str, region_index: usize) -> String {
        format!("{case_id}_{region_index}.{}", Self::MASK_EXTENSION)
    }

    pub fn output_path(&self, case_id: &str, region_index: usize) -> PathBuf {
        self.output_dir.join(Self::name_output(case_id, region_index))
    }

    pub fn ensure_output_dir(&self) -> Result<()> {
        ensure_output_directory(&self.output_dir)
    }
}

/// Create `path` and its parents if missing. Safe to call repeatedly and
/// from concurrent workers racing on first creation.
pub fn ensure_output_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    debug!("Creating output directory {:?}", path);
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(_) if path.is_dir() => Ok(()),
        Err(source) => Err(MaskError::OutputDirectory {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Destination of a perturbed mask: same file name, different directory.
pub fn rebase_file_name(source: &Path, output_dir: &Path) -> Option<PathBuf> {
    source.file_name().map(|name| output_dir.join(name))
}
