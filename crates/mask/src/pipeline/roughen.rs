use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    catalog::ensure_output_directory,
    error::Result,
    perturb::{perturb_file, PerturbationParams, PerturbationRecord},
    pipeline::{has_extension, list_files, SkippedItem},
    traits::MaskPerturber,
};

/// Mask files picked up for roughening.
pub const MASK_EXTENSIONS: [&str; 2] = ["png", "jpg"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RougheningReport {
    pub written: Vec<PerturbationRecord>,
    pub failed: Vec<SkippedItem>,
}

/// Runs a mask perturber over a directory of raw masks.
pub struct Roughener<P> {
    perturber: P,
}

impl<P> Roughener<P>
where
    P: MaskPerturber<Params = PerturbationParams>,
{
    pub fn new(perturber: P) -> Self {
        Self { perturber }
    }

    /// Perturb every mask in `input_dir` into `output_dir`, keeping file
    /// names. Unreadable or unwritable masks are logged and skipped.
    pub fn roughen_directory(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<RougheningReport> {
        ensure_output_directory(output_dir)?;
        let mut report = RougheningReport::default();

        for mask_path in list_files(input_dir, |p| has_extension(p, &MASK_EXTENSIONS))? {
            info!("Processing {:?}...", mask_path);
            match perturb_file(&mut self.perturber, &mask_path, output_dir) {
                Ok(record) => report.written.push(record),
                Err(e) => {
                    warn!("{}", e);
                    report
                        .failed
                        .push(SkippedItem::new(mask_path.display().to_string(), e));
                }
            }
        }

        info!(
            "Roughened {} masks into {:?} ({} failed)",
            report.written.len(),
            output_dir,
            report.failed.len()
        );
        Ok(report)
    }
}
