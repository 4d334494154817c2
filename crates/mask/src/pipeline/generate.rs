use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    catalog::MaskFileCatalog,
    document::{self, DocumentFormat},
    error::{MaskError, Result},
    pipeline::{builder::MaskGeneratorBuilder, list_files, SkippedItem},
    traits::PolygonRasterizer,
    types::{AnnotationDocument, Case},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseReport {
    pub case_id: String,
    pub source_image: PathBuf,
    pub image_size: (u32, u32),
    /// Written masks in region order
    pub masks: Vec<PathBuf>,
    pub skipped_marks: Vec<SkippedItem>,
    pub failed_writes: Vec<SkippedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub cases: Vec<CaseReport>,
    pub skipped_cases: Vec<SkippedItem>,
    pub unnamed_cases: usize,
}

impl DocumentReport {
    pub fn masks_written(&self) -> usize {
        self.cases.iter().map(|c| c.masks.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    pub documents: Vec<DocumentReport>,
    pub failed_documents: Vec<SkippedItem>,
}

impl GenerationReport {
    pub fn masks_written(&self) -> usize {
        self.documents.iter().map(DocumentReport::masks_written).sum()
    }

    pub fn written_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.documents
            .iter()
            .flat_map(|d| d.cases.iter())
            .flat_map(|c| c.masks.iter())
    }
}

/// Turns annotation documents into raw mask files.
pub struct MaskGenerator {
    catalog: MaskFileCatalog,
    rasterizer: Box<dyn PolygonRasterizer>,
}

impl MaskGenerator {
    pub fn builder() -> MaskGeneratorBuilder {
        MaskGeneratorBuilder::new()
    }

    pub fn new(catalog: MaskFileCatalog, rasterizer: Box<dyn PolygonRasterizer>) -> Self {
        Self { catalog, rasterizer }
    }

    pub fn catalog(&self) -> &MaskFileCatalog {
        &self.catalog
    }

    /// Process every annotation document in `dir`, in file name order.
    ///
    /// A document that cannot be decoded is logged and skipped; only a
    /// failure to create the output directory aborts the run.
    pub fn generate_directory(&self, dir: &Path) -> Result<GenerationReport> {
        self.catalog.ensure_output_dir()?;
        let mut report = GenerationReport::default();

        for path in list_files(dir, DocumentFormat::is_annotation_file)? {
            info!("Processing annotation document {:?}", path);
            match self.generate_document(&path) {
                Ok(document_report) => report.documents.push(document_report),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Failed to process {:?}: {}", path, e);
                    report
                        .failed_documents
                        .push(SkippedItem::new(path.display().to_string(), e));
                }
            }
        }

        info!(
            "Wrote {} masks from {} documents ({} failed)",
            report.masks_written(),
            report.documents.len(),
            report.failed_documents.len()
        );
        Ok(report)
    }

    pub fn generate_document(&self, path: &Path) -> Result<DocumentReport> {
        let annotations = document::parse(path)?;
        let mut report = self.generate(&annotations)?;
        report.path = path.to_path_buf();
        Ok(report)
    }

    /// Rasterize every case of an already decoded document.
    pub fn generate(&self, annotations: &AnnotationDocument) -> Result<DocumentReport> {
        self.catalog.ensure_output_dir()?;
        let mut report = DocumentReport {
            unnamed_cases: annotations.unnamed_cases,
            ..Default::default()
        };

        for case in &annotations.cases {
            match self.generate_case(case) {
                Ok(case_report) => report.cases.push(case_report),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping case {}: {}", case.id, e);
                    report.skipped_cases.push(SkippedItem::new(case.id.clone(), e));
                }
            }
        }
        Ok(report)
    }

    /// Write one mask per decoded polygon of each mark of `case`.
    ///
    /// Creates the output directory if needed. Fails when that is impossible
    /// or when the source image is missing or unreadable; bad marks and
    /// failed writes are recorded in the report instead.
    pub fn generate_case(&self, case: &Case) -> Result<CaseReport> {
        self.catalog.ensure_output_dir()?;
        let source_image = self.catalog.locate_image(&case.id)?;
        let image_size = image::image_dimensions(&source_image)?;
        info!("Processing image {:?} with size {:?}", source_image, image_size);

        let mut report = CaseReport {
            case_id: case.id.clone(),
            source_image,
            image_size,
            ..Default::default()
        };
        let mut written_names = HashSet::new();

        for (mark_index, mark) in case.marks.iter().enumerate() {
            let polygons = match mark.polygons(&case.id, mark_index) {
                Ok(polygons) => polygons,
                Err(e) => {
                    warn!("{}", e);
                    report
                        .skipped_marks
                        .push(SkippedItem::new(format!("{}#{}", case.id, mark_index), e));
                    continue;
                }
            };

            for (offset, polygon) in polygons.iter().enumerate() {
                let region_index = offset + 1;
                if polygon.is_degenerate() {
                    debug!(
                        case_id = %case.id,
                        region_index,
                        points = polygon.points.len(),
                        "degenerate polygon"
                    );
                } else if polygon.extends_beyond(image_size) {
                    debug!(
                        case_id = %case.id,
                        region_index,
                        "polygon extends beyond the canvas and is clipped"
                    );
                }

                let mask = self.rasterizer.rasterize(image_size, &polygon.points);
                let output = self.catalog.output_path(&case.id, region_index);
                if !written_names.insert(region_index) {
                    warn!("Mark {} of case {} overwrites {:?}", mark_index, case.id, output);
                }

                match mask.save(&output) {
                    Ok(()) => {
                        debug!(
                            "Saved mask for image {}, region {}, to {:?}",
                            case.id, region_index, output
                        );
                        if !report.masks.contains(&output) {
                            report.masks.push(output);
                        }
                    }
                    Err(source) => {
                        let e = MaskError::MaskWrite { path: output.clone(), source };
                        warn!("{}", e);
                        report
                            .failed_writes
                            .push(SkippedItem::new(output.display().to_string(), e));
                    }
                }
            }
        }

        Ok(report)
    }
}
