use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Failed to parse annotation document {path}: {reason}")]
    DocumentParse { path: PathBuf, reason: String },

    #[error("Failed to decode polygons for case {case_id}, mark {mark_index}: {reason}")]
    PolygonDecode {
        case_id: String,
        mark_index: usize,
        reason: String,
    },

    #[error("Case #{index} has no `number` field")]
    MissingCaseNumber { index: usize },

    #[error("Source image for case {case_id} not found in {directory}")]
    MissingImage { case_id: String, directory: PathBuf },

    #[error("Failed to read mask {path}: {source}")]
    MaskRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write mask {path}: {source}")]
    MaskWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MaskError {
    /// Whether this error aborts a whole batch run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutputDirectory { .. } | Self::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, MaskError>;
