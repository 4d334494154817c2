//! Annotation document decoding.
//!
//! Documents are `case -> mark` hierarchies in XML or JSON. Both `case` and
//! `mark` may appear as a bare record or as a collection; they are
//! canonicalized to sequences right after decoding.

pub mod canonical;
pub mod xml;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::{
    error::{MaskError, Result},
    types::{AnnotationDocument, Case, Mark},
};
use canonical::{one_or_many, scalar_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Xml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension; unknown extensions are read as XML.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or(DocumentFormat::Xml)
    }

    pub fn is_annotation_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.parse::<DocumentFormat>().is_ok())
    }
}

/// Read and decode an annotation document from disk.
pub fn parse(path: impl AsRef<Path>) -> Result<AnnotationDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| MaskError::DocumentParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_str(&content, DocumentFormat::from_path(path)).map_err(|e| match e {
        MaskError::DocumentParse { reason, .. } => MaskError::DocumentParse {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Decode an in-memory annotation document.
pub fn parse_str(content: &str, format: DocumentFormat) -> Result<AnnotationDocument> {
    let value = match format {
        DocumentFormat::Xml => xml::to_value(content),
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
    .map_err(|reason| MaskError::DocumentParse {
        path: Default::default(),
        reason,
    })?;

    Ok(from_value(&value))
}

/// Build the canonical document from a decoded tree.
pub fn from_value(value: &Value) -> AnnotationDocument {
    let mut document = AnnotationDocument::default();

    for (index, raw_case) in one_or_many(find_cases(value)).into_iter().enumerate() {
        let Some(id) = raw_case.get("number").and_then(scalar_text) else {
            warn!("Case #{} has no number, skipping", index);
            document.unnamed_cases += 1;
            continue;
        };

        let marks: Vec<Mark> = one_or_many(raw_case.get("mark"))
            .into_iter()
            .map(|raw_mark| Mark {
                svg: raw_mark.get("svg").and_then(scalar_text),
            })
            .collect();

        debug!(case_id = %id, marks = marks.len(), "decoded case");
        document.cases.push(Case { id, marks });
    }

    document
}

/// `case` at the top level, or inside a single wrapper element.
fn find_cases(value: &Value) -> Option<&Value> {
    let top = value.as_object()?;
    if let Some(cases) = top.get("case") {
        return Some(cases);
    }
    match top.values().next() {
        Some(Value::Object(inner)) if top.len() == 1 => inner.get("case"),
        _ => None,
    }
}
