pub mod builder;
pub mod generate;
pub mod roughen;

pub use generate::{CaseReport, DocumentReport, GenerationReport, MaskGenerator};
pub use roughen::{RougheningReport, Roughener};

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// A per-item failure that was logged and skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(item: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}

/// Regular files in `dir` accepted by `keep`, sorted by file name.
pub fn list_files(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && keep(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_files_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.PNG", "c.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.png")).unwrap();

        let files = list_files(dir.path(), |p| has_extension(p, &["png"])).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.PNG", "b.png"]);
    }
}
