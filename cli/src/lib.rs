use mask::{
    GenerationReport, MaskError, MaskGenerator, PerturbationConfig, PerturbationEngine, Roughener,
    RougheningReport,
};

use rand::{rngs::StdRng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MaskCliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Directories and perturbation settings for a full mask job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct MaskJob {
    /// Directory scanned for `.xml` / `.json` annotation documents
    pub annotations_dir: PathBuf,
    /// Directory holding the `{case}_1.jpg` source images
    pub image_dir: PathBuf,
    /// Raw masks are written here
    pub mask_dir: PathBuf,
    /// Rough masks are written here, under the raw mask's file name
    pub rough_mask_dir: PathBuf,
    /// Source image extensions to try, in order
    pub image_extensions: Vec<String>,
    /// Fixed seed for reproducible rough masks
    pub seed: Option<u64>,
    pub perturbation: PerturbationConfig,
}

impl Default for MaskJob {
    fn default() -> Self {
        Self {
            annotations_dir: PathBuf::from("../data"),
            image_dir: PathBuf::from("../data"),
            mask_dir: PathBuf::from("./drew"),
            rough_mask_dir: PathBuf::from("./processed_masks"),
            image_extensions: vec!["jpg".to_string()],
            seed: None,
            perturbation: PerturbationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub generation: GenerationReport,
    pub roughening: RougheningReport,
}

impl MaskJob {
    /// Load MaskJob configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, MaskCliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load MaskJob configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, MaskCliError> {
        let job: MaskJob = toml::from_str(content)?;
        job.perturbation.validate()?;
        Ok(job)
    }

    /// Load MaskJob configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, MaskCliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load MaskJob configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, MaskCliError> {
        let job: MaskJob = serde_json::from_str(content)?;
        job.perturbation.validate()?;
        Ok(job)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MaskCliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(MaskCliError::UnsupportedFileFormat),
        }
    }

    /// Save configuration, picking the format from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MaskCliError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(MaskCliError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }

    /// Convert MaskJob to TOML string
    pub fn to_toml(&self) -> Result<String, MaskCliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert MaskJob to JSON string
    pub fn to_json(&self) -> Result<String, MaskCliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MaskJob)
    }

    pub fn generator(&self) -> MaskGenerator {
        self.image_extensions
            .iter()
            .fold(
                MaskGenerator::builder()
                    .image_dir(&self.image_dir)
                    .output_dir(&self.mask_dir),
                |builder, ext| builder.add_image_extension(ext.clone()),
            )
            .build()
    }

    pub fn engine(&self) -> Result<PerturbationEngine<StdRng>, MaskCliError> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(PerturbationEngine::with_config(rng, self.perturbation.clone())?)
    }

    /// Generate raw masks, then roughen them.
    pub fn run(&self) -> Result<JobReport, MaskCliError> {
        info!("Generating masks from {:?} into {:?}", self.annotations_dir, self.mask_dir);
        let generation = self.generator().generate_directory(&self.annotations_dir)?;

        info!("Roughening masks from {:?} into {:?}", self.mask_dir, self.rough_mask_dir);
        let roughening = Roughener::new(self.engine()?)
            .roughen_directory(&self.mask_dir, &self.rough_mask_dir)?;

        Ok(JobReport {
            generation,
            roughening,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let job = MaskJob::from_toml(
            r#"
            mask_dir = "out/masks"
            seed = 7

            [perturbation]
            kernel_sizes = [3]
            "#,
        )
        .unwrap();

        assert_eq!(job.mask_dir, PathBuf::from("out/masks"));
        assert_eq!(job.image_dir, PathBuf::from("../data"));
        assert_eq!(job.seed, Some(7));
        assert_eq!(job.perturbation.kernel_sizes, vec![3]);
        assert_eq!(job.perturbation.iteration_counts, vec![1, 2, 3]);
        assert_eq!(job.perturbation.max_angle_degrees, 5.0);
    }

    #[test]
    fn test_invalid_perturbation_is_rejected_on_load() {
        let err = MaskJob::from_json(r#"{"perturbation": {"kernel_sizes": [2]}}"#).unwrap_err();
        assert!(matches!(err, MaskCliError::Mask(MaskError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let job = MaskJob {
            seed: Some(3),
            ..Default::default()
        };

        let toml_path = dir.path().join("job.toml");
        job.to_file(&toml_path).unwrap();
        assert_eq!(MaskJob::from_file(&toml_path).unwrap(), job);

        let json_path = dir.path().join("job.json");
        job.to_file(&json_path).unwrap();
        assert_eq!(MaskJob::from_file(&json_path).unwrap(), job);

        assert!(matches!(
            MaskJob::from_file(dir.path().join("job.yaml")),
            Err(MaskCliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_run_job() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        image::GrayImage::new(16, 16)
            .save(data.join("3_1.jpg"))
            .unwrap();
        let svg = r#"[
            {"points":[{"x":2,"y":2},{"x":12,"y":2},{"x":12,"y":12}]},
            {"points":[{"x":1,"y":1},{"x":5,"y":1},{"x":3,"y":4}]}
        ]"#;
        std::fs::write(
            data.join("3.xml"),
            format!(
                "<case><number>3</number><mark><svg>{}</svg></mark></case>",
                svg.replace('"', "&quot;")
            ),
        )
        .unwrap();

        let job = MaskJob {
            annotations_dir: data.clone(),
            image_dir: data,
            mask_dir: dir.path().join("drew"),
            rough_mask_dir: dir.path().join("rough"),
            seed: Some(11),
            ..Default::default()
        };
        let report = job.run().unwrap();

        assert_eq!(report.generation.masks_written(), 2);
        assert_eq!(report.roughening.written.len(), 2);
        assert!(dir.path().join("rough/3_1.png").is_file());
        assert!(dir.path().join("rough/3_2.png").is_file());
    }
}
