use clap::{Parser, Subcommand};
use cli::MaskJob;
use color_eyre::eyre::Result;
use mask::{pair_by_basename, MaskGenerator, PerturbationConfig, PerturbationEngine, Roughener};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rasterize annotation documents into `{case}_{region}.png` masks
    Generate {
        /// Directory containing .xml / .json annotation documents
        #[arg(short, long)]
        annotations: PathBuf,
        /// Directory containing `{case}_1.jpg` source images
        #[arg(short, long)]
        images: PathBuf,
        /// Output directory for masks
        #[arg(short, long)]
        output: PathBuf,
        /// Source image extension to try (repeatable, default: jpg)
        #[arg(long = "image-ext")]
        image_ext: Vec<String>,
    },
    /// Produce rough masks by random morphology and rotation
    Roughen {
        /// Directory containing raw masks
        #[arg(short, long)]
        input: PathBuf,
        /// Output directory for rough masks
        #[arg(short, long)]
        output: PathBuf,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List image/mask pairs matched by basename
    Pairs {
        #[arg(short, long)]
        images: PathBuf,
        #[arg(short, long)]
        masks: PathBuf,
    },
    /// Generate and roughen masks from a job configuration file
    Run {
        /// Path to the .toml or .json configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write a default job configuration
    InitConfig {
        /// Destination .toml or .json file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate {
            annotations,
            images,
            output,
            image_ext,
        } => {
            let generator = image_ext
                .iter()
                .fold(
                    MaskGenerator::builder().image_dir(images).output_dir(output),
                    |builder, ext| builder.add_image_extension(ext.clone()),
                )
                .build();
            let report = generator.generate_directory(annotations)?;
            print_report(&report)?;
        }
        Commands::Roughen { input, output, seed } => {
            roughen(input, output, *seed)?;
        }
        Commands::Pairs { images, masks } => {
            let pairs = pair_by_basename(images, masks)?;
            info!("Found {} image/mask pairs", pairs.len());
            print_report(&pairs)?;
        }
        Commands::Run { config } => {
            let job = MaskJob::from_file(config)?;
            info!("Mask job: {:?}", job);
            let report = job.run()?;
            print_report(&report)?;
        }
        Commands::InitConfig { output } => {
            MaskJob::default().to_file(output)?;
            info!("📄 Configuration saved to: {:?}", output);
        }
    }

    Ok(())
}

fn roughen(input: &Path, output: &Path, seed: Option<u64>) -> Result<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let engine = PerturbationEngine::with_config(rng, PerturbationConfig::default())?;
    let report = Roughener::new(engine).roughen_directory(input, output)?;
    print_report(&report)
}

fn print_report<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
