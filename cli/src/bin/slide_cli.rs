use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{BatchConfig, runner};
use color_eyre::eyre::Result;
use patching::PatchParams;
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
    /// Generate necrosis, tissue and negative masks plus overlay maps for
    /// every annotated slide
    CreateMasks {
        /// Directory containing the whole slide images
        #[arg(long, default_value = "WSI")]
        slide_dir: PathBuf,
        /// Directory containing the XML polygon annotations
        #[arg(long, default_value = "XML")]
        annotation_dir: PathBuf,
        /// Output directory for pristine overlay maps
        #[arg(long, default_value = "MAPS")]
        map_dir: PathBuf,
        /// Output directory for the overlay maps patch extraction annotates
        #[arg(long, default_value = "PATCHMAPS")]
        patchmap_dir: PathBuf,
        /// Output directory for tissue masks
        #[arg(long, default_value = "TISSUE_MASK")]
        tissue_mask_dir: PathBuf,
        /// Output directory for necrosis masks
        #[arg(long, default_value = "NECROSIS_MASK")]
        necrosis_mask_dir: PathBuf,
        /// Output directory for negative masks
        #[arg(long, default_value = "NEGATIVE_MASK")]
        negative_mask_dir: PathBuf,
        /// Resolution level masks are generated at (0 is full resolution)
        #[arg(long, default_value_t = 6)]
        mask_level: u32,
    },
    /// Extract labeled patches using previously generated masks
    ExtractPatches {
        /// Directory containing the whole slide images
        #[arg(long, default_value = "WSI")]
        slide_dir: PathBuf,
        /// Directory with the overlay maps to annotate
        #[arg(long, default_value = "PATCHMAPS")]
        patchmap_dir: PathBuf,
        /// Directory with the stored necrosis masks
        #[arg(long, default_value = "NECROSIS_MASK")]
        necrosis_mask_dir: PathBuf,
        /// Directory with the stored negative masks
        #[arg(long, default_value = "NEGATIVE_MASK")]
        negative_mask_dir: PathBuf,
        /// Output directory for necrosis patches
        #[arg(long, default_value = "NECROSIS_PATCHES")]
        necrosis_patches_dir: PathBuf,
        /// Output directory for negative patches
        #[arg(long, default_value = "NEGATIVE_PATCHES")]
        negative_patches_dir: PathBuf,
        /// Resolution level the masks were generated at
        #[arg(long, default_value_t = 6)]
        mask_level: u32,
        /// Resolution level patches are read at (0 is highest magnification)
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Patch size in pixels
        #[arg(long, default_value_t = 256)]
        patch_size: u32,
        /// Necrosis mask inclusion ratio above which a patch is necrosis, in [0, 1]
        #[arg(long, default_value_t = 0.8)]
        necrosis_threshold: f64,
        /// Negative mask inclusion ratio above which a necrosis-free patch is
        /// negative, in [0, 1]
        #[arg(long, default_value_t = 0.3)]
        negative_threshold: f64,
    },
    /// Run both stages from a TOML or JSON configuration file
    Run {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateMasks {
            slide_dir,
            annotation_dir,
            map_dir,
            patchmap_dir,
            tissue_mask_dir,
            necrosis_mask_dir,
            negative_mask_dir,
            mask_level,
        } => {
            let cfg = BatchConfig {
                slide_dir,
                annotation_dir,
                map_dir,
                patchmap_dir,
                tissue_mask_dir,
                necrosis_mask_dir,
                negative_mask_dir,
                params: PatchParams {
                    mask_level,
                    ..PatchParams::default()
                },
                ..BatchConfig::default()
            };
            runner::create_masks(&cfg)?;
            info!("✅ Mask generation completed!");
        }
        Commands::ExtractPatches {
            slide_dir,
            patchmap_dir,
            necrosis_mask_dir,
            negative_mask_dir,
            necrosis_patches_dir,
            negative_patches_dir,
            mask_level,
            level,
            patch_size,
            necrosis_threshold,
            negative_threshold,
        } => {
            let cfg = BatchConfig {
                slide_dir,
                patchmap_dir,
                necrosis_mask_dir,
                negative_mask_dir,
                necrosis_patches_dir,
                negative_patches_dir,
                params: PatchParams {
                    patch_size,
                    level,
                    mask_level,
                    necrosis_threshold,
                    negative_threshold,
                },
                ..BatchConfig::default()
            };
            runner::extract_patches(&cfg)?;
            info!("✅ Patch extraction completed!");
        }
        Commands::Run { config } => {
            let cfg = BatchConfig::from_file(&config)?;
            info!("Loaded batch config from {}", config.display());
            runner::run(&cfg)?;
            info!("✅ Batch run completed!");
        }
    }

    Ok(())
}
