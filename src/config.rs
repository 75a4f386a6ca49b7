use std::path::PathBuf;

use clap::Parser;

use crate::cropping::crop_executor::DEFAULT_WORKERS;

/// How faces are grouped into cropping units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CropMode {
    /// Every face is its own unit.
    #[default]
    #[value(name = "face")]
    PerFace,
    /// Faces connected through shared edges form one unit.
    #[value(name = "island")]
    PerIsland,
}

impl std::fmt::Display for CropMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropMode::PerFace => write!(f, "face"),
            CropMode::PerIsland => write!(f, "island"),
        }
    }
}

/// Fully resolved pipeline configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Asset files or directories to scan.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub mode: CropMode,
    pub crop: bool,
    pub remap: bool,
    pub fill_by_material: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::new(),
            mode: CropMode::default(),
            crop: false,
            remap: false,
            fill_by_material: true,
            dry_run: false,
            verbose: false,
            workers: DEFAULT_WORKERS,
        }
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "uv-cropper",
    about = "Crop per-face texture variants out of UV-mapped meshes and remap the meshes onto them",
    version
)]
pub struct CliArgs {
    /// Input OBJ files or directories to scan
    #[arg(short = 'i', long, num_args = 1.., required = true)]
    pub input: Vec<PathBuf>,

    /// Output directory for crops, metadata and remapped meshes
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Cropping unit: face or island
    #[arg(long, value_enum, default_value = "face")]
    pub mode: CropMode,

    /// Crop every discovered variant out of its source image
    #[arg(long)]
    pub crop: bool,

    /// Remap meshes onto their cropped variants and export them
    #[arg(long)]
    pub remap: bool,

    /// Keep remapped UVs as placed instead of refilling each material to [0,1]
    #[arg(long)]
    pub no_fill: bool,

    /// Load, group and dedup only; write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Crop worker count
    #[arg(short = 'j', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl From<CliArgs> for PipelineConfig {
    fn from(args: CliArgs) -> Self {
        PipelineConfig {
            inputs: args.input,
            output: args.output,
            mode: args.mode,
            crop: args.crop,
            remap: args.remap,
            fill_by_material: !args.no_fill,
            dry_run: args.dry_run,
            verbose: args.verbose,
            workers: args.workers.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.mode, CropMode::PerFace);
        assert_eq!(config.workers, 4);
        assert!(config.fill_by_material);
        assert!(!config.crop);
        assert!(!config.remap);
    }

    #[test]
    fn crop_mode_display() {
        assert_eq!(CropMode::PerFace.to_string(), "face");
        assert_eq!(CropMode::PerIsland.to_string(), "island");
    }

    #[test]
    fn cli_args_to_pipeline_config() {
        let args = CliArgs::parse_from([
            "uv-cropper",
            "-i",
            "a.obj",
            "scans/",
            "-o",
            "./out",
            "--mode",
            "island",
            "--crop",
            "--remap",
            "--no-fill",
            "--dry-run",
            "-v",
            "-j",
            "8",
        ]);

        let config: PipelineConfig = args.into();

        assert_eq!(
            config.inputs,
            vec![PathBuf::from("a.obj"), PathBuf::from("scans/")]
        );
        assert_eq!(config.output, PathBuf::from("./out"));
        assert_eq!(config.mode, CropMode::PerIsland);
        assert!(config.crop);
        assert!(config.remap);
        assert!(!config.fill_by_material);
        assert!(config.dry_run);
        assert!(config.verbose);
        assert_eq!(config.workers, 8);
    }

    #[test]
    fn cli_args_minimal() {
        let args = CliArgs::parse_from(["uv-cropper", "-i", "model.obj", "-o", "output"]);
        let config: PipelineConfig = args.into();

        assert_eq!(config.inputs, vec![PathBuf::from("model.obj")]);
        assert_eq!(config.output, PathBuf::from("output"));
        assert_eq!(config.mode, CropMode::PerFace);
        assert!(!config.crop);
        assert!(!config.remap);
        assert!(config.fill_by_material);
        assert!(!config.dry_run);
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn zero_workers_is_raised_to_one() {
        let args = CliArgs::parse_from(["uv-cropper", "-i", "m.obj", "-o", "o", "-j", "0"]);
        let config: PipelineConfig = args.into();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn input_is_required() {
        assert!(CliArgs::try_parse_from(["uv-cropper", "-o", "out"]).is_err());
    }
}
