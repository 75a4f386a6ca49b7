use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::cropping::{
    CropExecutor, Grouping, GroupingStats, MaterialBindings, RemapStats, VariantRegistry,
    fill_by_material, group_faces, remap_mesh, write_metadata,
};
use crate::error::{Result, UvCropperError};
use crate::export::export_asset;
use crate::ingestion::{self, discover_assets};

/// Outcome of one successfully processed asset.
#[derive(Debug, Clone, Default)]
pub struct AssetReport {
    pub path: PathBuf,
    pub faces: usize,
    pub grouping: GroupingStats,
    /// Variants first registered by this asset.
    pub new_variants: usize,
    pub crops_written: usize,
    /// `(variant name, reason)` for every crop task that failed.
    pub failed_crops: Vec<(String, String)>,
    pub remap: RemapStats,
    pub exported: Option<PathBuf>,
}

/// Summary of a completed batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub assets: Vec<AssetReport>,
    /// `(asset path, reason)` for every asset that failed.
    pub failed: Vec<(PathBuf, String)>,
    /// Distinct variants across the committed registry.
    pub variants: usize,
    pub duration: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.assets.len()
    }

    pub fn grouping(&self) -> GroupingStats {
        let mut total = GroupingStats::default();
        for asset in &self.assets {
            total.merge(&asset.grouping);
        }
        total
    }

    pub fn remap(&self) -> RemapStats {
        let mut total = RemapStats::default();
        for asset in &self.assets {
            total.merge(&asset.remap);
        }
        total
    }

    pub fn crops_written(&self) -> usize {
        self.assets.iter().map(|a| a.crops_written).sum()
    }

    pub fn failed_crops(&self) -> usize {
        self.assets.iter().map(|a| a.failed_crops.len()).sum()
    }
}

/// Batch orchestrator: drives load -> group -> dedup -> crop -> remap ->
/// export -> metadata for one asset at a time.
pub struct Pipeline;

impl Pipeline {
    /// Discover assets from the configured inputs and process them all.
    pub fn run(config: &PipelineConfig) -> Result<BatchReport> {
        let assets = discover_assets(&config.inputs, &config.output)?;
        Self::run_assets(config, &assets)
    }

    /// Process `assets` in order. A failing asset is recorded in the report
    /// and the batch moves on; only setup problems abort the run.
    pub fn run_assets(config: &PipelineConfig, assets: &[PathBuf]) -> Result<BatchReport> {
        let start = Instant::now();
        info!(
            assets = assets.len(),
            mode = %config.mode,
            crop = config.crop,
            remap = config.remap,
            output = %config.output.display(),
            "Starting batch"
        );

        if config.dry_run {
            info!("--dry-run: grouping and deduplicating only");
        } else {
            std::fs::create_dir_all(&config.output).map_err(|e| {
                UvCropperError::Output(format!(
                    "Failed to create output directory {}: {e}",
                    config.output.display()
                ))
            })?;
        }

        let executor = if config.crop && !config.dry_run {
            Some(CropExecutor::new(config.workers, &config.output)?)
        } else {
            None
        };

        let mut registry = VariantRegistry::new();
        let mut report = BatchReport::default();

        for (i, path) in assets.iter().enumerate() {
            info!(asset = %path.display(), "Asset {}/{}", i + 1, assets.len());
            match Self::process_asset(config, path, &registry, executor.as_ref()) {
                Ok((staged, asset_report)) => {
                    registry = staged;
                    report.assets.push(asset_report);
                }
                Err(e) => {
                    error!(asset = %path.display(), %e, "Asset failed");
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }

        report.variants = registry.len();
        report.duration = start.elapsed();
        info!(
            succeeded = report.succeeded(),
            failed = report.failed.len(),
            variants = report.variants,
            elapsed = ?report.duration,
            "Batch complete"
        );

        if config.dry_run {
            print_dry_run_summary(&report);
        } else {
            print_batch_summary(&report);
        }
        Ok(report)
    }

    /// Run every step for one asset against a staged copy of the registry.
    ///
    /// The staged registry is returned for commit only when every step
    /// succeeded.
    fn process_asset(
        config: &PipelineConfig,
        path: &Path,
        registry: &VariantRegistry,
        executor: Option<&CropExecutor>,
    ) -> Result<(VariantRegistry, AssetReport)> {
        let mut asset = ingestion::load_asset(path)?;
        let mut report = AssetReport {
            path: path.to_path_buf(),
            faces: asset.face_count(),
            ..Default::default()
        };

        if !asset.meshes.iter().any(|m| m.has_uvs()) {
            return Err(UvCropperError::AssetLoad(format!(
                "{}: no UV coordinates on any mesh",
                path.display()
            )));
        }

        let groupings: Vec<Grouping> = asset
            .meshes
            .iter()
            .map(|mesh| {
                group_faces(mesh, config.mode, |face| {
                    asset.materials.primary_image(face.material_index)
                })
            })
            .collect();
        for grouping in &groupings {
            report.grouping.merge(&grouping.stats);
        }
        if groupings.iter().all(|g| g.islands.is_empty()) {
            return Err(UvCropperError::NoImageResolved(format!(
                "any face of {}",
                path.display()
            )));
        }

        let mut staged = registry.clone();
        for island in groupings.iter().flat_map(|g| &g.islands) {
            staged.dedup(&island.image, island.bounds);
        }
        report.new_variants = staged.len() - registry.len();
        debug!(
            asset = %path.display(),
            new_variants = report.new_variants,
            total = staged.len(),
            "Deduplicated variants"
        );

        if config.dry_run {
            return Ok((staged, report));
        }

        if let Some(executor) = executor {
            let tasks = staged.pending_tasks();
            for (key, outcome) in executor.execute(&tasks) {
                match &outcome {
                    Ok(_) => report.crops_written += 1,
                    Err(e) if e.is_recoverable() => {
                        warn!(variant = %key, "Crop failed: {e}");
                        report.failed_crops.push((key.to_string(), e.to_string()));
                    }
                    Err(e) => {
                        return Err(UvCropperError::Output(format!("Cropping {key}: {e}")));
                    }
                }
                staged.record_crop(&key, &outcome);
            }
        }

        if config.remap {
            let mut bindings = MaterialBindings::new();
            for (mesh, grouping) in asset.meshes.iter_mut().zip(&groupings) {
                let stats = remap_mesh(
                    mesh,
                    &grouping.assignments(),
                    config.mode,
                    &staged,
                    &mut asset.materials,
                    &mut bindings,
                );
                report.remap.merge(&stats);
                if config.fill_by_material {
                    fill_by_material(mesh, |m| bindings.is_variant_material(m));
                }
            }
            if report.remap.omitted > 0 {
                warn!(
                    asset = %path.display(),
                    omitted = report.remap.omitted,
                    "Faces left on their original texture"
                );
            }
            report.exported = Some(export_asset(&asset, &config.output)?);
        }

        if let Err(e) = write_metadata(&config.output, &staged.records()) {
            if let Some(exported) = &report.exported {
                discard_export(exported);
            }
            return Err(e);
        }

        Ok((staged, report))
    }
}

/// Remove an exported OBJ and its MTL so no mesh outlives a rolled-back asset.
fn discard_export(obj_path: &Path) {
    for path in [obj_path.to_path_buf(), obj_path.with_extension("mtl")] {
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), "Failed to remove export: {e}");
        }
    }
}

/// Print per-run totals and the reason for every failed asset.
fn print_batch_summary(report: &BatchReport) {
    let grouping = report.grouping();
    let remap = report.remap();
    println!("=== Batch Summary ===");
    println!("  Assets:         {} ok, {} failed", report.succeeded(), report.failed.len());
    println!("  Units:          {}", grouping.units);
    println!("  Skipped:        {} without UVs, {} without image", grouping.empty_geometry, grouping.no_image);
    println!("  Variants:       {}", report.variants);
    println!("  Crops written:  {}", report.crops_written());
    println!("  Crops failed:   {}", report.failed_crops());
    println!("  Faces remapped: {}", remap.remapped);
    println!("  Remap omitted:  {}", remap.omitted);

    let failed_crops: Vec<_> = report.assets.iter().flat_map(|a| &a.failed_crops).collect();
    if !failed_crops.is_empty() {
        println!();
        println!("=== Failed Crops ===");
        for (variant, reason) in failed_crops {
            println!("  {variant}: {reason}");
        }
    }

    if !report.failed.is_empty() {
        println!();
        println!("=== Failed Assets ===");
        for (path, reason) in &report.failed {
            println!("  {}: {reason}", path.display());
        }
    }
}

/// Print one row per asset with what a real run would produce.
fn print_dry_run_summary(report: &BatchReport) {
    println!("=== Dry Run Summary ===");
    println!("  {:<40} {:>8} {:>8} {:>8} {:>8}", "Asset", "Faces", "Units", "Skipped", "Variants");
    for asset in &report.assets {
        println!(
            "  {:<40} {:>8} {:>8} {:>8} {:>8}",
            asset.path.display(),
            asset.faces,
            asset.grouping.units,
            asset.grouping.skipped(),
            asset.new_variants
        );
    }
    println!("  Distinct variants: {}", report.variants);

    if !report.failed.is_empty() {
        println!();
        println!("=== Failed Assets ===");
        for (path, reason) in &report.failed {
            println!("  {}: {reason}", path.display());
        }
    }
}
