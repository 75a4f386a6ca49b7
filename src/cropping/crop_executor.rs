use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cropping::variants::{CroppedVariant, VariantKey};
use crate::error::{Result, UvCropperError};
use crate::types::PixelBox;

/// Default size of the crop worker pool.
pub const DEFAULT_WORKERS: usize = 4;

/// One variant to cut out of its source raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropTask {
    pub key: VariantKey,
    pub source: PathBuf,
    pub bounds: PixelBox,
}

/// Result of one task, returned to the control thread for merging.
pub type CropOutcome = (VariantKey, Result<CroppedVariant>);

/// Clamp `bounds` to a `width x height` raster.
///
/// A zero-extent axis is first widened to one pixel, then the box is
/// intersected with the raster. Boxes that do not overlap the raster fail
/// with [`UvCropperError::DegenerateRegion`].
pub fn clamp_bounds(bounds: &PixelBox, width: u32, height: u32) -> Result<PixelBox> {
    let degenerate = || UvCropperError::DegenerateRegion {
        region: *bounds,
        width,
        height,
    };

    if bounds.xmax < bounds.xmin || bounds.ymax < bounds.ymin {
        return Err(degenerate());
    }
    let xmax = bounds.xmax.max(bounds.xmin.saturating_add(1));
    let ymax = bounds.ymax.max(bounds.ymin.saturating_add(1));

    let (w, h) = (width.min(i32::MAX as u32) as i32, height.min(i32::MAX as u32) as i32);
    let clamped = PixelBox::new(bounds.xmin.max(0), bounds.ymin.max(0), xmax.min(w), ymax.min(h));
    if !clamped.has_area() {
        return Err(degenerate());
    }
    Ok(clamped)
}

/// Copy the pixels of `bounds` (clamped first) out of `source`.
pub fn crop(source: &RgbaImage, bounds: &PixelBox) -> Result<(RgbaImage, PixelBox)> {
    let (w, h) = source.dimensions();
    let clamped = clamp_bounds(bounds, w, h)?;
    let view = image::imageops::crop_imm(
        source,
        clamped.xmin as u32,
        clamped.ymin as u32,
        clamped.width() as u32,
        clamped.height() as u32,
    );
    Ok((view.to_image(), clamped))
}

/// Decode a source raster into 4-channel RGBA, failing fast if it is absent.
pub fn load_source(path: &Path) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(UvCropperError::MissingSourceFile(path.to_path_buf()));
    }
    let img = image::open(path)
        .map_err(|e| UvCropperError::Codec(format!("Failed to decode {}: {e}", path.display())))?;
    Ok(img.to_rgba8())
}

/// Runs crop tasks on a bounded worker pool.
///
/// Each distinct source is decoded once per dispatch. Tasks then crop from
/// that read-only raster and write their own output file, sharing nothing
/// mutable. Outcomes come back in task order for the caller to merge.
pub struct CropExecutor {
    pool: rayon::ThreadPool,
    output_dir: PathBuf,
}

impl CropExecutor {
    pub fn new(workers: usize, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("crop-{i}"))
            .build()
            .map_err(|e| UvCropperError::Input(format!("Failed to build crop pool: {e}")))?;
        Ok(Self {
            pool,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every task and return one outcome per task, in task order.
    pub fn execute(&self, tasks: &[CropTask]) -> Vec<CropOutcome> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let mut sources: Vec<&Path> = tasks.iter().map(|t| t.source.as_path()).collect();
        sources.sort_unstable();
        sources.dedup();

        info!(
            tasks = tasks.len(),
            sources = sources.len(),
            workers = self.workers(),
            "Cropping variants"
        );

        self.pool.install(|| {
            let decoded: HashMap<&Path, Result<RgbaImage>> = sources
                .par_iter()
                .map(|&path| (path, load_source(path)))
                .collect();

            tasks
                .par_iter()
                .map(|task| {
                    let outcome = match decoded.get(task.source.as_path()) {
                        Some(Ok(source)) => self.crop_and_save(task, source),
                        Some(Err(e)) => Err(replicate_source_error(e)),
                        None => Err(UvCropperError::MissingSourceFile(task.source.clone())),
                    };
                    (task.key.clone(), outcome)
                })
                .collect()
        })
    }

    fn crop_and_save(&self, task: &CropTask, source: &RgbaImage) -> Result<CroppedVariant> {
        let (cropped, clamped) = crop(source, &task.bounds)?;
        let path = self.output_dir.join(task.key.file_name());
        cropped.save(&path).map_err(|e| {
            UvCropperError::Codec(format!("Failed to write {}: {e}", path.display()))
        })?;
        debug!(
            variant = %task.key,
            %clamped,
            width = cropped.width(),
            height = cropped.height(),
            "Wrote crop"
        );
        Ok(CroppedVariant { path, clamped })
    }
}

/// A decode failure is shared by every task on that source; give each task
/// its own copy.
fn replicate_source_error(e: &UvCropperError) -> UvCropperError {
    match e {
        UvCropperError::MissingSourceFile(p) => UvCropperError::MissingSourceFile(p.clone()),
        other => UvCropperError::Codec(other.to_string()),
    }
}
