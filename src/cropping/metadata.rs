use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, UvCropperError};
use crate::types::PixelBox;

pub const VARIANT_NAMES_FILE: &str = "image_names.txt";
pub const SOURCE_NAMES_FILE: &str = "image_names_to_crop.txt";
pub const COORDINATES_FILE: &str = "uv_coordinates.txt";
pub const IMAGE_SIZES_FILE: &str = "image_sizes.txt";
pub const VARIANTS_JSON_FILE: &str = "variants.json";

/// One registered variant, flattened for the metadata listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantRecord {
    pub name: String,
    pub image_name: String,
    pub source_path: PathBuf,
    /// Unclamped pixel bounds, as registered.
    pub bounds: PixelBox,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cropped_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped: Option<PixelBox>,
}

/// `"wall.png_variant1",` per variant.
pub fn format_variant_names(records: &[VariantRecord]) -> String {
    join_lines(records.iter().map(|r| format!("\"{}\",", r.name)))
}

/// `"wall.png",` per variant; repeats the image name for each of its variants.
pub fn format_source_names(records: &[VariantRecord]) -> String {
    join_lines(records.iter().map(|r| format!("\"{}\",", r.image_name)))
}

/// `(xmin, ymin, xmax, ymax),    # 'wall.png_variant1'` per variant.
pub fn format_coordinates(records: &[VariantRecord]) -> String {
    join_lines(
        records
            .iter()
            .map(|r| format!("{},    # '{}'", r.bounds, r.name)),
    )
}

/// `("wall.png", 1024, 128),` per variant.
pub fn format_image_sizes(records: &[VariantRecord]) -> String {
    join_lines(
        records
            .iter()
            .map(|r| format!("(\"{}\", {}, {}),", r.image_name, r.width, r.height)),
    )
}

pub fn format_json(records: &[VariantRecord]) -> Result<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| UvCropperError::Output(format!("Failed to serialize variants: {e}")))
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

/// Write every listing into `dir`, replacing earlier contents.
///
/// Each listing is staged in a `.tmp` sibling first; the live files are only
/// replaced once every listing has been staged, so a failed write leaves the
/// previous set intact. Returns the paths written, in a fixed order.
pub fn write_metadata(dir: &Path, records: &[VariantRecord]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let listings = [
        (VARIANT_NAMES_FILE, format_variant_names(records)),
        (SOURCE_NAMES_FILE, format_source_names(records)),
        (COORDINATES_FILE, format_coordinates(records)),
        (IMAGE_SIZES_FILE, format_image_sizes(records)),
        (VARIANTS_JSON_FILE, format_json(records)?),
    ];

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(listings.len());
    for (file, contents) in listings {
        let path = dir.join(file);
        let tmp = dir.join(format!("{file}.tmp"));
        if let Err(e) = fs::write(&tmp, contents) {
            discard_staged(&staged);
            return Err(UvCropperError::Output(format!(
                "Failed to write {}: {e}",
                tmp.display()
            )));
        }
        staged.push((tmp, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp, path) in staged {
        fs::rename(&tmp, &path).map_err(|e| {
            UvCropperError::Output(format!("Failed to replace {}: {e}", path.display()))
        })?;
        written.push(path);
    }

    debug!(dir = %dir.display(), variants = records.len(), "Wrote metadata");
    Ok(written)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            warn!(path = %tmp.display(), "Failed to remove staged listing: {e}");
        }
    }
}
