pub mod discovery;
pub mod obj_loader;

use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, UvCropperError};
use crate::types::MeshAsset;

pub use discovery::discover_assets;

/// Statistics about one loaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStats {
    pub meshes: usize,
    pub vertices: usize,
    pub faces: usize,
    pub meshes_with_uvs: usize,
    pub materials: usize,
    pub images: usize,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Obj,
}

impl InputFormat {
    /// Detect format from file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "obj" => Ok(InputFormat::Obj),
            _ => Err(UvCropperError::AssetLoad(format!(
                "Unsupported file format: .{ext}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Obj => "OBJ",
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import one asset file.
pub fn load_asset(path: &Path) -> Result<MeshAsset> {
    if !path.is_file() {
        return Err(UvCropperError::AssetLoad(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let format = InputFormat::from_path(path)?;
    info!(format = %format, path = %path.display(), "Loading asset");

    let asset = match format {
        InputFormat::Obj => obj_loader::load_obj(path)?,
    };

    let stats = compute_stats(&asset);
    debug!(
        meshes = stats.meshes,
        vertices = stats.vertices,
        faces = stats.faces,
        with_uvs = stats.meshes_with_uvs,
        images = stats.images,
        "Asset stats"
    );
    Ok(asset)
}

pub fn compute_stats(asset: &MeshAsset) -> AssetStats {
    AssetStats {
        meshes: asset.meshes.len(),
        vertices: asset.meshes.iter().map(|m| m.vertex_count()).sum(),
        faces: asset.face_count(),
        meshes_with_uvs: asset.meshes.iter().filter(|m| m.has_uvs()).count(),
        materials: asset.materials.materials.len(),
        images: asset.materials.images.len(),
    }
}
