use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, UvCropperError};
use crate::ingestion::InputFormat;

/// Expand the CLI inputs into the ordered list of assets to process.
///
/// Directories are walked recursively for supported files (sorted by path);
/// anything under `output` is skipped so earlier exports are not picked up
/// again. Explicit paths are kept as given, even when they do not exist, so
/// that they fail as individual assets rather than aborting the batch.
pub fn discover_assets(inputs: &[PathBuf], output: &Path) -> Result<Vec<PathBuf>> {
    let mut assets = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            if !input.exists() {
                warn!(path = %input.display(), "Input does not exist");
            }
            assets.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(output) || output.as_os_str().is_empty())
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| InputFormat::from_path(p).is_ok())
            .collect();
        found.sort();

        debug!(dir = %input.display(), count = found.len(), "Scanned input directory");
        assets.extend(found);
    }

    if assets.is_empty() {
        return Err(UvCropperError::Input(
            "No OBJ assets found in the given inputs".into(),
        ));
    }
    Ok(assets)
}
