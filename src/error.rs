use std::io;
use std::path::PathBuf;

use crate::types::PixelBox;

/// All error types for the uv-cropper pipeline.
#[derive(thiserror::Error, Debug)]
pub enum UvCropperError {
    #[error("Input error: {0}")]
    Input(String),
    #[error("Empty geometry: no UV points to bound")]
    EmptyGeometry,
    #[error("No source image resolved for {0}")]
    NoImageResolved(String),
    #[error("Source image not found: {}", .0.display())]
    MissingSourceFile(PathBuf),
    #[error("Degenerate crop region {region} on {width}x{height} image")]
    DegenerateRegion {
        region: PixelBox,
        width: u32,
        height: u32,
    },
    #[error("Image codec error: {0}")]
    Codec(String),
    #[error("Asset load failed: {0}")]
    AssetLoad(String),
    #[error("Asset export failed: {0}")]
    AssetExport(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl UvCropperError {
    /// Whether this error only drops one unit of work (a face, island or crop)
    /// rather than the whole asset.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UvCropperError::EmptyGeometry
                | UvCropperError::NoImageResolved(_)
                | UvCropperError::MissingSourceFile(_)
                | UvCropperError::DegenerateRegion { .. }
                | UvCropperError::Codec(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UvCropperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_strings() {
        let e = UvCropperError::Input("bad file".into());
        assert_eq!(e.to_string(), "Input error: bad file");

        let e = UvCropperError::MissingSourceFile(PathBuf::from("tex/wall.png"));
        assert_eq!(e.to_string(), "Source image not found: tex/wall.png");

        let e = UvCropperError::DegenerateRegion {
            region: PixelBox::new(100, 100, 110, 110),
            width: 8,
            height: 8,
        };
        assert_eq!(
            e.to_string(),
            "Degenerate crop region (100, 100, 110, 110) on 8x8 image"
        );

        let e = UvCropperError::AssetLoad("truncated".into());
        assert_eq!(e.to_string(), "Asset load failed: truncated");

        let e = UvCropperError::AssetExport("disk full".into());
        assert_eq!(e.to_string(), "Asset export failed: disk full");
    }

    #[test]
    fn from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let e: UvCropperError = io_err.into();
        assert!(matches!(e, UvCropperError::Io(_)));
        assert!(e.to_string().contains("file missing"));
    }

    #[test]
    fn recoverable_classification() {
        assert!(UvCropperError::EmptyGeometry.is_recoverable());
        assert!(UvCropperError::NoImageResolved("island 2".into()).is_recoverable());
        assert!(!UvCropperError::AssetLoad("x".into()).is_recoverable());
        assert!(!UvCropperError::AssetExport("x".into()).is_recoverable());
    }
}
