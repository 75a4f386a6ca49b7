pub mod config;
pub mod cropping;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod pipeline;
pub mod types;

pub use config::{CropMode, PipelineConfig};
pub use error::{Result, UvCropperError};
pub use pipeline::{BatchReport, Pipeline};
