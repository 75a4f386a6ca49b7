use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::cropping::crop_executor::CropTask;
use crate::cropping::metadata::VariantRecord;
use crate::error::Result;
use crate::types::{PixelBox, SourceImage};

/// Identity of a variant: source image name plus 1-based variant index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub image_name: String,
    pub index: usize,
}

impl VariantKey {
    pub fn new(image_name: impl Into<String>, index: usize) -> Self {
        Self {
            image_name: image_name.into(),
            index,
        }
    }

    /// File name of the cropped raster, e.g. `wall.png_variant2.png`.
    pub fn file_name(&self) -> String {
        format!("{self}.png")
    }
}

/// Generated variant name, e.g. `wall.png_variant2`.
impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_variant{}", self.image_name, self.index)
    }
}

/// A successfully written crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CroppedVariant {
    pub path: PathBuf,
    /// The box actually copied, after clamping to the source raster.
    pub clamped: PixelBox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropState {
    Pending,
    Cropped(CroppedVariant),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// 1-based, in first-seen order within its image.
    pub index: usize,
    pub bounds: PixelBox,
    pub state: CropState,
}

impl Variant {
    pub fn cropped(&self) -> Option<&CroppedVariant> {
        match &self.state {
            CropState::Cropped(c) => Some(c),
            _ => None,
        }
    }
}

/// All variants discovered for one source image.
#[derive(Debug, Clone)]
pub struct ImageVariants {
    pub name: String,
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub variants: Vec<Variant>,
}

/// Per-image ordered sets of distinct bounding boxes.
///
/// Images keep first-seen order and so do the variants within each image, so
/// feeding the same (image, box) sequence always yields the same indices.
/// Boxes are compared pixel-exact.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    images: Vec<ImageVariants>,
    by_name: HashMap<String, usize>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the variant index of `bounds` on `image`, appending a new
    /// variant if the box has not been seen for that image yet.
    pub fn dedup(&mut self, image: &SourceImage, bounds: PixelBox) -> usize {
        let slot = match self.by_name.get(&image.name) {
            Some(&slot) => slot,
            None => {
                self.images.push(ImageVariants {
                    name: image.name.clone(),
                    source_path: image.path.clone(),
                    width: image.width,
                    height: image.height,
                    variants: Vec::new(),
                });
                let slot = self.images.len() - 1;
                self.by_name.insert(image.name.clone(), slot);
                slot
            }
        };

        let entry = &mut self.images[slot];
        if let Some(existing) = entry.variants.iter().find(|v| v.bounds == bounds) {
            return existing.index;
        }
        let index = entry.variants.len() + 1;
        entry.variants.push(Variant {
            index,
            bounds,
            state: CropState::Pending,
        });
        index
    }

    /// Index of an already registered box, without inserting.
    pub fn lookup(&self, image_name: &str, bounds: &PixelBox) -> Option<usize> {
        let slot = *self.by_name.get(image_name)?;
        self.images[slot]
            .variants
            .iter()
            .find(|v| v.bounds == *bounds)
            .map(|v| v.index)
    }

    pub fn image(&self, image_name: &str) -> Option<&ImageVariants> {
        self.by_name.get(image_name).map(|&slot| &self.images[slot])
    }

    pub fn variant(&self, key: &VariantKey) -> Option<&Variant> {
        self.image(&key.image_name)?.variants.get(key.index.checked_sub(1)?)
    }

    fn variant_mut(&mut self, key: &VariantKey) -> Option<&mut Variant> {
        let slot = *self.by_name.get(&key.image_name)?;
        self.images[slot].variants.get_mut(key.index.checked_sub(1)?)
    }

    pub fn images(&self) -> &[ImageVariants] {
        &self.images
    }

    /// Total number of variants across all images.
    pub fn len(&self) -> usize {
        self.images.iter().map(|i| i.variants.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Crop tasks for every variant that has not been attempted yet, in
    /// registry order.
    pub fn pending_tasks(&self) -> Vec<CropTask> {
        self.images
            .iter()
            .flat_map(|image| {
                image
                    .variants
                    .iter()
                    .filter(|v| v.state == CropState::Pending)
                    .map(|v| CropTask {
                        key: VariantKey::new(image.name.clone(), v.index),
                        source: image.source_path.clone(),
                        bounds: v.bounds,
                    })
            })
            .collect()
    }

    /// Store the outcome of a crop task. Returns `false` for unknown keys.
    pub fn record_crop(&mut self, key: &VariantKey, outcome: &Result<CroppedVariant>) -> bool {
        let Some(variant) = self.variant_mut(key) else {
            return false;
        };
        variant.state = match outcome {
            Ok(cropped) => CropState::Cropped(cropped.clone()),
            Err(e) => CropState::Failed(e.to_string()),
        };
        true
    }

    /// Flattened view for metadata: image first-seen order, then variant index.
    pub fn records(&self) -> Vec<VariantRecord> {
        self.images
            .iter()
            .flat_map(|image| {
                image.variants.iter().map(|v| VariantRecord {
                    name: VariantKey::new(image.name.clone(), v.index).to_string(),
                    image_name: image.name.clone(),
                    source_path: image.source_path.clone(),
                    bounds: v.bounds,
                    width: image.width,
                    height: image.height,
                    cropped_path: v.cropped().map(|c| c.path.clone()),
                    clamped: v.cropped().map(|c| c.clamped),
                })
            })
            .collect()
    }
}
