use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::CropMode;
use crate::cropping::coords::to_uv_extent;
use crate::cropping::islands::FaceAssignment;
use crate::cropping::variants::{CroppedVariant, VariantKey, VariantRegistry};
use crate::types::{Face, MaterialLibrary, PolyMesh, SourceImage, UvRect};

/// Memo of variant -> material for one asset.
///
/// Never shared across assets: two assets may reference different images
/// that happen to share a name.
#[derive(Debug, Default)]
pub struct MaterialBindings {
    bound: HashMap<VariantKey, usize>,
}

impl MaterialBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Material index for `key`, creating a material that samples the cropped
    /// raster on first use.
    pub fn ensure(
        &mut self,
        library: &mut MaterialLibrary,
        key: &VariantKey,
        cropped: &CroppedVariant,
    ) -> usize {
        if let Some(&idx) = self.bound.get(key) {
            return idx;
        }
        let image = SourceImage {
            name: key.file_name(),
            path: cropped.path.clone(),
            width: cropped.clamped.width() as u32,
            height: cropped.clamped.height() as u32,
        };
        let idx = library.find_or_add_material(&key.to_string(), image);
        self.bound.insert(key.clone(), idx);
        idx
    }

    /// Whether `material_index` is one of the variant materials bound here.
    pub fn is_variant_material(&self, material_index: usize) -> bool {
        self.bound.values().any(|&idx| idx == material_index)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapStats {
    pub remapped: usize,
    /// Faces left untouched because their variant has no crop.
    pub omitted: usize,
}

impl RemapStats {
    pub fn merge(&mut self, other: &RemapStats) {
        self.remapped += other.remapped;
        self.omitted += other.omitted;
    }
}

/// How a face's UVs are rewritten.
#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Stretch the face's own UV extent to [0,1]².
    OwnExtent,
    /// Express UVs relative to the crop's frame in the source image.
    CropFrame(UvRect),
}

struct FacePlan {
    face: usize,
    material: usize,
    placement: Placement,
}

/// Rescale `face` so its own UV extent spans [0,1]².
///
/// Returns `false` (leaving the face alone) when either span is zero.
pub fn normalize_face_uvs(face: &mut Face) -> bool {
    let Some(rect) = UvRect::enclosing(&face.uvs) else {
        return false;
    };
    rescale_uvs(face, &rect)
}

fn rescale_uvs(face: &mut Face, rect: &UvRect) -> bool {
    let [du, dv] = rect.span();
    if du == 0.0 || dv == 0.0 {
        return false;
    }
    for uv in &mut face.uvs {
        if let Some(n) = rect.normalize(*uv) {
            *uv = n;
        }
    }
    true
}

/// Point every assigned face of `mesh` at its cropped variant.
///
/// Runs in two passes: plans are resolved against the registry first, then
/// materials and UVs are written. Faces whose variant has no crop are left
/// unmodified and counted as omitted.
pub fn remap_mesh(
    mesh: &mut PolyMesh,
    assignments: &[FaceAssignment],
    mode: CropMode,
    registry: &VariantRegistry,
    library: &mut MaterialLibrary,
    bindings: &mut MaterialBindings,
) -> RemapStats {
    let mut stats = RemapStats::default();
    let mut plans = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let Some(index) = registry.lookup(&assignment.image_name, &assignment.bounds) else {
            warn!(
                mesh = %mesh.name,
                face = assignment.face,
                image = %assignment.image_name,
                "Assignment has no registered variant"
            );
            stats.omitted += 1;
            continue;
        };
        let key = VariantKey::new(assignment.image_name.clone(), index);
        let Some(cropped) = registry.variant(&key).and_then(|v| v.cropped()) else {
            debug!(mesh = %mesh.name, face = assignment.face, variant = %key, "No crop, face left as is");
            stats.omitted += 1;
            continue;
        };

        let placement = match mode {
            CropMode::PerFace => Placement::OwnExtent,
            CropMode::PerIsland => match registry.image(&assignment.image_name) {
                Some(image) => {
                    Placement::CropFrame(to_uv_extent(&cropped.clamped, image.width, image.height))
                }
                None => Placement::OwnExtent,
            },
        };

        let material = bindings.ensure(library, &key, cropped);
        plans.push(FacePlan {
            face: assignment.face,
            material,
            placement,
        });
    }

    for plan in plans {
        let Some(face) = mesh.faces.get_mut(plan.face) else {
            stats.omitted += 1;
            continue;
        };
        face.material_index = Some(plan.material);
        match plan.placement {
            Placement::OwnExtent => {
                normalize_face_uvs(face);
            }
            Placement::CropFrame(rect) => {
                rescale_uvs(face, &rect);
            }
        }
        stats.remapped += 1;
    }

    debug!(
        mesh = %mesh.name,
        remapped = stats.remapped,
        omitted = stats.omitted,
        materials = bindings.len(),
        "Remapped faces"
    );
    stats
}
