use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{PolyMesh, UvRect};

/// Partition the faces of `mesh` by material and rescale each selected
/// partition's UVs so the partition spans [0,1]².
///
/// Only partitions whose material passes `select` are touched; faces without
/// a material are never filled. Partitions with a zero UV span are skipped.
/// Returns the number of partitions filled.
pub fn fill_by_material<F>(mesh: &mut PolyMesh, select: F) -> usize
where
    F: Fn(usize) -> bool,
{
    let mut partitions: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (fi, face) in mesh.faces.iter().enumerate() {
        if let Some(mat) = face.material_index.filter(|&m| select(m)) {
            partitions.entry(mat).or_default().push(fi);
        }
    }

    let mut filled = 0;
    for (material, faces) in &partitions {
        let Some(rect) = UvRect::enclosing(faces.iter().flat_map(|&f| mesh.faces[f].uvs.iter()))
        else {
            continue;
        };
        let [du, dv] = rect.span();
        if du == 0.0 || dv == 0.0 {
            debug!(mesh = %mesh.name, material, "Skipping fill of flat partition");
            continue;
        }

        for &f in faces {
            for uv in &mut mesh.faces[f].uvs {
                if let Some(n) = rect.normalize(*uv) {
                    *uv = n;
                }
            }
        }
        filled += 1;
    }

    debug!(mesh = %mesh.name, partitions = partitions.len(), filled, "Filled UV partitions");
    filled
}
