use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, UvCropperError};
use crate::types::{Face, Material, MaterialLibrary, MeshAsset, PolyMesh, SourceImage};

/// Keep polygons and per-corner attribute indices as authored.
const LOAD_OPTIONS: tobj::LoadOptions = tobj::LoadOptions {
    single_index: false,
    triangulate: false,
    ignore_points: true,
    ignore_lines: true,
};

/// Load an OBJ file (+ associated MTL and texture headers) into a [`MeshAsset`].
pub fn load_obj(path: &Path) -> Result<MeshAsset> {
    let (models, materials_result) = tobj::load_obj(path, &LOAD_OPTIONS)
        .map_err(|e| UvCropperError::AssetLoad(format!("{}: {e}", path.display())))?;

    debug!(model_count = models.len(), "Loaded OBJ models");

    let obj_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let tobj_materials = match materials_result {
        Ok(mats) => mats,
        Err(e) => {
            warn!(path = %path.display(), "Failed to load MTL: {e}");
            Vec::new()
        }
    };

    let materials = convert_materials(&tobj_materials, obj_dir);

    // tobj starts a new model at every `usemtl`; runs of models sharing a
    // name are one object and are welded back together.
    let mut meshes: Vec<PolyMesh> = Vec::new();
    let mut pieces: Vec<PolyMesh> = Vec::new();
    for model in models {
        if pieces.last().is_some_and(|p| p.name != model.name) {
            meshes.push(merge_pieces(std::mem::take(&mut pieces), meshes.len()));
        }
        pieces.push(convert_mesh(model.name, model.mesh));
    }
    if !pieces.is_empty() {
        meshes.push(merge_pieces(pieces, meshes.len()));
    }
    debug!(mesh_count = meshes.len(), "Merged OBJ objects");

    Ok(MeshAsset {
        source: path.to_path_buf(),
        meshes,
        materials,
    })
}

/// Convert a `tobj::Mesh` loaded without single-index merging into a [`PolyMesh`].
///
/// UVs are copied per corner exactly as stored in the file; no V flip.
fn convert_mesh(name: String, mesh: tobj::Mesh) -> PolyMesh {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals: Vec<[f32; 3]> = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();
    let colors: Vec<[f32; 3]> = mesh
        .vertex_color
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let texcoords: Vec<[f32; 2]> = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| [t[0], t[1]])
        .collect();

    let corners = mesh.indices.len();
    let has_uvs = !texcoords.is_empty() && mesh.texcoord_indices.len() == corners;
    let has_normals = !normals.is_empty() && mesh.normal_indices.len() == corners;

    // No arities means every face is a triangle.
    let arities: Vec<usize> = if mesh.face_arities.is_empty() {
        vec![3; corners / 3]
    } else {
        mesh.face_arities.iter().map(|&a| a as usize).collect()
    };

    let mut faces = Vec::with_capacity(arities.len());
    let mut start = 0;
    for arity in arities {
        let end = start + arity;
        if end > corners {
            warn!(mesh = %name, "Face arity runs past index buffer, truncating mesh");
            break;
        }
        let uvs = if has_uvs {
            mesh.texcoord_indices[start..end]
                .iter()
                .map(|&t| texcoords.get(t as usize).copied().unwrap_or([0.0, 0.0]))
                .collect()
        } else {
            Vec::new()
        };
        faces.push(Face {
            positions: mesh.indices[start..end].to_vec(),
            uvs,
            normals: if has_normals {
                mesh.normal_indices[start..end].to_vec()
            } else {
                Vec::new()
            },
            material_index: mesh.material_id,
        });
        start = end;
    }

    PolyMesh {
        name,
        positions,
        normals: if has_normals { normals } else { Vec::new() },
        colors,
        faces,
    }
}

/// Join the pieces of one OBJ object into a single mesh.
///
/// Positions with bit-identical coordinates (and color, when every piece has
/// colors) are welded so faces on either side of a material switch share
/// edges again. Faces keep their own material.
fn merge_pieces(mut pieces: Vec<PolyMesh>, index: usize) -> PolyMesh {
    let fallback = format!("mesh{index}");
    if pieces.len() == 1 {
        if let Some(mut mesh) = pieces.pop() {
            if mesh.name.is_empty() {
                mesh.name = fallback;
            }
            return mesh;
        }
    }

    let colored = pieces
        .iter()
        .all(|p| p.has_colors() && p.colors.len() == p.positions.len());
    let name = pieces
        .first()
        .map(|p| p.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback);

    let mut merged = PolyMesh {
        name,
        ..Default::default()
    };
    let mut welded: HashMap<([u32; 3], [u32; 3]), u32> = HashMap::new();

    for piece in pieces {
        let mut remap = Vec::with_capacity(piece.positions.len());
        for (i, position) in piece.positions.iter().enumerate() {
            let color = if colored { piece.colors[i] } else { [0.0; 3] };
            let key = (position.map(f32::to_bits), color.map(f32::to_bits));
            let idx = match welded.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = merged.positions.len() as u32;
                    merged.positions.push(*position);
                    if colored {
                        merged.colors.push(color);
                    }
                    welded.insert(key, idx);
                    idx
                }
            };
            remap.push(idx);
        }

        let normal_offset = merged.normals.len() as u32;
        merged.normals.extend(piece.normals);
        for mut face in piece.faces {
            for p in &mut face.positions {
                *p = remap.get(*p as usize).copied().unwrap_or(*p);
            }
            for n in &mut face.normals {
                *n += normal_offset;
            }
            merged.faces.push(face);
        }
    }

    debug!(
        mesh = %merged.name,
        positions = merged.positions.len(),
        faces = merged.faces.len(),
        "Welded object pieces"
    );
    merged
}

/// Convert tobj materials into our [`MaterialLibrary`].
///
/// Only the image header is read here; decoding happens when cropping.
fn convert_materials(tobj_mats: &[tobj::Material], obj_dir: &Path) -> MaterialLibrary {
    let mut lib = MaterialLibrary::default();

    for mat in tobj_mats {
        let mut material = Material {
            name: mat.name.clone(),
            ..Default::default()
        };

        if let Some(diffuse) = mat.diffuse {
            material.diffuse = diffuse;
        }

        if let Some(ref tex_name) = mat.diffuse_texture {
            let image = read_image_header(&obj_dir.join(tex_name));
            material.base_color_texture = Some(lib.find_or_add_image(image));
        }

        lib.materials.push(material);
    }

    lib
}

/// Build a [`SourceImage`] from the file header. Unreadable images keep 0x0.
fn read_image_header(path: &Path) -> SourceImage {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let (width, height) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            warn!(texture = %path.display(), "Failed to read texture header: {e}");
            (0, 0)
        }
    };

    debug!(path = %path.display(), width, height, "Read texture header");

    SourceImage {
        name,
        path: path.to_path_buf(),
        width,
        height,
    }
}
