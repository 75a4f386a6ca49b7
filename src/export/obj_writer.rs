use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, UvCropperError};
use crate::types::{Face, MaterialLibrary, MeshAsset};

/// Suffix appended to the source stem for exported files.
pub const EXPORT_SUFFIX: &str = "_Fix";

/// Export `asset` as `<stem>_Fix.obj` + `<stem>_Fix.mtl` into `dir`.
///
/// Returns the path of the written OBJ.
pub fn export_asset(asset: &MeshAsset, dir: &Path) -> Result<PathBuf> {
    let base = format!("{}{EXPORT_SUFFIX}", asset.stem());
    let obj_path = dir.join(format!("{base}.obj"));
    let mtl_name = format!("{base}.mtl");
    let mtl_path = dir.join(&mtl_name);

    let export_err =
        |path: &Path, e: io::Error| UvCropperError::AssetExport(format!("{}: {e}", path.display()));

    std::fs::create_dir_all(dir).map_err(|e| export_err(dir, e))?;

    let file = File::create(&mtl_path).map_err(|e| export_err(&mtl_path, e))?;
    let mut writer = BufWriter::new(file);
    write_mtl(&mut writer, &asset.materials, dir).map_err(|e| export_err(&mtl_path, e))?;

    let file = File::create(&obj_path).map_err(|e| export_err(&obj_path, e))?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, asset, &mtl_name).map_err(|e| export_err(&obj_path, e))?;

    info!(
        path = %obj_path.display(),
        meshes = asset.meshes.len(),
        faces = asset.face_count(),
        materials = asset.materials.materials.len(),
        "Exported asset"
    );
    Ok(obj_path)
}

/// Name a material is written under; unnamed materials get a positional name.
fn material_name(library: &MaterialLibrary, index: usize) -> String {
    match library.materials.get(index) {
        Some(m) if !m.name.is_empty() => m.name.clone(),
        _ => format!("material{index}"),
    }
}

/// Write the material library in MTL form.
///
/// Textures inside `dir` are referenced by file name, others by absolute path.
pub fn write_mtl<W: Write>(writer: &mut W, library: &MaterialLibrary, dir: &Path) -> io::Result<()> {
    for (i, material) in library.materials.iter().enumerate() {
        writeln!(writer, "newmtl {}", material_name(library, i))?;
        let [r, g, b] = material.diffuse;
        writeln!(writer, "Kd {r} {g} {b}")?;
        if let Some(image) = library.primary_image(Some(i)) {
            writeln!(writer, "map_Kd {}", texture_reference(&image.path, dir).display())?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

fn texture_reference(path: &Path, dir: &Path) -> PathBuf {
    if path.parent() == Some(dir) {
        if let Some(name) = path.file_name() {
            return PathBuf::from(name);
        }
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Write every mesh of `asset` as one OBJ object.
///
/// Positions keep their vertex colors, texture coordinates are written once
/// per corner, and `usemtl` is emitted whenever the face material changes.
pub fn write_obj<W: Write>(writer: &mut W, asset: &MeshAsset, mtl_name: &str) -> io::Result<()> {
    writeln!(writer, "mtllib {mtl_name}")?;

    // OBJ indices are global and 1-based.
    let mut v_offset = 1usize;
    let mut vt_offset = 1usize;
    let mut vn_offset = 1usize;

    for (mi, mesh) in asset.meshes.iter().enumerate() {
        if mesh.name.is_empty() {
            writeln!(writer, "o mesh{mi}")?;
        } else {
            writeln!(writer, "o {}", mesh.name)?;
        }

        let colored = mesh.colors.len() == mesh.positions.len() && mesh.has_colors();
        for (pi, [x, y, z]) in mesh.positions.iter().enumerate() {
            if colored {
                let [r, g, b] = mesh.colors[pi];
                writeln!(writer, "v {x} {y} {z} {r} {g} {b}")?;
            } else {
                writeln!(writer, "v {x} {y} {z}")?;
            }
        }
        for [x, y, z] in &mesh.normals {
            writeln!(writer, "vn {x} {y} {z}")?;
        }
        for face in &mesh.faces {
            for [u, v] in &face.uvs {
                writeln!(writer, "vt {u} {v}")?;
            }
        }

        let mut current_material = None;
        let mut corner_uv = vt_offset;
        for face in &mesh.faces {
            if face.material_index.is_some() && face.material_index != current_material {
                current_material = face.material_index;
                if let Some(mat) = current_material {
                    writeln!(writer, "usemtl {}", material_name(&asset.materials, mat))?;
                }
            }
            write_face(writer, face, v_offset, corner_uv, vn_offset)?;
            corner_uv += face.uvs.len();
        }

        v_offset += mesh.positions.len();
        vn_offset += mesh.normals.len();
        vt_offset = corner_uv;
    }

    writer.flush()?;
    debug!(positions = v_offset - 1, uvs = vt_offset - 1, "Wrote OBJ body");
    Ok(())
}

fn write_face<W: Write>(
    writer: &mut W,
    face: &Face,
    v_offset: usize,
    vt_start: usize,
    vn_offset: usize,
) -> io::Result<()> {
    write!(writer, "f")?;
    for (ci, &p) in face.positions.iter().enumerate() {
        let v = p as usize + v_offset;
        let vt = face.has_uvs().then(|| vt_start + ci);
        let vn = face.normals.get(ci).map(|&n| n as usize + vn_offset);
        match (vt, vn) {
            (Some(t), Some(n)) => write!(writer, " {v}/{t}/{n}")?,
            (Some(t), None) => write!(writer, " {v}/{t}")?,
            (None, Some(n)) => write!(writer, " {v}//{n}")?,
            (None, None) => write!(writer, " {v}")?,
        }
    }
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::obj_loader::load_obj;
    use crate::types::{PolyMesh, SourceImage};

    fn quad_asset(dir: &Path) -> MeshAsset {
        let mut materials = MaterialLibrary::default();
        let mat = materials.find_or_add_material(
            "atlas.png_variant1",
            SourceImage {
                name: "atlas.png_variant1.png".into(),
                path: dir.join("atlas.png_variant1.png"),
                width: 512,
                height: 32,
            },
        );
        MeshAsset {
            source: PathBuf::from("/scans/wall.obj"),
            meshes: vec![PolyMesh {
                name: "wall".into(),
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]],
                colors: vec![[1.0, 0.0, 0.0]; 4],
                faces: vec![Face {
                    positions: vec![0, 1, 2, 3],
                    uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
                    normals: vec![0, 0, 0, 0],
                    material_index: Some(mat),
                }],
            }],
            materials,
        }
    }

    #[test]
    fn obj_body_format() {
        let asset = quad_asset(Path::new("/out"));
        let mut buf = Vec::new();
        write_obj(&mut buf, &asset, "wall_Fix.mtl").unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("mtllib wall_Fix.mtl\no wall\n"));
        assert!(text.contains("v 1 0 0 1 0 0\n"));
        assert!(text.contains("vt 1 1\n"));
        assert!(text.contains("usemtl atlas.png_variant1\n"));
        assert!(text.contains("f 1/1/1 2/2/1 3/3/1 4/4/1\n"));
    }

    #[test]
    fn mtl_references_local_texture_by_name() {
        let asset = quad_asset(Path::new("/out"));
        let mut buf = Vec::new();
        write_mtl(&mut buf, &asset.materials, Path::new("/out")).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "newmtl atlas.png_variant1\nKd 1 1 1\nmap_Kd atlas.png_variant1.png\n\n"
        );
    }

    #[test]
    fn mtl_references_foreign_texture_absolutely() {
        let reference = texture_reference(Path::new("/tex/wall.png"), Path::new("/out"));
        assert_eq!(reference, PathBuf::from("/tex/wall.png"));
    }

    #[test]
    fn export_reloads_with_same_uvs_and_texture() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        image::RgbaImage::new(512, 32)
            .save(dir.join("atlas.png_variant1.png"))
            .unwrap();

        let asset = quad_asset(dir);
        let path = export_asset(&asset, dir).unwrap();
        assert_eq!(path, dir.join("wall_Fix.obj"));
        assert!(dir.join("wall_Fix.mtl").exists());

        let reloaded = load_obj(&path).unwrap();
        assert_eq!(reloaded.face_count(), 1);
        let face = &reloaded.meshes[0].faces[0];
        assert_eq!(face.positions.len(), 4);
        assert_eq!(face.uvs, asset.meshes[0].faces[0].uvs);
        assert_eq!(reloaded.meshes[0].colors.len(), 4);

        let image = reloaded.materials.primary_image(face.material_index).unwrap();
        assert_eq!(image.name, "atlas.png_variant1.png");
        assert_eq!((image.width, image.height), (512, 32));
    }

    #[test]
    fn export_into_unwritable_location_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let asset = quad_asset(tmp.path());
        let err = export_asset(&asset, &blocker.join("sub")).unwrap_err();
        assert!(matches!(err, UvCropperError::AssetExport(_)));
    }
}
