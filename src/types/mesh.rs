use std::path::PathBuf;

use super::MaterialLibrary;

/// One polygon of a [`PolyMesh`].
///
/// Corner attributes are stored per corner, in winding order. `uvs` and
/// `normals` are either empty or exactly as long as `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Face {
    /// Indices into `PolyMesh::positions`.
    pub positions: Vec<u32>,
    /// Per-corner texture coordinates: [u, v], origin bottom-left.
    pub uvs: Vec<[f32; 2]>,
    /// Per-corner indices into `PolyMesh::normals`.
    pub normals: Vec<u32>,
    /// Index into the owning asset's `MaterialLibrary::materials`.
    pub material_index: Option<usize>,
}

impl Face {
    /// Number of corners (loop length).
    pub fn corner_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Edges of the face as sorted position-index pairs.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.positions.len();
        (0..n).filter_map(move |i| {
            let a = self.positions[i];
            let b = self.positions[(i + 1) % n];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => Some((a, b)),
                std::cmp::Ordering::Greater => Some((b, a)),
                std::cmp::Ordering::Equal => None,
            }
        })
    }
}

/// Polygon mesh with shared positions and per-corner UVs.
///
/// Face identifiers are indices into `faces` and stay stable for the
/// lifetime of one pipeline pass.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Per-position vertex colors (RGB), or empty.
    pub colors: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
}

impl PolyMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether any face carries UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.faces.iter().any(Face::has_uvs)
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// One imported asset file: its meshes and the materials they share.
#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub source: PathBuf,
    pub meshes: Vec<PolyMesh>,
    pub materials: MaterialLibrary,
}

impl MeshAsset {
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(PolyMesh::face_count).sum()
    }

    /// File stem of the source path, used to name exported artifacts.
    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("asset")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Face {
        Face {
            positions: vec![0, 1, 2, 3],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            normals: vec![],
            material_index: Some(0),
        }
    }

    #[test]
    fn empty_mesh() {
        let mesh = PolyMesh::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert!(!mesh.has_uvs());
        assert!(!mesh.has_normals());
        assert!(!mesh.has_colors());
    }

    #[test]
    fn quad_edges_are_sorted_pairs() {
        let edges: Vec<_> = quad().edges().collect();
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (0, 3)]);
    }

    #[test]
    fn collapsed_edge_is_skipped() {
        let face = Face {
            positions: vec![4, 4, 7],
            ..Default::default()
        };
        let edges: Vec<_> = face.edges().collect();
        assert_eq!(edges, vec![(4, 7), (4, 7)]);
    }

    #[test]
    fn mesh_with_uvs() {
        let mesh = PolyMesh {
            name: "plane".into(),
            positions: vec![[0.0; 3]; 4],
            faces: vec![quad()],
            ..Default::default()
        };
        assert!(mesh.has_uvs());
        assert_eq!(mesh.faces[0].corner_count(), 4);
    }

    #[test]
    fn asset_stem() {
        let asset = MeshAsset {
            source: PathBuf::from("models/crate.obj"),
            ..Default::default()
        };
        assert_eq!(asset.stem(), "crate");
        assert_eq!(asset.face_count(), 0);
    }
}
