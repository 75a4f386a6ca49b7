use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::CropMode;
use crate::cropping::coords::to_pixel_bounds;
use crate::error::{Result, UvCropperError};
use crate::types::{Face, PixelBox, PolyMesh, SourceImage};

/// Links one face to the variant it will be remapped onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceAssignment {
    pub face: usize,
    pub image_name: String,
    pub bounds: PixelBox,
}

/// A cropping unit: one face in per-face mode, a connected face set in
/// per-island mode.
#[derive(Debug, Clone)]
pub struct Island {
    /// Member faces, ascending.
    pub faces: Vec<usize>,
    /// Source image of the first member face that resolves one.
    pub image: SourceImage,
    /// Pixel bounds of every member UV on `image`.
    pub bounds: PixelBox,
}

/// Counters for units dropped during grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    pub units: usize,
    pub empty_geometry: usize,
    pub no_image: usize,
}

impl GroupingStats {
    pub fn skipped(&self) -> usize {
        self.empty_geometry + self.no_image
    }

    pub fn merge(&mut self, other: &GroupingStats) {
        self.units += other.units;
        self.empty_geometry += other.empty_geometry;
        self.no_image += other.no_image;
    }
}

/// Islands of one mesh, in ascending order of their first face.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub islands: Vec<Island>,
    pub stats: GroupingStats,
}

impl Grouping {
    /// Broadcast each island's bounds to its member faces, ordered by face.
    pub fn assignments(&self) -> Vec<FaceAssignment> {
        let mut out: Vec<FaceAssignment> = self
            .islands
            .iter()
            .flat_map(|island| {
                island.faces.iter().map(|&face| FaceAssignment {
                    face,
                    image_name: island.image.name.clone(),
                    bounds: island.bounds,
                })
            })
            .collect();
        out.sort_by_key(|a| a.face);
        out
    }
}

/// Face-to-face adjacency over shared (position) edges.
pub fn build_face_adjacency(mesh: &PolyMesh) -> Vec<Vec<usize>> {
    let mut edge_map: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (fi, face) in mesh.faces.iter().enumerate() {
        for edge in face.edges() {
            let faces = edge_map.entry(edge).or_default();
            if !faces.contains(&fi) {
                faces.push(fi);
            }
        }
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); mesh.faces.len()];
    for faces in edge_map.values() {
        for (i, &fi) in faces.iter().enumerate() {
            for &fj in &faces[i + 1..] {
                if !adjacency[fi].contains(&fj) {
                    adjacency[fi].push(fj);
                }
                if !adjacency[fj].contains(&fi) {
                    adjacency[fj].push(fi);
                }
            }
        }
    }
    adjacency
}

/// Connected components of the adjacency graph.
///
/// Iterative flood fill from every unvisited face in ascending order, so the
/// component order and each component's (sorted) membership are
/// deterministic.
pub fn find_islands(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; adjacency.len()];
    let mut islands = Vec::new();

    for start in 0..adjacency.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut stack = vec![start];
        let mut members = Vec::new();

        while let Some(face) = stack.pop() {
            members.push(face);
            for &neighbor in &adjacency[face] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }

        members.sort_unstable();
        islands.push(members);
    }

    islands
}

/// Group the faces of `mesh` into cropping units and bound each on its image.
///
/// `resolve` is the host's primary-image lookup for a face. Units without UV
/// points or without an image are dropped with a warning and counted in the
/// returned stats.
pub fn group_faces<'a, F>(mesh: &PolyMesh, mode: CropMode, resolve: F) -> Grouping
where
    F: Fn(&Face) -> Option<&'a SourceImage>,
{
    let units: Vec<Vec<usize>> = match mode {
        CropMode::PerFace => (0..mesh.faces.len()).map(|f| vec![f]).collect(),
        CropMode::PerIsland => find_islands(&build_face_adjacency(mesh)),
    };

    let mut grouping = Grouping::default();
    for faces in units {
        grouping.stats.units += 1;
        match bound_unit(mesh, &faces, &resolve) {
            Ok((image, bounds)) => grouping.islands.push(Island {
                faces,
                image: image.clone(),
                bounds,
            }),
            Err(UvCropperError::EmptyGeometry) => {
                warn!(mesh = %mesh.name, first_face = faces[0], "Skipping unit without UV points");
                grouping.stats.empty_geometry += 1;
            }
            Err(e) => {
                warn!(mesh = %mesh.name, first_face = faces[0], "Skipping unit: {e}");
                grouping.stats.no_image += 1;
            }
        }
    }

    debug!(
        mesh = %mesh.name,
        ?mode,
        units = grouping.stats.units,
        kept = grouping.islands.len(),
        "Grouped faces"
    );
    grouping
}

fn bound_unit<'a, F>(
    mesh: &PolyMesh,
    faces: &[usize],
    resolve: &F,
) -> Result<(&'a SourceImage, PixelBox)>
where
    F: Fn(&Face) -> Option<&'a SourceImage>,
{
    let points: Vec<[f32; 2]> = faces
        .iter()
        .flat_map(|&f| mesh.faces[f].uvs.iter().copied())
        .collect();
    if points.is_empty() {
        return Err(UvCropperError::EmptyGeometry);
    }

    let image = faces
        .iter()
        .find_map(|&f| resolve(&mesh.faces[f]))
        .ok_or_else(|| UvCropperError::NoImageResolved(format!("faces starting at {}", faces[0])))?;

    let bounds = to_pixel_bounds(&points, image.width, image.height)?;
    Ok((image, bounds))
}
