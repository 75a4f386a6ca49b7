use criterion::{criterion_group, criterion_main, Criterion};
use std::path::PathBuf;
use uv_cropper::config::CropMode;
use uv_cropper::cropping::islands::group_faces;
use uv_cropper::cropping::variants::VariantRegistry;
use uv_cropper::types::{Face, PolyMesh, SourceImage};

/// Generate an n x n quad grid split into `strips` horizontal UV shells.
///
/// Quads in the same strip share edges; strips do not share positions, so
/// island mode finds exactly `strips` islands.
fn make_grid(n: usize, strips: usize) -> PolyMesh {
    let verts_per_side = n + 1;
    let rows_per_strip = n / strips;
    let mut positions = Vec::new();
    let mut faces = Vec::with_capacity(n * n);

    for s in 0..strips {
        let base = positions.len() as u32;
        for y in 0..=rows_per_strip {
            for x in 0..verts_per_side {
                positions.push([x as f32, (s * rows_per_strip + y) as f32, 0.0]);
            }
        }
        for y in 0..rows_per_strip {
            for x in 0..n {
                let v = |x: usize, y: usize| base + (y * verts_per_side + x) as u32;
                let uv = |x: usize, y: usize| {
                    [
                        x as f32 / n as f32,
                        (s * rows_per_strip + y) as f32 / n as f32,
                    ]
                };
                faces.push(Face {
                    positions: vec![v(x, y), v(x + 1, y), v(x + 1, y + 1), v(x, y + 1)],
                    uvs: vec![uv(x, y), uv(x + 1, y), uv(x + 1, y + 1), uv(x, y + 1)],
                    normals: vec![],
                    material_index: Some(0),
                });
            }
        }
    }

    PolyMesh {
        name: "grid".into(),
        positions,
        faces,
        ..Default::default()
    }
}

fn atlas() -> SourceImage {
    SourceImage {
        name: "atlas.png".into(),
        path: PathBuf::from("atlas.png"),
        width: 4096,
        height: 4096,
    }
}

fn bench_group_per_face(c: &mut Criterion) {
    // 40K quads, every face its own unit
    let mesh = make_grid(200, 8);
    let image = atlas();

    c.bench_function("group_per_face_40k", |b| {
        b.iter(|| group_faces(&mesh, CropMode::PerFace, |_| Some(&image)));
    });
}

fn bench_group_per_island(c: &mut Criterion) {
    // Same grid: adjacency + flood fill over 8 shells
    let mesh = make_grid(200, 8);
    let image = atlas();

    c.bench_function("group_per_island_40k", |b| {
        b.iter(|| group_faces(&mesh, CropMode::PerIsland, |_| Some(&image)));
    });
}

fn bench_dedup(c: &mut Criterion) {
    let mesh = make_grid(100, 4);
    let image = atlas();
    let grouping = group_faces(&mesh, CropMode::PerFace, |_| Some(&image));

    c.bench_function("dedup_variants_10k", |b| {
        b.iter(|| {
            let mut registry = VariantRegistry::new();
            for island in &grouping.islands {
                registry.dedup(&island.image, island.bounds);
            }
            registry.len()
        });
    });
}

criterion_group!(benches, bench_group_per_face, bench_group_per_island, bench_dedup);
criterion_main!(benches);
