pub mod bounds;
pub mod material;
pub mod mesh;

pub use bounds::{PixelBox, UvRect};
pub use material::{Material, MaterialLibrary, SourceImage};
pub use mesh::{Face, MeshAsset, PolyMesh};
