pub mod coords;
pub mod crop_executor;
pub mod islands;
pub mod metadata;
pub mod remap;
pub mod uv_fill;
pub mod variants;

pub use coords::{to_pixel_bounds, to_uv_extent};
pub use crop_executor::{CropExecutor, CropTask};
pub use islands::{FaceAssignment, Grouping, GroupingStats, Island, group_faces};
pub use metadata::{VariantRecord, write_metadata};
pub use remap::{MaterialBindings, RemapStats, remap_mesh};
pub use uv_fill::fill_by_material;
pub use variants::{VariantKey, VariantRegistry};
