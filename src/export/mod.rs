pub mod obj_writer;

pub use obj_writer::export_asset;
