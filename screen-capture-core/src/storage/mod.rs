pub mod fs_catalog;
pub mod publisher;
pub mod scratch_writer;
