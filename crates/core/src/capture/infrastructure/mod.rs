pub mod image_dir_source;
pub mod synthetic_source;
