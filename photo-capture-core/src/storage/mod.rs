pub mod metadata;
pub mod photo_file;
