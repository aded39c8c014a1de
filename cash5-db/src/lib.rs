pub mod archive;
pub mod models;
