pub mod download;
pub mod project;
