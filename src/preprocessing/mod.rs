pub mod image;
pub mod padding;
