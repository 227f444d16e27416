pub mod image;
pub mod logo;
