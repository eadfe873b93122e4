pub mod image;
pub mod pagination;
pub mod post;
