pub mod home;
pub mod posts;
pub mod system;
