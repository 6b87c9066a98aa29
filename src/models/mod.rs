pub mod media;

pub use media::{ContainerFormat, MediaInfo};
