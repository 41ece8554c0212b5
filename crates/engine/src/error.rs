use std::path::PathBuf;

use crate::frame::{FramePhase, ResourceState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(windows)]
    #[error("Direct3D error: {0}")]
    Windows(#[from] windows::core::Error),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to load OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse the config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Descriptor heap `{name}` is full ({capacity} slots)")]
    DescriptorHeapFull { name: String, capacity: u32 },

    #[error("Texture `{}` has not been loaded", .0.display())]
    TextureNotLoaded(PathBuf),

    #[error("Texture index {index} is out of range ({count} textures loaded)")]
    TextureIndexOutOfRange { index: usize, count: usize },

    #[error("Illegal resource state transition: {before:?} -> {after:?}")]
    IllegalTransition {
        before: ResourceState,
        after: ResourceState,
    },

    #[error("Expected the frame to be {expected:?}, but it is {actual:?}")]
    FramePhase {
        expected: FramePhase,
        actual: FramePhase,
    },

    #[error("Failed to compile {path}: {message}")]
    ShaderCompilation { path: String, message: String },

    #[error("No hardware adapter supports the required feature level")]
    NoSuitableAdapter,

    #[error("The width and the height must be greater than zero")]
    ZeroSize,
}
