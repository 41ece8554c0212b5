pub mod camera;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod frame;
pub mod frame_limiter;
pub mod input;
pub mod log;
pub mod math;
pub mod obj;
pub mod sprite;
pub mod sync;
pub mod texture;

#[cfg(windows)]
pub mod framework;
#[cfg(windows)]
pub mod gfx;

pub use config::{parse_args, Config};
pub use error::{Error, Result};
