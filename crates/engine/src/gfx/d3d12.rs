pub mod device;

pub mod barrier;
pub mod command;
pub mod pso;
pub mod resource;
pub mod shader;
pub mod util;
pub mod view;
