pub mod d3d12;

pub mod model;
pub mod sprite;
pub mod texture_manager;
