//! Caption rasterization: font resolution, pure layout geometry and CPU drawing.

pub mod font;
pub mod layout;
pub mod render;
