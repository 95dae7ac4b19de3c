//! CPU frame buffers and premultiplied compositing.

pub mod composite;
pub mod frame;
