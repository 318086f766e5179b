//! Thin wrappers over SDL2 and OpenGL: window and context setup, shaders,
//! meshes, textures and offscreen framebuffers.

pub mod app;
pub mod framebuffer;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use app::*;
pub use framebuffer::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
