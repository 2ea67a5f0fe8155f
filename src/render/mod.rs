//! wgpu backend for the scene viewer.

mod renderer;
mod shadow;
mod textures;
mod uniforms;

pub use renderer::Renderer;
