//! Parametric scene assembly for a lit rocket model, with a wgpu viewer.
//!
//! Parts are described by validated [`PartSpec`]s, built into meshes by the
//! [`PartFactory`] and placed into a [`SceneGraph`] by the
//! [`SceneAssembler`]. The graph is plain data: it can be inspected and
//! tested without a GPU, and is only handed to a [`RenderSurface`] once a
//! window exists.

pub mod app;
pub mod assembler;
pub mod camera;
pub mod color;
pub mod composite;
pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod material;
pub mod orbit;
pub mod part;
pub mod recipe;
pub mod render;
pub mod scene;
pub mod texture;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use assembler::{build_light, SceneAssembler};
pub use camera::PerspectiveCamera;
pub use color::Color;
pub use composite::{leg_placements, leg_spec};
pub use config::ViewerConfig;
pub use error::{AssetLoadError, ConfigError, SceneError};
pub use factory::PartFactory;
pub use geometry::{Aabb, Geometry, MeshData, Vertex};
pub use material::Material;
pub use orbit::{OrbitControls, PointerButton, PointerEvent};
pub use part::{
    CompositeChild, CompositePartSpec, GeometryKind, GeometryParams, LightKind, LightSpec,
    MaterialKind, MaterialParams, PartSpec, RecipeEntry, Side, TextureRefs, Transform,
};
pub use recipe::{rocket_lights, rocket_recipe};
pub use render::Renderer;
pub use scene::{Light, Mesh, NodeContent, SceneGraph, SceneNode};
#[cfg(target_arch = "wasm32")]
pub use texture::FetchTextureLoader;
#[cfg(not(target_arch = "wasm32"))]
pub use texture::FileTextureLoader;
pub use texture::{TextureImage, TextureLoader, TextureSlot, TextureState};
pub use viewport::{RenderSurface, ViewportController};
