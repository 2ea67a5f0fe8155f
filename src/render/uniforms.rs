use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use log::debug;

use crate::camera::PerspectiveCamera;
use crate::material::Material;
use crate::part::{LightKind, MaterialKind};
use crate::scene::PlacedLight;

/// Lights collapsed into what the shader can consume: summed ambient
/// radiance and a single point light.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct SceneLighting {
    pub ambient: Vec3,
    pub point: Option<PointLighting>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PointLighting {
    pub position: Vec3,
    /// Linear color.
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
    pub casts_shadow: bool,
}

impl SceneLighting {
    pub fn from_lights(lights: &[PlacedLight<'_>]) -> Self {
        let mut lighting = Self::default();
        for placed in lights {
            let light = placed.light;
            match light.kind {
                LightKind::Ambient => {
                    lighting.ambient += light.color.to_linear() * light.intensity;
                }
                LightKind::Point if lighting.point.is_none() => {
                    lighting.point = Some(PointLighting {
                        position: placed.position,
                        color: light.color.to_linear(),
                        intensity: light.intensity,
                        distance: light.distance,
                        decay: light.decay,
                        casts_shadow: light.casts_shadow,
                    });
                }
                LightKind::Point => {
                    debug!("only the first point light is shaded; skipping `{}`", placed.name);
                }
            }
        }
        lighting
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_position: [f32; 4],
    light_color: [f32; 4],
    light_params: [f32; 4],
    ambient: [f32; 4],
}

impl GlobalUniform {
    /// `shadow` is the light's view-projection when a shadow map was rendered.
    pub fn new(
        camera: &PerspectiveCamera,
        lighting: &SceneLighting,
        shadow: Option<Mat4>,
        shadow_texel: f32,
    ) -> Self {
        let (light_position, light_color, light_params) = match lighting.point {
            Some(point) => (
                point.position.extend(1.0),
                point.color.extend(point.intensity),
                [
                    point.distance,
                    point.decay,
                    flag(shadow.is_some()),
                    shadow_texel,
                ],
            ),
            None => (Default::default(), Default::default(), [0.0; 4]),
        };
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            light_view_proj: shadow.unwrap_or(Mat4::IDENTITY).to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            light_position: light_position.into(),
            light_color: light_color.into(),
            light_params,
            ambient: lighting.ambient.extend(1.0).into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
    emissive: [f32; 4],
    surface: [f32; 4],
    flags: [f32; 4],
}

/// Which material textures currently have real images bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct BoundMaps {
    pub base: bool,
    pub normal: bool,
}

impl ObjectConstants {
    pub fn new(world: Mat4, material: &Material, receives_shadow: bool, maps: BoundMaps) -> Self {
        let normal = Mat3::from_mat4(world).inverse().transpose();
        Self {
            model: world.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: material.color.to_linear().extend(1.0).into(),
            emissive: material.emissive.to_linear().extend(1.0).into(),
            surface: [
                material.roughness,
                material.metalness,
                material.shininess,
                shading_model(material.kind),
            ],
            flags: [
                flag(maps.base),
                flag(maps.normal),
                flag(receives_shadow),
                0.0,
            ],
        }
    }
}

/// Matches the shading-model constants in the shader.
fn shading_model(kind: MaterialKind) -> f32 {
    match kind {
        MaterialKind::Lambert => 0.0,
        MaterialKind::Phong => 1.0,
        MaterialKind::Standard => 2.0,
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}
