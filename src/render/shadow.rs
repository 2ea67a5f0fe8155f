use glam::{Mat4, Vec3};

use crate::geometry::Aabb;

pub(crate) const SHADOW_MAP_SIZE: u32 = 2048;
pub(crate) const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const MIN_NEAR: f32 = 0.1;
const MAX_FOV: f32 = 170.0;
const FIT_MARGIN: f32 = 1.02;

/// Perspective frustum from a point light that encloses `bounds`.
pub(crate) fn light_view_projection(light: Vec3, bounds: &Aabb) -> Mat4 {
    let center = bounds.center();
    let radius = (bounds.size().length() * 0.5 * FIT_MARGIN).max(MIN_NEAR);
    let to_center = center - light;
    let distance = to_center.length();

    let up = if to_center.normalize_or_zero().dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(light, center, up);

    let (fov, near) = if distance > radius {
        (2.0 * (radius / distance).asin(), (distance - radius).max(MIN_NEAR))
    } else {
        (MAX_FOV.to_radians(), MIN_NEAR)
    };
    let far = distance + radius;
    Mat4::perspective_rh(fov.min(MAX_FOV.to_radians()), 1.0, near, far) * view
}

/// Depth target rendered from the shadow-casting light.
pub(crate) struct ShadowMap {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl ShadowMap {
    pub fn create(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow-map"),
            size: wgpu::Extent3d {
                width: SHADOW_MAP_SIZE,
                height: SHADOW_MAP_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        Self {
            _texture: texture,
            view,
            sampler,
        }
    }

    pub fn texel_size() -> f32 {
        1.0 / SHADOW_MAP_SIZE as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners(bounds: &Aabb) -> impl Iterator<Item = Vec3> + '_ {
        (0..8).map(move |i| {
            Vec3::new(
                if i & 1 == 0 { bounds.min.x } else { bounds.max.x },
                if i & 2 == 0 { bounds.min.y } else { bounds.max.y },
                if i & 4 == 0 { bounds.min.z } else { bounds.max.z },
            )
        })
    }

    #[test]
    fn frustum_encloses_the_scene() {
        let bounds = Aabb {
            min: Vec3::new(-37.5, 0.0, -37.5),
            max: Vec3::new(37.5, 20.5, 37.5),
        };
        let view_proj = light_view_projection(Vec3::splat(100.0), &bounds);
        for corner in corners(&bounds) {
            let ndc = view_proj.project_point3(corner);
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{corner} -> {ndc}");
            assert!((0.0..=1.0).contains(&ndc.z), "{corner} -> {ndc}");
        }
    }

    #[test]
    fn overhead_light_uses_a_stable_up_vector() {
        let bounds = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let view_proj = light_view_projection(Vec3::new(0.0, 50.0, 0.0), &bounds);
        assert!(view_proj.is_finite());
    }
}
