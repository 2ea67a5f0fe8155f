//! Declarative part recipes.
//!
//! Everything in this module is plain data: a recipe is written once at
//! startup, handed to the [`PartFactory`](crate::factory::PartFactory) and
//! never mutated afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Geometry family of a primitive part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Sphere,
    Cylinder,
    Cone,
    Box,
    Plane,
}

impl GeometryKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Box => "box",
            Self::Plane => "plane",
        }
    }

    /// Parameter keys a spec of this kind must provide, and nothing else.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Self::Sphere => &["radius", "width_segments", "height_segments"],
            Self::Cylinder => &[
                "top_radius",
                "bottom_radius",
                "height",
                "radial_segments",
                "height_segments",
                "open_ended",
            ],
            Self::Cone => &[
                "radius",
                "height",
                "radial_segments",
                "height_segments",
                "open_ended",
            ],
            Self::Box => &["width", "height", "depth"],
            Self::Plane => &["width", "height"],
        }
    }
}

/// Named numeric geometry parameters.
///
/// The typed constructors fill in exactly the keys required by their
/// geometry kind; [`with`](Self::with) and [`without`](Self::without) are
/// available for hand-written or deliberately broken recipes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryParams(BTreeMap<String, f32>);

impl GeometryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f32) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.0.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::new()
            .with("radius", radius)
            .with("width_segments", width_segments as f32)
            .with("height_segments", height_segments as f32)
    }

    pub fn cylinder(
        top_radius: f32,
        bottom_radius: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    ) -> Self {
        Self::new()
            .with("top_radius", top_radius)
            .with("bottom_radius", bottom_radius)
            .with("height", height)
            .with("radial_segments", radial_segments as f32)
            .with("height_segments", height_segments as f32)
            .with("open_ended", flag(open_ended))
    }

    pub fn cone(
        radius: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    ) -> Self {
        Self::new()
            .with("radius", radius)
            .with("height", height)
            .with("radial_segments", radial_segments as f32)
            .with("height_segments", height_segments as f32)
            .with("open_ended", flag(open_ended))
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::new()
            .with("width", width)
            .with("height", height)
            .with("depth", depth)
    }

    pub fn plane(width: f32, height: f32) -> Self {
        Self::new().with("width", width).with("height", height)
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Shading model of a part's material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Standard,
    Lambert,
    Phong,
}

impl MaterialKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Lambert => "lambert",
            Self::Phong => "phong",
        }
    }
}

/// Which faces of a mesh are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Opaque asset references resolved by a [`TextureLoader`](crate::texture::TextureLoader).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextureRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<String>,
}

/// Unvalidated material parameters. Colors are kept as written so that
/// malformed values are reported instead of silently normalized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialParams {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wireframe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metalness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shininess: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_refs: Option<TextureRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

impl MaterialParams {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            ..Self::default()
        }
    }

    pub fn emissive(mut self, color: impl Into<String>) -> Self {
        self.emissive = Some(color.into());
        self
    }

    pub fn wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = Some(wireframe);
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = Some(roughness);
        self
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = Some(metalness);
        self
    }

    pub fn shininess(mut self, shininess: f32) -> Self {
        self.shininess = Some(shininess);
        self
    }

    pub fn map(mut self, reference: impl Into<String>) -> Self {
        self.texture_refs.get_or_insert_with(TextureRefs::default).map = Some(reference.into());
        self
    }

    pub fn normal_map(mut self, reference: impl Into<String>) -> Self {
        self.texture_refs
            .get_or_insert_with(TextureRefs::default)
            .normal_map = Some(reference.into());
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }
}

/// Local placement of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
    };

    pub const fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z);
        Mat4::from_translation(self.position) * rotation
    }
}

/// Immutable description of a single renderable part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub name: String,
    pub geometry_kind: GeometryKind,
    pub geometry_params: GeometryParams,
    pub material_kind: MaterialKind,
    pub material_params: MaterialParams,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default)]
    pub casts_shadow: bool,
    #[serde(default)]
    pub receives_shadow: bool,
}

impl PartSpec {
    pub fn new(
        name: impl Into<String>,
        geometry_kind: GeometryKind,
        geometry_params: GeometryParams,
        material_kind: MaterialKind,
        material_params: MaterialParams,
    ) -> Self {
        Self {
            name: name.into(),
            geometry_kind,
            geometry_params,
            material_kind,
            material_params,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            casts_shadow: false,
            receives_shadow: false,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn casts_shadow(mut self, casts: bool) -> Self {
        self.casts_shadow = casts;
        self
    }

    pub fn receives_shadow(mut self, receives: bool) -> Self {
        self.receives_shadow = receives;
        self
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }
}

/// One child of a composite, placed relative to the composite's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeChild {
    pub spec: PartSpec,
    pub offset: Transform,
}

/// A group of primitive parts that is defined once and instanced by
/// placing the whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositePartSpec {
    pub name: String,
    pub children: Vec<CompositeChild>,
}

impl CompositePartSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, spec: PartSpec, offset: Transform) -> Self {
        self.children.push(CompositeChild { spec, offset });
        self
    }
}

/// An entry of an assembly recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecipeEntry {
    Part(PartSpec),
    Composite {
        name: String,
        spec: Arc<CompositePartSpec>,
        transform: Transform,
    },
}

impl RecipeEntry {
    pub fn composite(
        name: impl Into<String>,
        spec: &Arc<CompositePartSpec>,
        transform: Transform,
    ) -> Self {
        Self::Composite {
            name: name.into(),
            spec: Arc::clone(spec),
            transform,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Part(spec) => &spec.name,
            Self::Composite { name, .. } => name,
        }
    }

    pub fn transform(&self) -> Transform {
        match self {
            Self::Part(spec) => spec.transform(),
            Self::Composite { transform, .. } => *transform,
        }
    }
}

impl From<PartSpec> for RecipeEntry {
    fn from(spec: PartSpec) -> Self {
        Self::Part(spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    Point,
    Ambient,
}

impl LightKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Ambient => "ambient",
        }
    }
}

/// Immutable description of a light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    pub name: String,
    pub kind: LightKind,
    pub color: String,
    pub intensity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay: Option<f32>,
    #[serde(default)]
    pub casts_shadow: bool,
}

impl LightSpec {
    pub fn point(name: impl Into<String>, color: impl Into<String>, intensity: f32) -> Self {
        Self::new(name, LightKind::Point, color, intensity)
    }

    pub fn ambient(name: impl Into<String>, color: impl Into<String>, intensity: f32) -> Self {
        Self::new(name, LightKind::Ambient, color, intensity)
    }

    fn new(
        name: impl Into<String>,
        kind: LightKind,
        color: impl Into<String>,
        intensity: f32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            color: color.into(),
            intensity,
            position: None,
            distance: None,
            decay: None,
            casts_shadow: false,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn decay(mut self, decay: f32) -> Self {
        self.decay = Some(decay);
        self
    }

    pub fn casts_shadow(mut self, casts: bool) -> Self {
        self.casts_shadow = casts;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn typed_constructors_provide_required_keys() {
        let cases = [
            (GeometryKind::Sphere, GeometryParams::sphere(1.0, 10, 10)),
            (
                GeometryKind::Cylinder,
                GeometryParams::cylinder(1.0, 1.3, 2.0, 100, 10, false),
            ),
            (GeometryKind::Cone, GeometryParams::cone(2.0, 4.5, 100, 5, false)),
            (GeometryKind::Box, GeometryParams::cuboid(0.5, 1.5, 4.0)),
            (GeometryKind::Plane, GeometryParams::plane(75.0, 75.0)),
        ];
        for (kind, params) in cases {
            let mut keys: Vec<&str> = params.keys().collect();
            let mut required = kind.required_params().to_vec();
            keys.sort_unstable();
            required.sort_unstable();
            assert_eq!(keys, required, "{}", kind.name());
        }
    }

    #[test]
    fn without_removes_a_key() {
        let params = GeometryParams::cylinder(1.0, 1.3, 2.0, 100, 10, false).without("height");
        assert_eq!(params.get("height"), None);
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn transform_matrix_translates_then_rotates() {
        let transform = Transform::new(Vec3::new(0.0, 6.5, 1.5), Vec3::new(FRAC_PI_2, 0.0, 0.0));
        let point = transform.matrix().transform_point3(Vec3::Y);
        assert!((point - Vec3::new(0.0, 6.5, 2.5)).length() < 1e-6);
        assert!(Transform::IDENTITY.is_identity());
        assert!(!transform.is_identity());
    }

    #[test]
    fn material_builders_collect_texture_refs() {
        let params = MaterialParams::new("#FFFFFF")
            .map("moon.jpg")
            .normal_map("moon_normal.jpg");
        let refs = params.texture_refs.unwrap();
        assert_eq!(refs.map.as_deref(), Some("moon.jpg"));
        assert_eq!(refs.normal_map.as_deref(), Some("moon_normal.jpg"));
    }
}
