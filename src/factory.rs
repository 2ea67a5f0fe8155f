//! Builders that turn part specs into scene nodes.

use std::sync::Arc;

use log::debug;

use crate::error::{ConfigError, SceneError};
use crate::geometry::Geometry;
use crate::material::Material;
use crate::part::{GeometryKind, PartSpec};
use crate::scene::{Mesh, SceneNode};
use crate::texture::TextureLoader;

/// Maps [`PartSpec`]s to mesh nodes.
///
/// Builders have no side effect besides allocating the node and asking the
/// loader for the part's textures. The returned node carries an identity
/// transform; placing it is up to the caller.
pub struct PartFactory<'a> {
    loader: &'a dyn TextureLoader,
}

impl<'a> PartFactory<'a> {
    pub fn new(loader: &'a dyn TextureLoader) -> Self {
        Self { loader }
    }

    /// Builds `spec` with the builder matching its geometry kind.
    pub fn build(&self, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        match spec.geometry_kind {
            GeometryKind::Sphere => self.build_sphere(spec),
            GeometryKind::Cylinder => self.build_cylinder(spec),
            GeometryKind::Cone => self.build_cone(spec),
            GeometryKind::Box => self.build_box(spec),
            GeometryKind::Plane => self.build_plane(spec),
        }
    }

    pub fn build_sphere(&self, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        self.build_mesh(GeometryKind::Sphere, spec)
    }

    pub fn build_cylinder(&self, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        self.build_mesh(GeometryKind::Cylinder, spec)
    }

    pub fn build_cone(&self, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        self.build_mesh(GeometryKind::Cone, spec)
    }

    pub fn build_box(&self, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        self.build_mesh(GeometryKind::Box, spec)
    }

    /// Plane textures resolve asynchronously; the mesh is returned with
    /// pending slots.
    pub fn build_plane(&self, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        self.build_mesh(GeometryKind::Plane, spec)
    }

    fn build_mesh(&self, builder: GeometryKind, spec: &PartSpec) -> Result<SceneNode, SceneError> {
        let invalid = |source| SceneError::config(&spec.name, source);
        if spec.geometry_kind != builder {
            return Err(invalid(ConfigError::WrongBuilder {
                builder: builder.name(),
                kind: spec.geometry_kind.name(),
            }));
        }

        let geometry =
            Geometry::from_params(spec.geometry_kind, &spec.geometry_params).map_err(invalid)?;
        let material = Material::from_params(spec.material_kind, &spec.material_params, self.loader)
            .map_err(invalid)?;
        let data = geometry.tessellate();
        debug!(
            "built {} `{}`: {} vertices, {} triangles",
            builder.name(),
            spec.name,
            data.vertices.len(),
            data.triangle_count()
        );

        Ok(SceneNode::mesh(
            spec.name.clone(),
            Mesh {
                geometry,
                data: Arc::new(data),
                material,
                casts_shadow: spec.casts_shadow,
                receives_shadow: spec.receives_shadow,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::part::{GeometryParams, MaterialKind, MaterialParams};
    use crate::texture::{TextureSlot, TextureState};

    struct PendingLoader;

    impl TextureLoader for PendingLoader {
        fn load(&self, reference: &str) -> TextureSlot {
            TextureSlot::new(reference)
        }
    }

    fn thruster() -> PartSpec {
        PartSpec::new(
            "thruster",
            GeometryKind::Cylinder,
            GeometryParams::cylinder(1.0, 1.3, 2.0, 100, 10, false),
            MaterialKind::Standard,
            MaterialParams::new("#676B6F").roughness(0.2).metalness(0.8),
        )
        .at(Vec3::new(0.0, 4.0, 0.0))
        .casts_shadow(true)
    }

    #[test]
    fn builds_mesh_with_identity_transform() {
        let factory = PartFactory::new(&PendingLoader);
        let node = factory.build(&thruster()).unwrap();
        assert_eq!(node.name(), "thruster");
        assert!(node.transform().is_identity());

        let mesh = node.as_mesh().unwrap();
        assert_eq!(mesh.geometry.kind(), GeometryKind::Cylinder);
        assert!(mesh.casts_shadow);
        assert!(!mesh.receives_shadow);
        assert_eq!(mesh.material.metalness, 0.8);
        assert_eq!(node.local_bounds().unwrap().size().y, 2.0);
    }

    #[test]
    fn family_builders_reject_other_kinds() {
        let factory = PartFactory::new(&PendingLoader);
        let err = factory.build_sphere(&thruster()).unwrap_err();
        assert_eq!(
            err.as_config(),
            Some(&ConfigError::WrongBuilder {
                builder: "sphere",
                kind: "cylinder",
            })
        );
    }

    #[test]
    fn plane_returns_pending_textures() {
        let spec = PartSpec::new(
            "plane",
            GeometryKind::Plane,
            GeometryParams::plane(75.0, 75.0),
            MaterialKind::Standard,
            MaterialParams::new("#FFFFFF")
                .map("moon_texture.jpg")
                .normal_map("normal_moon_texture.jpg"),
        )
        .receives_shadow(true);
        let node = PartFactory::new(&PendingLoader).build_plane(&spec).unwrap();
        let material = &node.as_mesh().unwrap().material;
        let states: Vec<_> = material.textures().map(TextureSlot::state).collect();
        assert_eq!(states, vec![TextureState::Unloaded, TextureState::Unloaded]);
        assert_eq!(
            node.local_bounds().unwrap().size(),
            Vec3::new(75.0, 75.0, 0.0)
        );
    }

    #[test]
    fn missing_parameter_names_the_part() {
        let mut spec = thruster();
        spec.geometry_params = spec.geometry_params.without("height");
        let err = PartFactory::new(&PendingLoader).build(&spec).unwrap_err();
        match err {
            SceneError::Configuration { part, source } => {
                assert_eq!(part, "thruster");
                assert_eq!(source, ConfigError::MissingParam("height"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
