//! Composite parts: groups of primitives defined once and instanced by
//! placing the whole group.

use std::f32::consts::{FRAC_PI_4, PI};

use glam::Vec3;
use log::debug;

use crate::error::{ConfigError, SceneError};
use crate::factory::PartFactory;
use crate::part::{
    CompositePartSpec, GeometryKind, GeometryParams, MaterialKind, MaterialParams, PartSpec,
    Transform,
};
use crate::scene::SceneNode;

const LEG_METAL: &str = "#B01D11";
const LEG_TRIM: &str = "#540600";

/// Tilt of the connector brace about X.
pub const LEG_CONNECTOR_TILT: f32 = -PI / 6.0;

impl PartFactory<'_> {
    /// Builds a group node holding every child of `spec` at its offset.
    ///
    /// Children must not carry their own placement; the offset is the only
    /// transform applied to them.
    pub fn build_composite(&self, spec: &CompositePartSpec) -> Result<SceneNode, SceneError> {
        if spec.children.is_empty() {
            return Err(SceneError::config(&spec.name, ConfigError::EmptyComposite));
        }

        let mut group = SceneNode::group(spec.name.clone());
        for child in &spec.children {
            let path = format!("{}/{}", spec.name, child.spec.name);
            if !child.spec.transform().is_identity() {
                return Err(SceneError::config(
                    path,
                    ConfigError::NestedTransform(child.spec.name.clone()),
                ));
            }
            let node = self.build(&child.spec).map_err(|err| match err {
                SceneError::Configuration { source, .. } => SceneError::config(path, source),
                other => other,
            })?;
            group.add_child(node.with_transform(child.offset));
        }
        debug!(
            "built composite `{}` with {} parts",
            spec.name,
            spec.children.len()
        );
        Ok(group)
    }

    /// Builds one rocket leg. Every call yields a fresh subtree.
    pub fn build_leg(&self) -> Result<SceneNode, SceneError> {
        self.build_composite(&leg_spec())
    }
}

/// The fixed leg: foot, strut, tip and an angled connector brace.
pub fn leg_spec() -> CompositePartSpec {
    let metal = || MaterialParams::new(LEG_METAL).roughness(0.2).metalness(1.0);
    let trim = || MaterialParams::new(LEG_TRIM).shininess(0.5);
    let part = |name: &str, kind, params, material_kind, material| {
        PartSpec::new(name, kind, params, material_kind, material).casts_shadow(true)
    };

    CompositePartSpec::new("leg")
        .with_child(
            part(
                "foot",
                GeometryKind::Cylinder,
                GeometryParams::cylinder(0.8, 0.5, 2.0, 100, 1, false),
                MaterialKind::Standard,
                metal(),
            ),
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
        )
        .with_child(
            part(
                "strut",
                GeometryKind::Cylinder,
                GeometryParams::cylinder(0.8, 0.8, 6.0, 100, 1, false),
                MaterialKind::Standard,
                metal(),
            ),
            Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
        )
        .with_child(
            part(
                "tip",
                GeometryKind::Cone,
                GeometryParams::cone(0.8, 2.0, 100, 10, false),
                MaterialKind::Phong,
                trim(),
            ),
            Transform::from_position(Vec3::new(0.0, 9.0, 0.0)),
        )
        .with_child(
            part(
                "connector",
                GeometryKind::Box,
                GeometryParams::cuboid(0.5, 1.5, 4.0),
                MaterialKind::Phong,
                trim(),
            ),
            Transform::new(
                Vec3::new(0.0, 6.5, 1.5),
                Vec3::new(LEG_CONNECTOR_TILT, 0.0, 0.0),
            ),
        )
}

/// Placements of the four legs around the base, a quarter turn apart.
pub fn leg_placements() -> [Transform; 4] {
    let leg = |x: f32, z: f32, quarter_turns: f32| {
        Transform::new(
            Vec3::new(x, 0.0, z),
            Vec3::new(0.0, FRAC_PI_4 + quarter_turns * PI / 2.0, 0.0),
        )
    };
    [
        leg(-4.0, 4.0, 1.0),
        leg(4.0, 4.0, 2.0),
        leg(4.0, -4.0, 3.0),
        leg(-4.0, -4.0, 0.0),
    ]
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::texture::{TextureLoader, TextureSlot};

    struct NoTextures;

    impl TextureLoader for NoTextures {
        fn load(&self, reference: &str) -> TextureSlot {
            panic!("legs have no textures, got {reference}")
        }
    }

    #[test]
    fn legs_are_independent_and_equal() {
        let factory = PartFactory::new(&NoTextures);
        let a = factory.build_leg().unwrap();
        let b = factory.build_leg().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.children().len(), 4);
        assert!(!std::ptr::eq(&a.children()[0], &b.children()[0]));

        let names: Vec<_> = a.children().iter().map(SceneNode::name).collect();
        assert_eq!(names, ["foot", "strut", "tip", "connector"]);
    }

    #[test]
    fn leg_stands_on_the_ground() {
        let leg = PartFactory::new(&NoTextures).build_leg().unwrap();
        let bounds = leg.local_bounds().unwrap();
        assert!(bounds.min.y.abs() < 1e-5);
        assert!((bounds.max.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn placements_have_quarter_turn_symmetry() {
        let placements = leg_placements();
        let quarter = Quat::from_rotation_y(PI / 2.0);
        for k in 0..4 {
            let rotated = quarter * placements[k].position;
            let next = placements[(k + 1) % 4].position;
            assert!(
                (rotated - next).length() < 1e-6,
                "leg {k}: {rotated} vs {next}"
            );
        }
        let yaw: Vec<_> = placements
            .iter()
            .map(|t| t.rotation.y.to_degrees().round())
            .collect();
        assert_eq!(yaw, [135.0, 225.0, 315.0, 45.0]);
    }

    #[test]
    fn rejects_children_with_their_own_placement() {
        let mut spec = leg_spec();
        spec.children[1].spec.position = Vec3::Y;
        let err = PartFactory::new(&NoTextures)
            .build_composite(&spec)
            .unwrap_err();
        match err {
            SceneError::Configuration { part, source } => {
                assert_eq!(part, "leg/strut");
                assert_eq!(source, ConfigError::NestedTransform("strut".into()));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_composites() {
        let err = PartFactory::new(&NoTextures)
            .build_composite(&CompositePartSpec::new("nothing"))
            .unwrap_err();
        assert_eq!(err.as_config(), Some(&ConfigError::EmptyComposite));
    }
}
