use glam::Vec3;
use log::{debug, info};

use crate::color::Color;
use crate::error::{ConfigError, SceneError};
use crate::factory::PartFactory;
use crate::part::{LightKind, LightSpec, RecipeEntry, Transform};
use crate::scene::{Light, SceneGraph, SceneNode};

const DEFAULT_POINT_DECAY: f32 = 2.0;

/// Builds a [`SceneGraph`] from a recipe.
pub struct SceneAssembler<'f, 'l> {
    factory: &'f PartFactory<'l>,
}

impl<'f, 'l> SceneAssembler<'f, 'l> {
    pub fn new(factory: &'f PartFactory<'l>) -> Self {
        Self { factory }
    }

    /// Builds every entry, places it, and appends the lights.
    ///
    /// The graph is only created once everything has been built, so the
    /// first failure aborts without exposing a partial scene.
    pub fn assemble(
        &self,
        recipe: &[RecipeEntry],
        lights: &[LightSpec],
    ) -> Result<SceneGraph, SceneError> {
        let mut children = Vec::with_capacity(recipe.len() + lights.len());
        for entry in recipe {
            let node = match entry {
                RecipeEntry::Part(spec) => self.factory.build(spec)?,
                RecipeEntry::Composite { name, spec, .. } => {
                    let mut node = self.factory.build_composite(spec)?;
                    node.rename(name.clone());
                    node
                }
            };
            children.push(node.with_transform(entry.transform()));
        }
        for spec in lights {
            children.push(build_light(spec)?);
        }

        for child in &children {
            let position = child.transform().position;
            debug!(
                "inserted `{}` ({}) at ({}, {}, {})",
                child.name(),
                child.content().label(),
                position.x,
                position.y,
                position.z
            );
        }
        info!(
            "assembled scene with {} children ({} entries, {} lights)",
            children.len(),
            recipe.len(),
            lights.len()
        );
        Ok(SceneGraph::from_children(children))
    }
}

/// Validates a light spec and turns it into a placed light node.
pub fn build_light(spec: &LightSpec) -> Result<SceneNode, SceneError> {
    let invalid = |source| SceneError::config(&spec.name, source);
    let unsupported = |property| {
        invalid(ConfigError::UnsupportedLightProperty {
            kind: spec.kind.name(),
            property,
        })
    };

    let color = Color::from_hex(&spec.color).map_err(invalid)?;
    non_negative("intensity", spec.intensity).map_err(invalid)?;

    let (position, distance, decay) = match spec.kind {
        LightKind::Ambient => {
            let placed = [
                ("position", spec.position.is_some()),
                ("distance", spec.distance.is_some()),
                ("decay", spec.decay.is_some()),
                ("casts_shadow", spec.casts_shadow),
            ];
            if let Some((property, _)) = placed.iter().find(|(_, set)| *set) {
                return Err(unsupported(*property));
            }
            (Vec3::ZERO, 0.0, 0.0)
        }
        LightKind::Point => {
            let distance = spec.distance.unwrap_or(0.0);
            let decay = spec.decay.unwrap_or(DEFAULT_POINT_DECAY);
            non_negative("distance", distance).map_err(invalid)?;
            non_negative("decay", decay).map_err(invalid)?;
            (spec.position.unwrap_or_default(), distance, decay)
        }
    };

    let light = Light {
        kind: spec.kind,
        color,
        intensity: spec.intensity,
        distance,
        decay,
        casts_shadow: spec.casts_shadow,
    };
    Ok(SceneNode::light(spec.name.clone(), light).with_transform(Transform::from_position(position)))
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidLightParam {
            name,
            expected: "must be a non-negative number",
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_defaults() {
        let node = build_light(&LightSpec::point("sun", "#FFFFFF", 1.0)).unwrap();
        let light = node.as_light().unwrap();
        assert_eq!(light.distance, 0.0);
        assert_eq!(light.decay, 2.0);
        assert!(node.transform().is_identity());
    }

    #[test]
    fn point_light_is_placed_by_its_node() {
        let spec = LightSpec::point("sun", "#FFFFFF", 1.0)
            .at(Vec3::splat(100.0))
            .distance(1000.0)
            .decay(0.0)
            .casts_shadow(true);
        let node = build_light(&spec).unwrap();
        assert_eq!(node.transform().position, Vec3::splat(100.0));
        assert!(node.as_light().unwrap().casts_shadow);
    }

    #[test]
    fn ambient_lights_reject_placement() {
        let spec = LightSpec::ambient("fill", "#FFFFFF", 0.2).at(Vec3::ONE);
        assert_eq!(
            build_light(&spec).unwrap_err().as_config(),
            Some(&ConfigError::UnsupportedLightProperty {
                kind: "ambient",
                property: "position",
            })
        );
        let shadowed = LightSpec::ambient("fill", "#FFFFFF", 0.2).casts_shadow(true);
        assert!(build_light(&shadowed).is_err());
    }

    #[test]
    fn light_values_are_validated() {
        assert!(build_light(&LightSpec::point("sun", "#FFFFFF", -1.0)).is_err());
        assert!(build_light(&LightSpec::point("sun", "FFFFFF", 1.0)).is_err());
        let far = LightSpec::point("sun", "#FFFFFF", 1.0).distance(f32::NAN);
        assert!(matches!(
            build_light(&far).unwrap_err().as_config(),
            Some(ConfigError::InvalidLightParam {
                name: "distance",
                ..
            })
        ));
    }
}
