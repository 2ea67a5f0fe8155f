//! The compiled-in rocket scene.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;

use crate::composite::{leg_placements, leg_spec};
use crate::part::{
    GeometryKind, GeometryParams, LightSpec, MaterialKind, MaterialParams, PartSpec, RecipeEntry,
    Side,
};

pub const MOON_TEXTURE: &str = "moon_texture.jpg";
pub const MOON_NORMAL_TEXTURE: &str = "normal_moon_texture.jpg";

const HULL: &str = "#FFFFFF";

/// Parts of the rocket and its landing pad, in insertion order.
pub fn rocket_recipe() -> Vec<RecipeEntry> {
    let hull = || MaterialParams::new(HULL).roughness(0.2).metalness(0.5);
    let cylinder = |name: &str, top: f32, bottom: f32, height: f32, y: f32| {
        PartSpec::new(
            name,
            GeometryKind::Cylinder,
            GeometryParams::cylinder(top, bottom, height, 100, 10, false),
            MaterialKind::Standard,
            hull(),
        )
        .at(Vec3::new(0.0, y, 0.0))
        .casts_shadow(true)
    };

    let mut recipe: Vec<RecipeEntry> = vec![
        PartSpec::new(
            "plane",
            GeometryKind::Plane,
            GeometryParams::plane(75.0, 75.0),
            MaterialKind::Standard,
            MaterialParams::new("#FFFFFF")
                .map(MOON_TEXTURE)
                .normal_map(MOON_NORMAL_TEXTURE)
                .side(Side::Double),
        )
        .rotated(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
        .receives_shadow(true)
        .into(),
        PartSpec::new(
            "fire",
            GeometryKind::Sphere,
            GeometryParams::sphere(1.0, 10, 10),
            MaterialKind::Standard,
            MaterialParams::new("#FDCF19")
                .wireframe(true)
                .emissive("#DB1D1D"),
        )
        .at(Vec3::new(0.0, 3.0, 0.0))
        .casts_shadow(true)
        .into(),
        PartSpec::new(
            "thruster",
            GeometryKind::Cylinder,
            GeometryParams::cylinder(1.0, 1.3, 2.0, 100, 10, false),
            MaterialKind::Standard,
            MaterialParams::new("#676B6F").roughness(0.2).metalness(0.8),
        )
        .at(Vec3::new(0.0, 4.0, 0.0))
        .casts_shadow(true)
        .into(),
        cylinder("tail", 3.0, 2.0, 2.0, 6.0).into(),
        cylinder("body", 3.0, 3.0, 6.0, 10.0).into(),
        cylinder("head", 2.0, 3.0, 3.0, 14.5).into(),
        PartSpec::new(
            "window",
            GeometryKind::Sphere,
            GeometryParams::sphere(1.5, 20, 20),
            MaterialKind::Lambert,
            MaterialParams::new("#004E8A").emissive("#553300"),
        )
        .at(Vec3::new(2.0, 11.0, 0.0))
        .casts_shadow(true)
        .into(),
        PartSpec::new(
            "nose",
            GeometryKind::Cone,
            GeometryParams::cone(2.0, 4.5, 100, 5, false),
            MaterialKind::Phong,
            MaterialParams::new("#BD1D11").shininess(50.0),
        )
        .at(Vec3::new(0.0, 18.25, 0.0))
        .casts_shadow(true)
        .into(),
    ];

    let leg = Arc::new(leg_spec());
    for (index, placement) in leg_placements().into_iter().enumerate() {
        recipe.push(RecipeEntry::composite(
            format!("leg{}", index + 1),
            &leg,
            placement,
        ));
    }
    recipe
}

/// Key light with shadows plus a dim ambient fill.
pub fn rocket_lights() -> Vec<LightSpec> {
    vec![
        LightSpec::point("point_light", "#FFFFFF", 1.0)
            .at(Vec3::splat(100.0))
            .distance(1000.0)
            .decay(0.0)
            .casts_shadow(true),
        LightSpec::ambient("ambient_light", "#FFFFFF", 0.2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_lists_parts_then_legs() {
        let names: Vec<_> = rocket_recipe()
            .iter()
            .map(|entry| entry.name().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "plane", "fire", "thruster", "tail", "body", "head", "window", "nose", "leg1",
                "leg2", "leg3", "leg4"
            ]
        );
    }

    #[test]
    fn only_the_plane_receives_shadows() {
        for entry in rocket_recipe() {
            if let RecipeEntry::Part(spec) = entry {
                assert_eq!(spec.receives_shadow, spec.name == "plane", "{}", spec.name);
                assert_eq!(spec.casts_shadow, spec.name != "plane", "{}", spec.name);
            }
        }
    }

    fn segments(spec: &PartSpec) -> (f32, f32) {
        let params = &spec.geometry_params;
        let radial = params
            .get("radial_segments")
            .or_else(|| params.get("width_segments"))
            .unwrap_or(0.0);
        let height = params.get("height_segments").unwrap_or(0.0);
        (radial, height)
    }

    #[test]
    fn parts_use_the_model_tessellation() {
        let expected = [
            ("fire", (10.0, 10.0)),
            ("thruster", (100.0, 10.0)),
            ("tail", (100.0, 10.0)),
            ("body", (100.0, 10.0)),
            ("head", (100.0, 10.0)),
            ("window", (20.0, 20.0)),
            ("nose", (100.0, 5.0)),
        ];
        let recipe = rocket_recipe();
        for (name, counts) in expected {
            let spec = recipe
                .iter()
                .find_map(|entry| match entry {
                    RecipeEntry::Part(spec) if spec.name == name => Some(spec),
                    _ => None,
                })
                .unwrap();
            assert_eq!(segments(spec), counts, "{name}");
        }

        let leg = leg_spec();
        let leg_counts: Vec<_> = leg
            .children
            .iter()
            .filter(|child| child.spec.geometry_kind != GeometryKind::Box)
            .map(|child| (child.spec.name.as_str(), segments(&child.spec)))
            .collect();
        assert_eq!(
            leg_counts,
            [
                ("foot", (100.0, 1.0)),
                ("strut", (100.0, 1.0)),
                ("tip", (100.0, 10.0)),
            ]
        );
    }

    #[test]
    fn legs_share_one_definition() {
        let recipe = rocket_recipe();
        let specs: Vec<_> = recipe
            .iter()
            .filter_map(|entry| match entry {
                RecipeEntry::Composite { spec, .. } => Some(spec),
                RecipeEntry::Part(_) => None,
            })
            .collect();
        assert_eq!(specs.len(), 4);
        assert!(specs.windows(2).all(|pair| Arc::ptr_eq(pair[0], pair[1])));
    }
}
