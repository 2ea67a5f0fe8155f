use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::color::Color;
use crate::geometry::{Aabb, Geometry, MeshData};
use crate::material::Material;
use crate::part::{LightKind, Transform};
use crate::texture::TextureSlot;

/// Renderable surface attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub data: Arc<MeshData>,
    pub material: Material,
    pub casts_shadow: bool,
    pub receives_shadow: bool,
}

/// Validated light attached to a node. The node transform places it.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    /// Range of a point light; zero means unlimited.
    pub distance: f32,
    pub decay: f32,
    pub casts_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Group,
    Mesh(Mesh),
    Light(Light),
}

impl NodeContent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Mesh(mesh) => mesh.geometry.kind().name(),
            Self::Light(light) => light.kind.name(),
        }
    }
}

/// Node of the scene tree.
///
/// Children are moved into their parent, so a node always has exactly one
/// owner. Equality is structural: two independently built subtrees with the
/// same parts compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    name: String,
    transform: Transform,
    content: NodeContent,
    children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeContent::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(name, NodeContent::Mesh(mesh))
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeContent::Light(light))
    }

    fn new(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            content,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.content {
            NodeContent::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// Takes ownership of `child`.
    ///
    /// # Panics
    ///
    /// Only group nodes can hold children.
    pub fn add_child(&mut self, child: SceneNode) {
        assert!(
            matches!(self.content, NodeContent::Group),
            "cannot attach `{}` to {} node `{}`",
            child.name,
            self.content.label(),
            self.name
        );
        self.children.push(child);
    }

    /// Bounds of every mesh in this subtree, in this node's local space.
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.bounds_in(&Mat4::IDENTITY)
    }

    fn bounds_in(&self, space: &Mat4) -> Option<Aabb> {
        let own = self
            .as_mesh()
            .map(|mesh| mesh.data.bounds().transformed(space));
        self.children
            .iter()
            .filter_map(|child| child.bounds_in(&(*space * child.transform.matrix())))
            .chain(own)
            .reduce(|a, b| a.union(&b))
    }

    fn walk<'a>(&'a self, parent: &Mat4, visit: &mut dyn FnMut(&'a SceneNode, Mat4)) {
        let world = *parent * self.transform.matrix();
        visit(self, world);
        for child in &self.children {
            child.walk(&world, visit);
        }
    }
}

/// Mesh with its world matrix, ready for drawing.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub name: &'a str,
    pub world: Mat4,
    pub mesh: &'a Mesh,
}

/// Light with its world position.
#[derive(Debug, Clone, Copy)]
pub struct PlacedLight<'a> {
    pub name: &'a str,
    pub position: Vec3,
    pub light: &'a Light,
}

/// Root of an assembled scene. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    root: SceneNode,
}

impl SceneGraph {
    pub(crate) fn from_children(children: Vec<SceneNode>) -> Self {
        let mut root = SceneNode::group("scene");
        for child in children {
            root.add_child(child);
        }
        Self { root }
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn children(&self) -> &[SceneNode] {
        self.root.children()
    }

    pub fn child(&self, name: &str) -> Option<&SceneNode> {
        self.children().iter().find(|child| child.name() == name)
    }

    /// Every mesh in depth-first declaration order.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        self.root.walk(&Mat4::IDENTITY, &mut |node, world| {
            if let NodeContent::Mesh(mesh) = &node.content {
                items.push(DrawItem {
                    name: &node.name,
                    world,
                    mesh,
                });
            }
        });
        items
    }

    pub fn lights(&self) -> Vec<PlacedLight<'_>> {
        let mut lights = Vec::new();
        self.root.walk(&Mat4::IDENTITY, &mut |node, world| {
            if let NodeContent::Light(light) = &node.content {
                lights.push(PlacedLight {
                    name: &node.name,
                    position: world.transform_point3(Vec3::ZERO),
                    light,
                });
            }
        });
        lights
    }

    /// Every texture slot referenced by a material in the scene.
    pub fn texture_slots(&self) -> Vec<&TextureSlot> {
        let mut slots = Vec::new();
        self.root.walk(&Mat4::IDENTITY, &mut |node, _| {
            if let NodeContent::Mesh(mesh) = &node.content {
                slots.extend(mesh.material.textures());
            }
        });
        slots
    }

    /// World-space bounds of every mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.local_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{GeometryKind, GeometryParams, MaterialKind};

    fn cube(name: &str) -> SceneNode {
        let geometry =
            Geometry::from_params(GeometryKind::Box, &GeometryParams::cuboid(1.0, 1.0, 1.0))
                .unwrap();
        let material = Material {
            kind: MaterialKind::Phong,
            color: Color::WHITE,
            emissive: Color::BLACK,
            wireframe: false,
            roughness: 1.0,
            metalness: 0.0,
            shininess: 30.0,
            side: Default::default(),
            map: None,
            normal_map: None,
        };
        SceneNode::mesh(
            name,
            Mesh {
                geometry,
                data: Arc::new(geometry.tessellate()),
                material,
                casts_shadow: true,
                receives_shadow: false,
            },
        )
    }

    #[test]
    fn world_matrices_compose_parent_first() {
        let mut group = SceneNode::group("leg")
            .with_transform(Transform::from_position(Vec3::new(4.0, 0.0, 0.0)));
        group.add_child(cube("foot").with_transform(Transform::from_position(Vec3::Y)));
        let scene = SceneGraph::from_children(vec![group, cube("loose")]);

        let items = scene.draw_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "foot");
        assert_eq!(
            items[0].world.transform_point3(Vec3::ZERO),
            Vec3::new(4.0, 1.0, 0.0)
        );
        assert_eq!(items[1].world, Mat4::IDENTITY);
    }

    #[test]
    fn bounds_include_child_transforms() {
        let mut group = SceneNode::group("stack");
        group.add_child(cube("low"));
        group.add_child(cube("high").with_transform(Transform::from_position(Vec3::Y * 2.0)));
        let bounds = group.local_bounds().unwrap();
        assert_eq!(bounds.size(), Vec3::new(1.0, 3.0, 1.0));
        assert!(SceneNode::group("empty").local_bounds().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot attach")]
    fn meshes_cannot_own_children() {
        let mut mesh = cube("body");
        mesh.add_child(cube("window"));
    }
}
