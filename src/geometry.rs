use std::collections::HashSet;
use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::error::ConfigError;
use crate::part::{GeometryKind, GeometryParams};

/// Interleaved vertex layout shared with the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Tangent direction plus bitangent handedness in `w`.
    pub tangent: [f32; 4],
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
            tangent: [0.0; 4],
        }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    /// Line-list indices covering every unique triangle edge once.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.extend_from_slice(&[a, b]);
                }
            }
        }
        edges
    }

    fn push(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    /// Derives per-vertex tangents from positions and texture coordinates.
    ///
    /// Texture coordinates grow downwards (row zero is the top of the image),
    /// so the stored handedness makes `cross(normal, tangent) * w` point
    /// towards the top of the image.
    fn compute_tangents(&mut self) {
        let count = self.vertices.len();
        let mut tangents = vec![Vec3::ZERO; count];
        let mut bitangents = vec![Vec3::ZERO; count];

        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let (v0, v1, v2) = (&self.vertices[i0], &self.vertices[i1], &self.vertices[i2]);
            let e1 = Vec3::from(v1.position) - Vec3::from(v0.position);
            let e2 = Vec3::from(v2.position) - Vec3::from(v0.position);
            let d1 = Vec2::from(v1.uv) - Vec2::from(v0.uv);
            let d2 = Vec2::from(v2.uv) - Vec2::from(v0.uv);
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let sdir = (e1 * d2.y - e2 * d1.y) * r;
            let tdir = (e2 * d1.x - e1 * d2.x) * r;
            for i in [i0, i1, i2] {
                tangents[i] += sdir;
                bitangents[i] -= tdir;
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            let normal = Vec3::from(vertex.normal);
            let tangent = (tangents[i] - normal * normal.dot(tangents[i])).normalize_or_zero();
            let tangent = if tangent == Vec3::ZERO {
                normal.any_orthonormal_vector()
            } else {
                tangent
            };
            let handedness = if normal.cross(tangent).dot(bitangents[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            vertex.tangent = tangent.extend(handedness).into();
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for point in points {
            min = min.min(point);
            max = max.max(point);
        }
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let corners = (0..8).map(|i| {
            let pick = |bit: usize, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
            matrix.transform_point3(Vec3::new(
                pick(1, self.min.x, self.max.x),
                pick(2, self.min.y, self.max.y),
                pick(4, self.min.z, self.max.z),
            ))
        });
        Aabb::from_points(corners)
    }
}

/// Validated geometry parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cylinder {
        top_radius: f32,
        bottom_radius: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    },
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Plane {
        width: f32,
        height: f32,
    },
}

impl Geometry {
    /// Validates `params` against the exact key set of `kind`.
    pub fn from_params(kind: GeometryKind, params: &GeometryParams) -> Result<Self, ConfigError> {
        let required = kind.required_params();
        if let Some(extra) = params.keys().find(|key| !required.contains(key)) {
            return Err(ConfigError::UnexpectedParam(extra.to_string()));
        }
        let reader = ParamReader { params };

        let geometry = match kind {
            GeometryKind::Sphere => {
                let radius = reader.extent("radius")?;
                let width_segments = reader.segments("width_segments", 3)?;
                let height_segments = reader.segments("height_segments", 2)?;
                check_vertex_budget(grid_vertices(width_segments, height_segments))?;
                Self::Sphere {
                    radius,
                    width_segments,
                    height_segments,
                }
            }
            GeometryKind::Cylinder => {
                let top_radius = reader.radius("top_radius")?;
                let bottom_radius = reader.radius("bottom_radius")?;
                let height = reader.extent("height")?;
                let radial_segments = reader.segments("radial_segments", 3)?;
                let height_segments = reader.segments("height_segments", 1)?;
                let open_ended = reader.flag("open_ended")?;
                if top_radius == 0.0 && bottom_radius == 0.0 {
                    return Err(ConfigError::InvalidParam {
                        name: "top_radius",
                        expected: "must be positive when bottom_radius is 0",
                        value: top_radius,
                    });
                }
                check_vertex_budget(
                    grid_vertices(radial_segments, height_segments)
                        + 2 * cap_vertices(radial_segments),
                )?;
                Self::Cylinder {
                    top_radius,
                    bottom_radius,
                    height,
                    radial_segments,
                    height_segments,
                    open_ended,
                }
            }
            GeometryKind::Cone => {
                let radius = reader.extent("radius")?;
                let height = reader.extent("height")?;
                let radial_segments = reader.segments("radial_segments", 3)?;
                let height_segments = reader.segments("height_segments", 1)?;
                let open_ended = reader.flag("open_ended")?;
                check_vertex_budget(
                    grid_vertices(radial_segments, height_segments) + cap_vertices(radial_segments),
                )?;
                Self::Cone {
                    radius,
                    height,
                    radial_segments,
                    height_segments,
                    open_ended,
                }
            }
            GeometryKind::Box => Self::Box {
                width: reader.extent("width")?,
                height: reader.extent("height")?,
                depth: reader.extent("depth")?,
            },
            GeometryKind::Plane => Self::Plane {
                width: reader.extent("width")?,
                height: reader.extent("height")?,
            },
        };
        Ok(geometry)
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Sphere { .. } => GeometryKind::Sphere,
            Self::Cylinder { .. } => GeometryKind::Cylinder,
            Self::Cone { .. } => GeometryKind::Cone,
            Self::Box { .. } => GeometryKind::Box,
            Self::Plane { .. } => GeometryKind::Plane,
        }
    }

    pub fn tessellate(&self) -> MeshData {
        let mut mesh = match *self {
            Self::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
            Self::Cylinder {
                top_radius,
                bottom_radius,
                height,
                radial_segments,
                height_segments,
                open_ended,
            } => cylinder(
                top_radius,
                bottom_radius,
                height,
                radial_segments,
                height_segments,
                open_ended,
            ),
            Self::Cone {
                radius,
                height,
                radial_segments,
                height_segments,
                open_ended,
            } => cylinder(
                0.0,
                radius,
                height,
                radial_segments,
                height_segments,
                open_ended,
            ),
            Self::Box {
                width,
                height,
                depth,
            } => cuboid(Vec3::new(width, height, depth)),
            Self::Plane { width, height } => plane(width, height),
        };
        mesh.compute_tangents();
        mesh
    }
}

/// Largest vertex count a single tessellated primitive may produce.
pub const MAX_VERTICES: u64 = 1 << 22;

fn grid_vertices(columns: u32, rows: u32) -> u64 {
    (u64::from(columns) + 1) * (u64::from(rows) + 1)
}

/// Centre fan plus rim of one cylinder cap.
fn cap_vertices(segments: u32) -> u64 {
    2 * u64::from(segments) + 1
}

fn check_vertex_budget(vertices: u64) -> Result<(), ConfigError> {
    if vertices <= MAX_VERTICES {
        Ok(())
    } else {
        Err(ConfigError::TooManyVertices {
            vertices,
            limit: MAX_VERTICES,
        })
    }
}

struct ParamReader<'a> {
    params: &'a GeometryParams,
}

impl ParamReader<'_> {
    fn value(&self, name: &'static str) -> Result<f32, ConfigError> {
        let value = self
            .params
            .get(name)
            .ok_or(ConfigError::MissingParam(name))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ConfigError::InvalidParam {
                name,
                expected: "must be finite",
                value,
            })
        }
    }

    fn extent(&self, name: &'static str) -> Result<f32, ConfigError> {
        let value = self.value(name)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::InvalidParam {
                name,
                expected: "must be positive",
                value,
            })
        }
    }

    fn radius(&self, name: &'static str) -> Result<f32, ConfigError> {
        let value = self.value(name)?;
        if value >= 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::InvalidParam {
                name,
                expected: "must not be negative",
                value,
            })
        }
    }

    fn segments(&self, name: &'static str, min: u32) -> Result<u32, ConfigError> {
        let value = self.value(name)?;
        if value.fract() == 0.0 && value >= min as f32 && value <= u16::MAX as f32 {
            Ok(value as u32)
        } else {
            Err(ConfigError::InvalidParam {
                name,
                expected: "must be a whole segment count within range",
                value,
            })
        }
    }

    fn flag(&self, name: &'static str) -> Result<bool, ConfigError> {
        let value = self.value(name)?;
        if value == 0.0 {
            Ok(false)
        } else if value == 1.0 {
            Ok(true)
        } else {
            Err(ConfigError::InvalidParam {
                name,
                expected: "must be 0 or 1",
                value,
            })
        }
    }
}

fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;
            let position = Vec3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let normal = (position / radius).normalize_or_zero();
            row.push(mesh.push(Vertex::new(position, normal, Vec2::new(u, v))));
        }
        grid.push(row);
    }

    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

fn cylinder(
    top_radius: f32,
    bottom_radius: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    open_ended: bool,
) -> MeshData {
    let mut mesh = MeshData::default();
    let half_height = height / 2.0;
    let slope = (bottom_radius - top_radius) / height;
    let mut grid = Vec::with_capacity(height_segments as usize + 1);

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let radius = v * (bottom_radius - top_radius) + top_radius;
        let mut row = Vec::with_capacity(radial_segments as usize + 1);
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let position = Vec3::new(radius * sin, -v * height + half_height, radius * cos);
            let normal = Vec3::new(sin, slope, cos).normalize();
            row.push(mesh.push(Vertex::new(position, normal, Vec2::new(u, v))));
        }
        grid.push(row);
    }

    for x in 0..radial_segments as usize {
        for y in 0..height_segments as usize {
            let a = grid[y][x];
            let b = grid[y + 1][x];
            let c = grid[y + 1][x + 1];
            let d = grid[y][x + 1];
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    if !open_ended {
        if top_radius > 0.0 {
            cylinder_cap(&mut mesh, top_radius, half_height, radial_segments, true);
        }
        if bottom_radius > 0.0 {
            cylinder_cap(&mut mesh, bottom_radius, half_height, radial_segments, false);
        }
    }
    mesh
}

fn cylinder_cap(mesh: &mut MeshData, radius: f32, half_height: f32, segments: u32, top: bool) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = Vec3::new(0.0, sign, 0.0);
    let y = half_height * sign;

    let center_start = mesh.vertices.len() as u32;
    for _ in 0..segments {
        mesh.push(Vertex::new(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5)));
    }
    let rim_start = mesh.vertices.len() as u32;
    for x in 0..=segments {
        let u = x as f32 / segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let uv = Vec2::new(cos * 0.5 + 0.5, 0.5 - sin * 0.5 * sign);
        mesh.push(Vertex::new(
            Vec3::new(radius * sin, y, radius * cos),
            normal,
            uv,
        ));
    }

    for x in 0..segments {
        let center = center_start + x;
        let rim = rim_start + x;
        if top {
            mesh.indices.extend_from_slice(&[rim, rim + 1, center]);
        } else {
            mesh.indices.extend_from_slice(&[rim + 1, rim, center]);
        }
    }
}

fn cuboid(size: Vec3) -> MeshData {
    // (normal, u axis, v axis) with u x v == normal so the quads wind CCW.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    let half = size * 0.5;
    let mut mesh = MeshData::default();

    for (normal, u_axis, v_axis) in FACES {
        let base = mesh.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + u_axis * su + v_axis * sv) * half;
            let uv = Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5);
            mesh.push(Vertex::new(position, normal, uv));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

fn plane(width: f32, height: f32) -> MeshData {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let mut mesh = MeshData::default();
    for (position, uv) in [
        (Vec3::new(-hw, hh, 0.0), Vec2::new(0.0, 0.0)),
        (Vec3::new(hw, hh, 0.0), Vec2::new(1.0, 0.0)),
        (Vec3::new(-hw, -hh, 0.0), Vec2::new(0.0, 1.0)),
        (Vec3::new(hw, -hh, 0.0), Vec2::new(1.0, 1.0)),
    ] {
        mesh.push(Vertex::new(position, Vec3::Z, uv));
    }
    mesh.indices.extend_from_slice(&[0, 2, 1, 2, 3, 1]);
    mesh
}
