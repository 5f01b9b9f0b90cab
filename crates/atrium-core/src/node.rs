// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene nodes: transforms, primitive geometry, materials.
//!
//! Nodes form a strict tree. Every child is owned by exactly one parent via
//! `children: Vec<Node>`, so cycles are unrepresentable. The one relation that
//! crosses branches is a material's environment map, which is a plain
//! [`TextureHandle`] id and owns nothing.

use crate::bounds::Aabb;
use crate::transform::Transform;
use glam::{Mat4, Vec3};

/// Opaque id of a texture owned by the render backend.
///
/// Handles are minted by [`crate::backend::RenderBackend::create_cube_target`].
/// Equality is identity: two handles are the same texture iff their ids match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u64);

impl TextureHandle {
    /// Wraps a backend-assigned id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Linear RGB colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

impl Color {
    /// Decodes a `0xRRGGBB` literal.
    pub fn hex(rgb: u32) -> Self {
        let ch = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: ch(16),
            g: ch(8),
            b: ch(0),
        }
    }

    /// Components as an array.
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Primitive shapes. All are centred on the local origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box with full extents `size`.
    Box {
        /// Full width/height/depth.
        size: Vec3,
    },
    /// UV sphere.
    Sphere {
        /// Radius.
        radius: f32,
    },
    /// Cylinder along local Y.
    Cylinder {
        /// Radius.
        radius: f32,
        /// Full height.
        height: f32,
    },
    /// Cylinder along local Y with hemispherical caps.
    Capsule {
        /// Radius of the body and caps.
        radius: f32,
        /// Length of the straight section, excluding caps.
        length: f32,
    },
    /// Flat rectangle in the local XZ plane facing +Y.
    Plane {
        /// Extent along X.
        width: f32,
        /// Extent along Z.
        depth: f32,
    },
}

impl Geometry {
    /// Shorthand for a box.
    pub fn cuboid(x: f32, y: f32, z: f32) -> Self {
        Self::Box {
            size: Vec3::new(x, y, z),
        }
    }

    /// Tight local-space bounds.
    pub fn local_bounds(&self) -> Aabb {
        let half = match *self {
            Self::Box { size } => size * 0.5,
            Self::Sphere { radius } => Vec3::splat(radius),
            Self::Cylinder { radius, height } => Vec3::new(radius, height * 0.5, radius),
            Self::Capsule { radius, length } => Vec3::new(radius, length * 0.5 + radius, radius),
            Self::Plane { width, depth } => Vec3::new(width * 0.5, 0.0, depth * 0.5),
        };
        Aabb::from_center_half_extents(Vec3::ZERO, half)
    }

    /// Radius of a sphere around the origin enclosing the shape under any
    /// rotation.
    pub fn bounding_radius(&self) -> f32 {
        self.local_bounds().max().length()
    }
}

/// Reflective input of a material: which cube texture, and how strongly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvMap {
    /// Cube texture sampled for reflections.
    pub texture: TextureHandle,
    /// Reflection weight.
    pub intensity: f32,
}

/// Surface description consumed by the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Base colour.
    pub color: Color,
    /// 0 = dielectric, 1 = metal.
    pub metalness: f32,
    /// 0 = mirror, 1 = fully diffuse.
    pub roughness: f32,
    /// Reflective input slot; `None` until bound.
    pub env_map: Option<EnvMap>,
    /// Opaque surfaces block the reflection capture viewpoint.
    pub opaque: bool,
}

impl Material {
    /// Matte, non-reflective opaque material.
    pub fn standard(color: Color, roughness: f32) -> Self {
        Self {
            color,
            metalness: 0.0,
            roughness,
            env_map: None,
            opaque: true,
        }
    }

    /// Metallic material awaiting an environment map.
    pub fn metal(color: Color, roughness: f32) -> Self {
        Self {
            metalness: 1.0,
            ..Self::standard(color, roughness)
        }
    }
}

/// Shadow participation of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Shadows {
    /// Rendered into the key light's shadow map.
    pub cast: bool,
    /// Samples the key light's shadow map.
    pub receive: bool,
}

impl Shadows {
    /// Casts and receives.
    pub const BOTH: Self = Self {
        cast: true,
        receive: true,
    };
    /// Receives only (floors).
    pub const RECEIVE: Self = Self {
        cast: false,
        receive: true,
    };
}

/// Drawable leaf payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Shape.
    pub geometry: Geometry,
    /// Surface.
    pub material: Material,
    /// Shadow flags.
    pub shadows: Shadows,
}

/// What a node carries besides its transform.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure transform grouping.
    Group,
    /// Drawable.
    Mesh(Mesh),
}

/// One node of the scene tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Debug name, unique within its subtree by convention.
    pub name: String,
    /// Local transform relative to the parent.
    pub transform: Transform,
    /// Payload.
    pub kind: NodeKind,
    /// Owned children.
    pub children: Vec<Node>,
}

impl Node {
    /// Empty group.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    /// Mesh leaf that casts and receives shadows.
    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            kind: NodeKind::Mesh(Mesh {
                geometry,
                material,
                shadows: Shadows::BOTH,
            }),
            children: Vec::new(),
        }
    }

    /// Sets the local translation.
    #[must_use]
    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    /// Sets the local Euler rotation.
    #[must_use]
    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.transform.rotation = rotation;
        self
    }

    /// Overrides shadow flags; no effect on groups.
    #[must_use]
    pub fn with_shadows(mut self, shadows: Shadows) -> Self {
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            mesh.shadows = shadows;
        }
        self
    }

    /// Appends a child, taking ownership.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Mesh payload, if any.
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    /// Mutable material, if this node is a mesh.
    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(&mut mesh.material),
            NodeKind::Group => None,
        }
    }

    /// Depth-first search by name, this node included.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }

    /// Visits every node depth-first (parents before children) with its
    /// world matrix.
    pub fn visit<'a, F>(&'a self, parent: Mat4, f: &mut F)
    where
        F: FnMut(&'a Node, Mat4),
    {
        let world = parent * self.transform.to_mat4();
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    /// World-space bounds of every mesh in this subtree.
    pub fn world_bounds(&self, parent: Mat4) -> Option<Aabb> {
        let mut acc: Option<Aabb> = None;
        self.visit(parent, &mut |node, world| {
            if let Some(mesh) = node.as_mesh() {
                let b = mesh.geometry.local_bounds().transformed(&world);
                acc = Some(acc.map_or(b, |a| a.union(&b)));
            }
        });
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colour_decodes_channels() {
        let c = Color::hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn visit_composes_parent_transforms() {
        let tree = Node::group("root").at(Vec3::new(1.0, 0.0, 0.0)).with_child(
            Node::mesh(
                "leaf",
                Geometry::cuboid(1.0, 1.0, 1.0),
                Material::standard(Color::hex(0xffffff), 1.0),
            )
            .at(Vec3::new(0.0, 2.0, 0.0)),
        );
        let mut seen = Vec::new();
        tree.visit(Mat4::IDENTITY, &mut |n, w| {
            seen.push((n.name.clone(), w.transform_point3(Vec3::ZERO)));
        });
        assert_eq!(seen[0], ("root".to_owned(), Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(seen[1], ("leaf".to_owned(), Vec3::new(1.0, 2.0, 0.0)));
        assert_eq!(tree.node_count(), 2);
        assert!(tree.find("leaf").is_some());
    }

    #[test]
    fn capsule_bounds_include_caps() {
        let g = Geometry::Capsule {
            radius: 0.5,
            length: 2.0,
        };
        assert_eq!(g.local_bounds().size(), Vec3::new(1.0, 3.0, 1.0));
    }
}
