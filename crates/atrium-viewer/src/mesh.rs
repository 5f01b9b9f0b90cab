// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CPU-side triangle meshes for the scene primitives.
//!
//! Boxes, spheres, cylinders and planes are built once at unit size and
//! scaled per instance. Capsules change shape with their aspect, so they are
//! built at their real size.

use atrium_core::Geometry;
use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Sphere and capsule longitude segments.
const SEGMENTS: u32 = 32;
/// Sphere latitude rings.
const RINGS: u32 = 16;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

#[derive(Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    fn push(&mut self, pos: Vec3, normal: Vec3) -> u16 {
        let index = self.vertices.len() as u16;
        self.vertices.push(Vertex {
            pos: pos.to_array(),
            normal: normal.to_array(),
        });
        index
    }

    fn quad(&mut self, a: u16, b: u16, c: u16, d: u16) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }

    /// Triangle strip grid of `rows x cols` quads over vertices laid out
    /// row-major from `base` with `cols + 1` per row.
    fn grid(&mut self, base: u16, rows: u32, cols: u32) {
        let stride = cols + 1;
        for y in 0..rows {
            for x in 0..cols {
                let i0 = base + (y * stride + x) as u16;
                let i1 = i0 + 1;
                let i2 = i0 + stride as u16;
                let i3 = i2 + 1;
                self.indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }
    }
}

/// Which shared mesh draws a geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKey {
    Cube,
    Sphere,
    Cylinder,
    Plane,
    /// Radius and length bit patterns.
    Capsule(u32, u32),
}

impl MeshKey {
    /// Mesh for `geometry` plus the scale that takes the unit mesh to size.
    pub fn for_geometry(geometry: &Geometry) -> (Self, Vec3) {
        match *geometry {
            Geometry::Box { size } => (Self::Cube, size),
            Geometry::Sphere { radius } => (Self::Sphere, Vec3::splat(radius)),
            Geometry::Cylinder { radius, height } => {
                (Self::Cylinder, Vec3::new(radius, height, radius))
            }
            Geometry::Plane { width, depth } => (Self::Plane, Vec3::new(width, 1.0, depth)),
            Geometry::Capsule { radius, length } => {
                (Self::Capsule(radius.to_bits(), length.to_bits()), Vec3::ONE)
            }
        }
    }

    /// World matrix of the unit mesh for an item placed at `world`.
    pub fn model(geometry: &Geometry, world: Mat4) -> (Self, Mat4) {
        let (key, scale) = Self::for_geometry(geometry);
        (key, world * Mat4::from_scale(scale))
    }

    pub fn build(self) -> MeshData {
        match self {
            Self::Cube => unit_cube(),
            Self::Sphere => unit_sphere(SEGMENTS, RINGS),
            Self::Cylinder => unit_cylinder(SEGMENTS),
            Self::Plane => unit_plane(),
            Self::Capsule(radius, length) => {
                capsule(f32::from_bits(radius), f32::from_bits(length), SEGMENTS)
            }
        }
    }
}

/// Cube of side 1 centred on the origin, flat-shaded.
pub fn unit_cube() -> MeshData {
    let mut mesh = MeshData::default();
    for normal in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
        // Two axes spanning the face, ordered so the winding faces out.
        let u = if normal.y.abs() > 0.5 { Vec3::X } else { Vec3::Y };
        let v = normal.cross(u);
        let c = normal * 0.5;
        let a = mesh.push(c - u * 0.5 - v * 0.5, normal);
        let b = mesh.push(c + u * 0.5 - v * 0.5, normal);
        let cc = mesh.push(c + u * 0.5 + v * 0.5, normal);
        let d = mesh.push(c - u * 0.5 + v * 0.5, normal);
        mesh.quad(a, b, cc, d);
    }
    mesh
}

/// Radius-1 UV sphere.
pub fn unit_sphere(segments: u32, rings: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for y in 0..=rings {
        let theta = y as f32 / rings as f32 * PI;
        for x in 0..=segments {
            let phi = x as f32 / segments as f32 * TAU;
            let n = Vec3::new(phi.sin() * theta.sin(), theta.cos(), phi.cos() * theta.sin());
            mesh.push(n, n);
        }
    }
    mesh.grid(0, rings, segments);
    mesh
}

/// Radius-1, height-1 cylinder along Y with flat caps.
pub fn unit_cylinder(segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let ring = |i: u32| {
        let phi = i as f32 / segments as f32 * TAU;
        Vec3::new(phi.sin(), 0.0, phi.cos())
    };
    // Side: row 0 at the top so the shared grid winding faces out.
    for y in [0.5, -0.5] {
        for i in 0..=segments {
            let n = ring(i);
            mesh.push(n + Vec3::Y * y, n);
        }
    }
    mesh.grid(0, 1, segments);

    for (y, normal) in [(0.5, Vec3::Y), (-0.5, Vec3::NEG_Y)] {
        let centre = mesh.push(Vec3::Y * y, normal);
        let first = centre + 1;
        for i in 0..=segments {
            mesh.push(ring(i) + Vec3::Y * y, normal);
        }
        for i in 0..segments as u16 {
            if normal.y > 0.0 {
                mesh.indices
                    .extend_from_slice(&[centre, first + i, first + i + 1]);
            } else {
                mesh.indices
                    .extend_from_slice(&[centre, first + i + 1, first + i]);
            }
        }
    }
    mesh
}

/// Capsule along Y: a cylinder of `length` with hemispherical caps.
pub fn capsule(radius: f32, length: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let half = length * 0.5;
    let cap_rings = segments / 4;
    // Latitude rows from the north pole to the south pole; the equator is
    // emitted twice so the straight section gets its own row.
    let mut rows = Vec::new();
    for r in 0..=cap_rings {
        rows.push((r as f32 / cap_rings as f32 * PI * 0.5, half));
    }
    for r in 0..=cap_rings {
        rows.push((PI * 0.5 + r as f32 / cap_rings as f32 * PI * 0.5, -half));
    }
    for &(theta, offset) in &rows {
        for x in 0..=segments {
            let phi = x as f32 / segments as f32 * TAU;
            let n = Vec3::new(phi.sin() * theta.sin(), theta.cos(), phi.cos() * theta.sin());
            mesh.push(n * radius + Vec3::Y * offset, n);
        }
    }
    mesh.grid(0, rows.len() as u32 - 1, segments);
    mesh
}

/// 1x1 plane in XZ facing +Y.
pub fn unit_plane() -> MeshData {
    let mut mesh = MeshData::default();
    let a = mesh.push(Vec3::new(-0.5, 0.0, -0.5), Vec3::Y);
    let b = mesh.push(Vec3::new(-0.5, 0.0, 0.5), Vec3::Y);
    let c = mesh.push(Vec3::new(0.5, 0.0, 0.5), Vec3::Y);
    let d = mesh.push(Vec3::new(0.5, 0.0, -0.5), Vec3::Y);
    mesh.quad(a, b, c, d);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Every triangle's geometric normal agrees with its vertex normals,
    /// i.e. the winding is counter-clockwise seen from outside.
    fn assert_outward(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let (pa, pb, pc) = (Vec3::from(a.pos), Vec3::from(b.pos), Vec3::from(c.pos));
            let face = (pb - pa).cross(pc - pa);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let n = Vec3::from(a.normal) + Vec3::from(b.normal) + Vec3::from(c.normal);
            assert!(face.dot(n) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn primitives_wind_outward() {
        assert_outward(&unit_cube());
        assert_outward(&unit_sphere(16, 8));
        assert_outward(&unit_cylinder(16));
        assert_outward(&capsule(0.3, 0.8, 16));
        assert_outward(&unit_plane());
    }

    #[test]
    fn cube_spans_unit_extent() {
        let cube = unit_cube();
        assert_eq!((cube.vertices.len(), cube.indices.len()), (24, 36));
        for v in &cube.vertices {
            for c in v.pos {
                assert_relative_eq!(c.abs(), 0.5);
            }
        }
    }

    #[test]
    fn capsule_height_includes_caps() {
        let mesh = capsule(0.3, 0.8, 16);
        let top = mesh.vertices.iter().map(|v| v.pos[1]).fold(f32::MIN, f32::max);
        let bottom = mesh.vertices.iter().map(|v| v.pos[1]).fold(f32::MAX, f32::min);
        assert_relative_eq!(top, 0.7, epsilon = 1e-5);
        assert_relative_eq!(bottom, -0.7, epsilon = 1e-5);
    }

    #[test]
    fn unit_meshes_scale_to_geometry() {
        let (key, model) = MeshKey::model(&Geometry::cuboid(2.0, 3.0, 4.0), Mat4::IDENTITY);
        assert_eq!(key, MeshKey::Cube);
        assert_eq!(model.transform_point3(Vec3::splat(0.5)), Vec3::new(1.0, 1.5, 2.0));

        let (key, model) = MeshKey::model(&Geometry::Capsule { radius: 0.1, length: 0.5 }, Mat4::IDENTITY);
        assert!(matches!(key, MeshKey::Capsule(..)));
        assert_eq!(model, Mat4::IDENTITY);
    }
}
