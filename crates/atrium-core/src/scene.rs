// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene graph: floor, door, reflective shapes and lights under one root.

use crate::bounds::Aabb;
use crate::door::{Door, DoorPalette, DoorSpec};
use crate::error::ConfigurationError;
use crate::lighting::LightingRig;
use crate::node::{Color, Geometry, Material, Mesh, Node, Shadows};
use crate::shapes::{ReflectiveShapes, ShapeSetup, SPHERE_BOB_AMPLITUDE};
use crate::transform::Transform;
use glam::{Mat4, Vec3};

/// Floor edge length.
pub const FLOOR_SIZE: f32 = 20.0;

/// A mesh flattened to world space, ready for a backend.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem<'a> {
    /// Node name.
    pub name: &'a str,
    /// Local-to-world matrix.
    pub world: Mat4,
    /// Shape, surface and shadow flags.
    pub mesh: &'a Mesh,
}

/// Construction parameters for [`Scene`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSetup {
    /// Clear colour.
    pub background: Color,
    /// Initial door size.
    pub door: DoorSpec,
    /// Where the door stands.
    pub door_placement: Vec3,
    /// Reflective pair.
    pub shapes: ShapeSetup,
    /// Lights.
    pub lighting: LightingRig,
}

impl Default for SceneSetup {
    fn default() -> Self {
        Self {
            background: Color::hex(0x87ceeb),
            door: DoorSpec::default(),
            door_placement: Vec3::new(0.0, 0.0, -1.5),
            shapes: ShapeSetup::default(),
            lighting: LightingRig::default(),
        }
    }
}

/// Everything that gets rendered.
#[derive(Clone, Debug)]
pub struct Scene {
    background: Color,
    floor: Node,
    door: Door,
    shapes: ReflectiveShapes,
    lighting: LightingRig,
}

impl Scene {
    /// Builds the scene; fails only on an invalid door size.
    pub fn new(setup: SceneSetup) -> Result<Self, ConfigurationError> {
        let floor = Node::mesh(
            "floor",
            Geometry::Plane {
                width: FLOOR_SIZE,
                depth: FLOOR_SIZE,
            },
            Material::standard(Color::hex(0x808080), 0.8),
        )
        .with_shadows(Shadows::RECEIVE);
        let door = Door::with_placement(
            setup.door,
            Transform::from_translation(setup.door_placement),
            DoorPalette::default(),
        )?;
        Ok(Self {
            background: setup.background,
            floor,
            door,
            shapes: ReflectiveShapes::new(setup.shapes),
            lighting: setup.lighting,
        })
    }

    /// Clear colour.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Ground plane.
    pub fn floor(&self) -> &Node {
        &self.floor
    }

    /// The door.
    pub fn door(&self) -> &Door {
        &self.door
    }

    /// The reflective pair.
    pub fn shapes(&self) -> &ReflectiveShapes {
        &self.shapes
    }

    /// Mutable access for animation and environment binding.
    pub fn shapes_mut(&mut self) -> &mut ReflectiveShapes {
        &mut self.shapes
    }

    /// Lights.
    pub fn lighting(&self) -> &LightingRig {
        &self.lighting
    }

    /// Rebuilds the door subtree. On error the old door stays.
    pub fn update_door_size(&mut self, width: f32, height: f32) -> Result<(), ConfigurationError> {
        self.door.rebuild(width, height)
    }

    /// Puts back a door taken before a rejected update, rebuild count included.
    pub(crate) fn restore_door(&mut self, door: Door) {
        self.door = door;
    }

    /// Top-level subtrees in draw order.
    pub fn roots(&self) -> [&Node; 4] {
        let [cube, sphere] = self.shapes.nodes();
        [&self.floor, self.door.root(), cube, sphere]
    }

    /// Calls `f` for every mesh with its world matrix.
    pub fn for_each_mesh<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(DrawItem<'a>),
    {
        for root in self.roots() {
            root.visit(Mat4::IDENTITY, &mut |node, world| {
                if let Some(mesh) = node.as_mesh() {
                    f(DrawItem {
                        name: &node.name,
                        world,
                        mesh,
                    });
                }
            });
        }
    }

    /// All meshes flattened to world space.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut out = Vec::new();
        self.for_each_mesh(|item| out.push(item));
        out
    }

    /// Conservative world bounds of each opaque mesh, keyed by node name.
    ///
    /// Static meshes use their transformed boxes. The animated shapes use
    /// rotation-independent spheres, widened by the bob amplitude, so the
    /// result holds for every pose.
    pub fn opaque_bounds(&self) -> Vec<(String, Aabb)> {
        let mut out = Vec::new();
        for root in [&self.floor, self.door.root()] {
            root.visit(Mat4::IDENTITY, &mut |node, world| {
                if let Some(mesh) = node.as_mesh().filter(|m| m.material.opaque) {
                    let bounds = mesh.geometry.local_bounds().transformed(&world);
                    out.push((node.name.clone(), bounds));
                }
            });
        }
        for (node, sweep) in [
            (self.shapes.cube(), 0.0),
            (self.shapes.sphere(), SPHERE_BOB_AMPLITUDE),
        ] {
            let Some(mesh) = node.as_mesh().filter(|m| m.material.opaque) else {
                continue;
            };
            let r = mesh.geometry.bounding_radius() * node.transform.scale.max_element();
            let mut center = node.transform.translation;
            if sweep > 0.0 {
                center.y = self.shapes.base_y();
            }
            let half = Vec3::new(r, r + sweep, r);
            out.push((
                node.name.clone(),
                Aabb::from_center_half_extents(center, half),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_list_covers_every_mesh() {
        let scene = Scene::new(SceneSetup::default()).unwrap();
        let names: Vec<_> = scene.draw_list().iter().map(|d| d.name.to_owned()).collect();
        assert_eq!(names.first().map(String::as_str), Some("floor"));
        assert!(names.iter().any(|n| n == "slab"));
        assert!(names.iter().any(|n| n == "reflective-cube"));
        assert!(names.iter().any(|n| n == "reflective-sphere"));
        // floor + door meshes (slab, 3 panels, 12 frame bars, plate, grip, 3 outer) + 2 shapes
        assert_eq!(names.len(), 1 + 1 + 3 + 12 + 2 + 3 + 2);
    }

    #[test]
    fn door_placement_survives_rebuild() {
        let mut scene = Scene::new(SceneSetup::default()).unwrap();
        let z = |s: &Scene| {
            s.draw_list()
                .iter()
                .find(|d| d.name == "slab")
                .map(|d| d.world.w_axis.z)
                .unwrap()
        };
        let before = z(&scene);
        scene.update_door_size(2.0, 3.0).unwrap();
        assert_eq!(z(&scene), before);
    }

    #[test]
    fn floor_only_receives_shadows() {
        let scene = Scene::new(SceneSetup::default()).unwrap();
        let floor = scene.floor().as_mesh().unwrap();
        assert!(!floor.shadows.cast && floor.shadows.receive);
    }

    #[test]
    fn opaque_bounds_cover_every_pose_of_the_sphere() {
        let mut scene = Scene::new(SceneSetup::default()).unwrap();
        let bounds = scene.opaque_bounds();
        let (_, sphere) = bounds
            .iter()
            .find(|(n, _)| n == "reflective-sphere")
            .unwrap();
        for t in [0.0, 0.4, 0.8, 1.2, 2.0] {
            scene.shapes_mut().animate(t);
            let p = scene.shapes().sphere().transform.translation;
            assert!(sphere.contains_point(p + Vec3::Y * 0.5));
            assert!(sphere.contains_point(p - Vec3::Y * 0.5));
        }
    }

    #[test]
    fn large_door_stays_clear_of_the_room_centre() {
        let mut scene = Scene::new(SceneSetup::default()).unwrap();
        scene.update_door_size(6.0, 6.0).unwrap();
        let probe = Vec3::new(0.0, 0.75, 0.5);
        assert!(scene
            .opaque_bounds()
            .iter()
            .all(|(_, b)| !b.contains_point(probe)));
    }
}
