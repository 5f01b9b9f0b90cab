// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Procedural door: slab, three raised panels with their own frames, a
//! handle assembly, and an outer frame.
//!
//! Every offset and size is derived from `(width, height)` by
//! [`DoorLayout::compute`]. A size change throws the whole subtree away and
//! builds a new one from the new layout; nothing is patched in place, so the
//! result for a given size never depends on the sizes that came before it.

use crate::error::ConfigurationError;
use crate::node::{Color, Geometry, Material, Node};
use crate::transform::Transform;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, instrument};

/// Slab thickness.
pub const DOOR_DEPTH: f32 = 0.08;
/// Panel centres as fractions of door height, bottom to top.
pub const PANEL_HEIGHT_FRACTIONS: [f32; 3] = [0.22, 0.50, 0.78];
/// Panel width as a fraction of door width.
pub const PANEL_WIDTH_FRACTION: f32 = 0.7;
/// Panel height as a fraction of door height.
pub const PANEL_HEIGHT_FRACTION: f32 = 0.22;
/// How far a panel stands proud of the slab face.
pub const PANEL_DEPTH: f32 = 0.02;
/// Bar thickness of each panel frame.
pub const PANEL_FRAME_THICKNESS: f32 = 0.03;
/// Depth of the panel frame bars.
pub const PANEL_FRAME_DEPTH: f32 = 0.03;
/// Handle position as fractions of `(width, height)` from the door origin.
pub const HANDLE_OFFSET_FRACTION: [f32; 2] = [-0.35, 0.45];
/// Handle back plate extents.
pub const HANDLE_PLATE_SIZE: Vec3 = Vec3::new(0.08, 0.25, 0.02);
/// Grip radius.
pub const HANDLE_GRIP_RADIUS: f32 = 0.02;
/// Grip straight-section length.
pub const HANDLE_GRIP_LENGTH: f32 = 0.12;
/// Outer frame bar thickness.
pub const FRAME_THICKNESS: f32 = 0.1;
/// How far the outer frame stands beyond each slab face.
pub const FRAME_MARGIN: f32 = 0.02;
/// Outer frame depth.
pub const FRAME_DEPTH: f32 = DOOR_DEPTH + 2.0 * FRAME_MARGIN;

/// Requested door dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    /// Slab width.
    pub width: f32,
    /// Slab height.
    pub height: f32,
}

impl Default for DoorSpec {
    fn default() -> Self {
        Self {
            width: 1.2,
            height: 2.4,
        }
    }
}

impl DoorSpec {
    /// Validated constructor.
    pub fn new(width: f32, height: f32) -> Result<Self, ConfigurationError> {
        let spec = Self { width, height };
        spec.validate()?;
        Ok(spec)
    }

    /// Rejects non-finite or non-positive dimensions.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidDoorSize {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// A box placed relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
    /// Node name.
    pub name: &'static str,
    /// Centre relative to the parent group.
    pub center: Vec3,
    /// Full extents.
    pub size: Vec3,
}

/// One raised panel and the frame wrapped around it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelLayout {
    /// Panel centre relative to the door origin.
    pub center: Vec3,
    /// Panel extents.
    pub size: Vec3,
    /// Frame bars relative to the panel centre: top, bottom, left, right.
    pub frame: [Bar; 4],
}

/// Handle assembly placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleLayout {
    /// Handle group origin relative to the door origin, on the front face.
    pub position: Vec3,
    /// Back plate centre relative to the handle origin.
    pub plate_center: Vec3,
    /// Grip centre relative to the handle origin.
    pub grip_center: Vec3,
}

/// Every number the builder needs, derived from a [`DoorSpec`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoorLayout {
    /// Input dimensions.
    pub spec: DoorSpec,
    /// Slab centre.
    pub slab_center: Vec3,
    /// Slab extents.
    pub slab_size: Vec3,
    /// Panels bottom to top.
    pub panels: [PanelLayout; 3],
    /// Handle assembly.
    pub handle: HandleLayout,
    /// Outer frame bars: top, left, right.
    pub outer_frame: [Bar; 3],
}

impl DoorLayout {
    /// Derives the layout. Pure: equal specs give bit-identical layouts.
    pub fn compute(spec: DoorSpec) -> Self {
        let DoorSpec { width: w, height: h } = spec;
        let face_z = DOOR_DEPTH * 0.5;

        let panel_w = w * PANEL_WIDTH_FRACTION;
        let panel_h = h * PANEL_HEIGHT_FRACTION;
        let panels = PANEL_HEIGHT_FRACTIONS.map(|f| PanelLayout {
            center: Vec3::new(0.0, h * f, face_z + PANEL_DEPTH * 0.5),
            size: Vec3::new(panel_w, panel_h, PANEL_DEPTH),
            frame: panel_frame(panel_w, panel_h),
        });

        let t = FRAME_THICKNESS;
        let outer_frame = [
            Bar {
                name: "outer-frame-top",
                center: Vec3::new(0.0, h + t * 0.5, 0.0),
                size: Vec3::new(w + 2.0 * t, t, FRAME_DEPTH),
            },
            Bar {
                name: "outer-frame-left",
                center: Vec3::new(-(w * 0.5 + t * 0.5), h * 0.5, 0.0),
                size: Vec3::new(t, h, FRAME_DEPTH),
            },
            Bar {
                name: "outer-frame-right",
                center: Vec3::new(w * 0.5 + t * 0.5, h * 0.5, 0.0),
                size: Vec3::new(t, h, FRAME_DEPTH),
            },
        ];

        let handle = HandleLayout {
            position: Vec3::new(
                w * HANDLE_OFFSET_FRACTION[0],
                h * HANDLE_OFFSET_FRACTION[1],
                face_z,
            ),
            plate_center: Vec3::new(0.0, 0.0, HANDLE_PLATE_SIZE.z * 0.5),
            grip_center: Vec3::new(
                0.0,
                0.0,
                HANDLE_PLATE_SIZE.z + HANDLE_GRIP_RADIUS + HANDLE_GRIP_LENGTH * 0.5,
            ),
        };

        Self {
            spec,
            slab_center: Vec3::new(0.0, h * 0.5, 0.0),
            slab_size: Vec3::new(w, h, DOOR_DEPTH),
            panels,
            handle,
            outer_frame,
        }
    }
}

/// Bars hugging a `panel_w x panel_h` panel, relative to the panel centre.
fn panel_frame(panel_w: f32, panel_h: f32) -> [Bar; 4] {
    let t = PANEL_FRAME_THICKNESS;
    let dz = (PANEL_FRAME_DEPTH - PANEL_DEPTH) * 0.5;
    let horizontal = Vec3::new(panel_w + 2.0 * t, t, PANEL_FRAME_DEPTH);
    let vertical = Vec3::new(t, panel_h, PANEL_FRAME_DEPTH);
    [
        Bar {
            name: "top",
            center: Vec3::new(0.0, panel_h * 0.5 + t * 0.5, dz),
            size: horizontal,
        },
        Bar {
            name: "bottom",
            center: Vec3::new(0.0, -(panel_h * 0.5 + t * 0.5), dz),
            size: horizontal,
        },
        Bar {
            name: "left",
            center: Vec3::new(-(panel_w * 0.5 + t * 0.5), 0.0, dz),
            size: vertical,
        },
        Bar {
            name: "right",
            center: Vec3::new(panel_w * 0.5 + t * 0.5, 0.0, dz),
            size: vertical,
        },
    ]
}

/// Materials used by the door parts.
#[derive(Clone, Debug, PartialEq)]
pub struct DoorPalette {
    /// Slab.
    pub slab: Material,
    /// Raised panels.
    pub panel: Material,
    /// Panel frame bars.
    pub panel_frame: Material,
    /// Handle plate and grip.
    pub handle: Material,
    /// Outer frame.
    pub frame: Material,
}

impl Default for DoorPalette {
    fn default() -> Self {
        Self {
            slab: Material::standard(Color::hex(0x8b4513), 0.7),
            panel: Material::standard(Color::hex(0xa0522d), 0.6),
            panel_frame: Material::standard(Color::hex(0x654321), 0.6),
            handle: Material {
                metalness: 0.8,
                ..Material::standard(Color::hex(0xd4af37), 0.3)
            },
            frame: Material::standard(Color::hex(0x5c4033), 0.8),
        }
    }
}

fn bar_node(name: impl Into<String>, bar: &Bar, material: &Material) -> Node {
    Node::mesh(
        name,
        Geometry::Box { size: bar.size },
        material.clone(),
    )
    .at(bar.center)
}

/// Builds a fresh door subtree from a layout.
pub fn build_door(layout: &DoorLayout, palette: &DoorPalette) -> Node {
    let mut root = Node::group("door");

    root.children.push(
        Node::mesh(
            "slab",
            Geometry::Box {
                size: layout.slab_size,
            },
            palette.slab.clone(),
        )
        .at(layout.slab_center),
    );

    for (i, panel) in layout.panels.iter().enumerate() {
        root.children.push(
            Node::mesh(
                format!("panel-{i}"),
                Geometry::Box { size: panel.size },
                palette.panel.clone(),
            )
            .at(panel.center),
        );
        let mut frame = Node::group(format!("panel-frame-{i}")).at(panel.center);
        for bar in &panel.frame {
            frame.children.push(bar_node(
                format!("panel-frame-{i}-{}", bar.name),
                bar,
                &palette.panel_frame,
            ));
        }
        root.children.push(frame);
    }

    let handle = &layout.handle;
    root.children.push(
        Node::group("handle")
            .at(handle.position)
            .with_child(
                Node::mesh(
                    "handle-plate",
                    Geometry::Box {
                        size: HANDLE_PLATE_SIZE,
                    },
                    palette.handle.clone(),
                )
                .at(handle.plate_center),
            )
            .with_child(
                Node::mesh(
                    "handle-grip",
                    Geometry::Capsule {
                        radius: HANDLE_GRIP_RADIUS,
                        length: HANDLE_GRIP_LENGTH,
                    },
                    palette.handle.clone(),
                )
                .at(handle.grip_center)
                // capsule axis is local Y; turn it to stick out of the face
                .rotated(Vec3::new(FRAC_PI_2, 0.0, 0.0)),
            ),
    );

    let mut outer = Node::group("outer-frame");
    for bar in &layout.outer_frame {
        outer.children.push(bar_node(bar.name, bar, &palette.frame));
    }
    root.children.push(outer);

    root
}

/// The live door: current spec, derived layout and built subtree.
#[derive(Clone, Debug)]
pub struct Door {
    layout: DoorLayout,
    palette: DoorPalette,
    placement: Transform,
    root: Node,
    rebuilds: u64,
}

impl Door {
    /// Builds a door at the scene origin.
    pub fn new(spec: DoorSpec) -> Result<Self, ConfigurationError> {
        Self::with_placement(spec, Transform::identity(), DoorPalette::default())
    }

    /// Builds a door placed by `placement` in its parent.
    pub fn with_placement(
        spec: DoorSpec,
        placement: Transform,
        palette: DoorPalette,
    ) -> Result<Self, ConfigurationError> {
        spec.validate()?;
        let layout = DoorLayout::compute(spec);
        let mut root = build_door(&layout, &palette);
        root.transform = placement;
        Ok(Self {
            layout,
            palette,
            placement,
            root,
            rebuilds: 0,
        })
    }

    /// Discards the current subtree and builds a new one for `(width, height)`.
    ///
    /// Invalid sizes are rejected before anything is touched, so on error the
    /// existing subtree is left exactly as it was.
    #[instrument(level = "debug", skip(self))]
    pub fn rebuild(&mut self, width: f32, height: f32) -> Result<(), ConfigurationError> {
        let spec = DoorSpec::new(width, height)?;
        let layout = DoorLayout::compute(spec);
        let mut root = build_door(&layout, &self.palette);
        root.transform = self.placement;
        self.layout = layout;
        self.root = root;
        self.rebuilds += 1;
        debug!(
            nodes = self.root.node_count(),
            rebuilds = self.rebuilds,
            "door rebuilt"
        );
        Ok(())
    }

    /// Current dimensions.
    pub fn spec(&self) -> DoorSpec {
        self.layout.spec
    }

    /// Current derived layout.
    pub fn layout(&self) -> &DoorLayout {
        &self.layout
    }

    /// Root of the door subtree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of successful rebuilds since construction.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
