//! Debug rendering of tracked surfaces and the selected object.
//!
//! Everything here is drawn with Bevy's immediate-mode `Gizmos`; nothing is
//! spawned. Add [`PlacementDebugDrawPlugin`] next to the placement plugin
//! while developing a tracking backend.

use bevy::gizmos::config::{DefaultGizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::collider::{BoundingBox, PartCollider, PlacedRoot};
use crate::registry::ObjectRegistry;
use crate::surface::{SurfaceAlignment, SurfaceProvider, TrackedPlanes};
use crate::types::PlacedObject;

/// Length of the normal drawn from each surface centre.
const NORMAL_LENGTH: f32 = 0.15;

/// Box edges as index pairs into [`BoundingBox::corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Colors and line settings for the debug overlay.
#[derive(Resource, Debug, Clone)]
pub struct PlacementDebugStyle {
    /// Floors and table tops.
    pub horizontal_up: Color,
    /// Ceilings.
    pub horizontal_down: Color,
    /// Walls.
    pub vertical: Color,
    /// Slanted surfaces.
    pub other: Color,
    /// Bounds of the selected object.
    pub selection: Color,
    /// Gizmo line width in pixels.
    pub line_width: f32,
    /// Depth bias so outlines sit on top of the surfaces they trace.
    pub depth_bias: f32,
}

impl Default for PlacementDebugStyle {
    fn default() -> Self {
        Self {
            horizontal_up: Color::srgb(0.2, 0.9, 0.4),
            horizontal_down: Color::srgb(0.9, 0.4, 0.2),
            vertical: Color::srgb(0.3, 0.5, 1.0),
            other: Color::srgb(0.7, 0.7, 0.7),
            selection: Color::srgb(1.0, 0.85, 0.1),
            line_width: 2.0,
            depth_bias: -0.5,
        }
    }
}

impl PlacementDebugStyle {
    /// Outline color for a surface class.
    pub fn surface_color(&self, alignment: SurfaceAlignment) -> Color {
        match alignment {
            SurfaceAlignment::HorizontalUp => self.horizontal_up,
            SurfaceAlignment::HorizontalDown => self.horizontal_down,
            SurfaceAlignment::Vertical => self.vertical,
            SurfaceAlignment::NotAxisAligned => self.other,
        }
    }
}

/// Draws tracked surface outlines and the selected object's bounds.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_placement_tools::{PlacementDebugDrawPlugin, PlacementPlugin};
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins((PlacementPlugin, PlacementDebugDrawPlugin))
///     .run();
/// ```
pub struct PlacementDebugDrawPlugin;

impl Plugin for PlacementDebugDrawPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementDebugStyle>()
            .add_systems(Startup, configure_debug_gizmos)
            .add_systems(Update, (draw_surfaces, draw_selection));
    }
}

/// Applies the style's line settings to the default gizmo group.
fn configure_debug_gizmos(
    mut config_store: ResMut<GizmoConfigStore>,
    style: Res<PlacementDebugStyle>,
) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = style.line_width;
    config.depth_bias = style.depth_bias;
}

fn draw_surfaces(mut gizmos: Gizmos, planes: Res<TrackedPlanes>, style: Res<PlacementDebugStyle>) {
    for surface in planes.surfaces() {
        let color = style.surface_color(surface.alignment());
        let corners = surface.corners();
        for i in 0..corners.len() {
            gizmos.line(corners[i], corners[(i + 1) % corners.len()], color);
        }
        gizmos.line(
            surface.center,
            surface.center + surface.normal() * NORMAL_LENGTH,
            color,
        );
    }
}

fn draw_selection(
    mut gizmos: Gizmos,
    registry: Option<Res<ObjectRegistry>>,
    roots: Query<(&PlacedObject, &GlobalTransform, Option<&PartCollider>), With<PlacedRoot>>,
    style: Res<PlacementDebugStyle>,
) {
    let Some(current) = registry.as_ref().and_then(|r| r.current()) else {
        return;
    };
    let Some((_, transform, collider)) = roots.iter().find(|(object, ..)| object.id == current.id)
    else {
        return;
    };

    let bounds = collider.map_or(BoundingBox::UNIT, PartCollider::bounds);
    let corners = bounds.corners().map(|c| transform.transform_point(c));
    for (a, b) in BOX_EDGES {
        gizmos.line(corners[a], corners[b], style.selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_edges_join_corners_differing_on_one_axis() {
        let corners = BoundingBox::UNIT.corners();
        for (a, b) in BOX_EDGES {
            let diff = (corners[a] - corners[b]).abs();
            let axes = [diff.x, diff.y, diff.z].iter().filter(|d| **d > 0.5).count();
            assert_eq!(axes, 1, "edge {a}-{b}");
        }
    }

    #[test]
    fn each_alignment_has_its_own_color() {
        let style = PlacementDebugStyle::default();
        let colors = [
            SurfaceAlignment::HorizontalUp,
            SurfaceAlignment::HorizontalDown,
            SurfaceAlignment::Vertical,
            SurfaceAlignment::NotAxisAligned,
        ]
        .map(|a| style.surface_color(a));
        for i in 0..colors.len() {
            for j in i + 1..colors.len() {
                assert_ne!(colors[i], colors[j]);
            }
        }
    }
}
