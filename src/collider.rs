//! Targeting tags and colliders for placed objects.
//!
//! Every spawned object gets [`PlacedRoot`] on its root and [`PlacedPart`]
//! on each renderable child. Parts get a [`PartCollider`] built from their
//! mesh when it is readable, otherwise a bounding box.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::*;

use crate::error::ColliderError;

/// Tag for the root entity of a placed object.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlacedRoot;

/// Tag for a renderable part of a placed object.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlacedPart;

/// Axis-aligned box in the owner's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Box centred at the origin with unit size.
    pub const UNIT: Self = Self {
        min: Vec3::splat(-0.5),
        max: Vec3::splat(0.5),
    };

    /// Smallest box containing every point. `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Centre of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The eight corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }

    /// Box containing this box after `transform` is applied.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self::from_points(self.corners().map(|c| transform.transform_point(c))).unwrap_or(*self)
    }
}

/// Collision shape attached to a placed object's root or part.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum PartCollider {
    /// Built from the part's own vertices.
    Mesh {
        /// Triangles in local space. Empty for non-triangle topologies, in
        /// which case the bounds stand in for them.
        triangles: Vec<[Vec3; 3]>,
        /// Bounds of the vertices.
        bounds: BoundingBox,
    },
    /// Box fallback.
    Bounds(BoundingBox),
}

impl PartCollider {
    /// Local-space bounds of the shape.
    pub fn bounds(&self) -> BoundingBox {
        match self {
            PartCollider::Mesh { bounds, .. } => *bounds,
            PartCollider::Bounds(bounds) => *bounds,
        }
    }

    /// Whether this is the box fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, PartCollider::Bounds(_))
    }
}

fn positions(mesh: &Mesh) -> Result<&[[f32; 3]], ColliderError> {
    match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(positions)) => Ok(positions),
        Some(_) => Err(ColliderError::UnsupportedPositions),
        None => Err(ColliderError::MissingPositions),
    }
}

/// Builds a collider from a mesh's vertices.
pub fn try_mesh_collider(mesh: Option<&Mesh>) -> Result<PartCollider, ColliderError> {
    let mesh = mesh.ok_or(ColliderError::MissingMesh)?;
    if !mesh.asset_usage.contains(RenderAssetUsages::MAIN_WORLD) {
        return Err(ColliderError::NotReadable);
    }
    let vertices: Vec<Vec3> = positions(mesh)?.iter().copied().map(Vec3::from).collect();
    let bounds = BoundingBox::from_points(vertices.iter().copied()).ok_or(ColliderError::Empty)?;
    Ok(PartCollider::Mesh {
        triangles: triangles(mesh, &vertices),
        bounds,
    })
}

fn triangles(mesh: &Mesh, vertices: &[Vec3]) -> Vec<[Vec3; 3]> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return Vec::new();
    }
    match mesh.indices() {
        Some(indices) => {
            let corner = |i: usize| vertices.get(i).copied();
            let indices: Vec<usize> = indices.iter().collect();
            indices
                .chunks_exact(3)
                .filter_map(|t| Some([corner(t[0])?, corner(t[1])?, corner(t[2])?]))
                .collect()
        }
        None => vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect(),
    }
}

/// Builds the best collider available for a part.
///
/// Falls back to the bounds of whatever vertex data can be read, then to a
/// unit box. Never fails.
pub fn build_part_collider(name: &str, mesh: Option<&Mesh>) -> PartCollider {
    match try_mesh_collider(mesh) {
        Ok(collider) => collider,
        Err(err) => {
            warn!("part '{name}': {err}, using a box collider");
            let bounds = mesh
                .filter(|m| m.asset_usage.contains(RenderAssetUsages::MAIN_WORLD))
                .and_then(|m| positions(m).ok())
                .and_then(|p| BoundingBox::from_points(p.iter().copied().map(Vec3::from)))
                .unwrap_or(BoundingBox::UNIT);
            PartCollider::Bounds(bounds)
        }
    }
}

/// Bounds of a root given its parts' colliders and local offsets.
pub fn root_bounds<'a>(
    parts: impl IntoIterator<Item = (&'a PartCollider, &'a Transform)>,
) -> Option<BoundingBox> {
    parts
        .into_iter()
        .map(|(collider, offset)| collider.bounds().transformed(offset))
        .reduce(|a, b| a.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::mesh::Indices;

    fn triangle(usage: RenderAssetUsages) -> Mesh {
        Mesh::new(PrimitiveTopology::TriangleList, usage).with_inserted_attribute(
            Mesh::ATTRIBUTE_POSITION,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, -1.0]],
        )
    }

    #[test]
    fn readable_mesh_gives_precise_collider() {
        let mesh = triangle(RenderAssetUsages::default());
        let collider = build_part_collider("shaft", Some(&mesh));
        let PartCollider::Mesh { triangles, bounds } = collider else {
            panic!("expected a mesh collider");
        };
        assert_eq!(triangles, vec![[Vec3::ZERO, Vec3::X, Vec3::new(0.0, 2.0, -1.0)]]);
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn indexed_mesh_triangles_follow_indices() {
        let quad = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(
                Mesh::ATTRIBUTE_POSITION,
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            )
            .with_inserted_indices(Indices::U16(vec![0, 1, 2, 0, 2, 3]));
        let Ok(PartCollider::Mesh { triangles, .. }) = try_mesh_collider(Some(&quad)) else {
            panic!("expected a mesh collider");
        };
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1], [Vec3::ZERO, Vec3::ONE.with_z(0.0), Vec3::Y]);

        let points = Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let Ok(PartCollider::Mesh { triangles, bounds }) = try_mesh_collider(Some(&points)) else {
            panic!("expected a mesh collider");
        };
        assert!(triangles.is_empty());
        assert_eq!(bounds.size(), Vec3::ONE);
    }

    #[test]
    fn render_only_mesh_falls_back_to_unit_box() {
        let mesh = triangle(RenderAssetUsages::RENDER_WORLD);
        assert_eq!(try_mesh_collider(Some(&mesh)), Err(ColliderError::NotReadable));
        assert_eq!(build_part_collider("head", Some(&mesh)), PartCollider::Bounds(BoundingBox::UNIT));
    }

    #[test]
    fn missing_mesh_falls_back_to_unit_box() {
        assert_eq!(try_mesh_collider(None), Err(ColliderError::MissingMesh));
        let collider = build_part_collider("condyle", None);
        assert!(collider.is_fallback());
        assert_eq!(collider.bounds().size(), Vec3::ONE);
    }

    #[test]
    fn mesh_without_positions_falls_back() {
        let mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        assert_eq!(try_mesh_collider(Some(&mesh)), Err(ColliderError::MissingPositions));
        assert!(build_part_collider("empty", Some(&mesh)).is_fallback());
    }

    #[test]
    fn root_bounds_unions_offset_parts() {
        let a = PartCollider::Bounds(BoundingBox::UNIT);
        let b = PartCollider::Bounds(BoundingBox::UNIT);
        let at_origin = Transform::IDENTITY;
        let raised = Transform::from_xyz(0.0, 2.0, 0.0).with_scale(Vec3::splat(2.0));

        let bounds = root_bounds([(&a, &at_origin), (&b, &raised)]).unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -0.5, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 3.0, 1.0));
        assert!(root_bounds(std::iter::empty()).is_none());
    }
}
