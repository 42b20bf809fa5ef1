pub mod bvh;
pub mod primitives;

use std::sync::Arc;

use crate::geometry::{Aabb, FloatType, INTERSECTION_EPSILON, Ray, WorldPoint};
use crate::shading::SurfaceShader;

pub use bvh::Bvh;

/// Result of a successful ray/primitive intersection.
///
/// The payload is owned by the intersection and consumed exactly once when
/// the shader is materialized for this hit.
#[derive(Clone, Debug)]
pub struct Intersection {
    /// Parametric distance along the ray, in units of the ray direction.
    pub distance: FloatType,
    pub payload: HitPayload,
}

/// Opaque per-primitive hit data, interpreted only by the primitive that
/// produced it.
#[derive(Clone, Debug)]
pub enum HitPayload {
    /// Hit point on a concrete surface.
    Surface { point: WorldPoint },
    /// A hit inside a nested group: index of the inner primitive and its
    /// own intersection result.
    Nested {
        primitive: usize,
        inner: Box<Intersection>,
    },
}

/// Anything that can be hit by a ray and shaded.
pub trait Primitive: Send + Sync {
    /// Intersects the primitive with a ray. `best_distance` is the closest
    /// hit known so far; intersections at or beyond it can be skipped.
    fn intersect(&self, ray: &Ray, best_distance: FloatType) -> Option<Intersection>;

    /// Materializes a shader for the given hit: clones the prototype and
    /// configures it with the hit position, normal and texture coordinates.
    fn shader(&self, hit: Intersection) -> Box<dyn SurfaceShader>;

    /// Bounding box of the primitive, or `None` for unbounded primitives
    /// that cannot be indexed.
    fn bounding_box(&self) -> Option<Aabb>;
}

/// A group of geometry. Bounded members are indexed in a BVH, unbounded ones
/// are scanned linearly on every query. Since the group is itself a
/// primitive, groups can nest.
///
/// `rebuild_index` must be called after any mutation of `primitives` and
/// before the first query; a stale index is not detected.
#[derive(Default)]
pub struct GeometryGroup {
    pub primitives: Vec<Arc<dyn Primitive>>,
    index: Option<GroupIndex>,
}

struct GroupIndex {
    bvh: Bvh,
    /// Indices into `primitives` for the BVH's local leaf indices.
    indexed: Vec<usize>,
    /// Indices of unbounded primitives, scanned linearly.
    unindexed: Vec<usize>,
}

impl GeometryGroup {
    pub fn new() -> GeometryGroup {
        GeometryGroup::default()
    }

    /// Partitions primitives into indexed and unindexed sets and rebuilds
    /// the BVH. Never called implicitly.
    pub fn rebuild_index(&mut self) {
        let mut indexed = Vec::new();
        let mut unindexed = Vec::new();
        let mut boxes = Vec::new();

        for (i, primitive) in self.primitives.iter().enumerate() {
            match primitive.bounding_box() {
                Some(bbox) => {
                    indexed.push(i);
                    boxes.push(bbox);
                }
                None => unindexed.push(i),
            }
        }

        let bvh = Bvh::build(&boxes);
        log::debug!(
            "rebuilt geometry index: {} indexed, {} unindexed primitives",
            indexed.len(),
            unindexed.len()
        );
        bvh.log_statistics();

        self.index = Some(GroupIndex {
            bvh,
            indexed,
            unindexed,
        });
    }

    fn index(&self) -> &GroupIndex {
        self.index
            .as_ref()
            .expect("GeometryGroup queried before rebuild_index()")
    }
}

impl Primitive for GeometryGroup {
    fn intersect(&self, ray: &Ray, best_distance: FloatType) -> Option<Intersection> {
        let index = self.index();

        let mut best_distance = best_distance;
        let mut best: Option<(usize, Intersection)> = None;

        if let Some((local, hit)) = index.bvh.intersect(ray, best_distance, |local, best| {
            self.primitives[index.indexed[local as usize]].intersect(ray, best)
        }) {
            best_distance = hit.distance;
            best = Some((index.indexed[local as usize], hit));
        }

        for &i in &index.unindexed {
            if let Some(hit) = self.primitives[i].intersect(ray, best_distance)
                && hit.distance > INTERSECTION_EPSILON
                && hit.distance < best_distance
            {
                best_distance = hit.distance;
                best = Some((i, hit));
            }
        }

        best.map(|(primitive, inner)| Intersection {
            distance: inner.distance,
            payload: HitPayload::Nested {
                primitive,
                inner: Box::new(inner),
            },
        })
    }

    fn shader(&self, hit: Intersection) -> Box<dyn SurfaceShader> {
        match hit.payload {
            HitPayload::Nested { primitive, inner } => self.primitives[primitive].shader(*inner),
            HitPayload::Surface { .. } => {
                unreachable!("GeometryGroup produces only nested hit payloads")
            }
        }
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let index = self.index();

        if !index.unindexed.is_empty() {
            return None;
        }

        Some(index.bvh.scene_bounding_box())
    }
}
