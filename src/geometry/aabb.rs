use super::{FloatType, Ray, WorldPoint, WorldVector};

/// Axis aligned bounding box.
///
/// The empty box is a canonical sentinel (min = +inf, max = -inf) that
/// snaps to any point or box on the first `extend`.
#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

impl Aabb {
    pub fn new(min: WorldPoint, max: WorldPoint) -> Aabb {
        Aabb { min, max }
    }

    pub fn empty() -> Aabb {
        Aabb {
            min: WorldPoint::new(
                FloatType::INFINITY,
                FloatType::INFINITY,
                FloatType::INFINITY,
            ),
            max: WorldPoint::new(
                FloatType::NEG_INFINITY,
                FloatType::NEG_INFINITY,
                FloatType::NEG_INFINITY,
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend_point(&mut self, point: &WorldPoint) {
        self.min = self.min.coords.inf(&point.coords).into();
        self.max = self.max.coords.sup(&point.coords).into();
    }

    pub fn extend_box(&mut self, other: &Aabb) {
        self.min = self.min.coords.inf(&other.min.coords).into();
        self.max = self.max.coords.sup(&other.max.coords).into();
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut ret = self.clone();
        ret.extend_box(other);
        ret
    }

    pub fn diagonal(&self) -> WorldVector {
        self.max - self.min
    }

    /// Midpoint of the box. Meaningless for the empty sentinel.
    pub fn centroid(&self) -> WorldPoint {
        ((self.min.coords + self.max.coords) * 0.5).into()
    }

    pub fn contains(&self, point: &WorldPoint) -> bool {
        self.min.x <= point.x
            && self.min.y <= point.y
            && self.min.z <= point.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }

    /// Calculates ray intersection with the box using the slab method.
    /// Returns minimum and maximum distance along the ray; the ray
    /// intersects iff min <= max. Distances are in units of the ray
    /// direction length and may be negative.
    pub fn intersect(&self, ray: &Ray) -> (FloatType, FloatType) {
        // The multiplication is NaN if the ray starts inside the slab's
        // bounding plane and is parallel to it. Blend to +-infinity so the
        // slab interval becomes infinite on that axis.
        let to_min = (self.min - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { FloatType::NEG_INFINITY } else { x });
        let to_max = (self.max - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { FloatType::INFINITY } else { x });

        let near = to_min.zip_map(&to_max, FloatType::min);
        let far = to_min.zip_map(&to_max, FloatType::max);

        (near.max(), far.min())
    }
}

impl Default for Aabb {
    fn default() -> Aabb {
        Aabb::empty()
    }
}
