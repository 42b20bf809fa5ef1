mod aabb;

pub use aabb::Aabb;

pub type FloatType = f32;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;

pub type ScreenPoint = nalgebra::Point2<u32>;
pub type ScreenSize = nalgebra::Vector2<u32>;

pub type TexturePoint = nalgebra::Point2<FloatType>;

/// Minimum parametric distance for a valid hit. Rejects spurious
/// re-intersections of the surface a ray was spawned from.
pub const INTERSECTION_EPSILON: FloatType = 1e-4;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,

    /// Direction of the ray. Deliberately kept as given: shadow rays use
    /// direction = light - point, so that distance 1.0 lands on the light.
    pub direction: WorldVector,

    /// Componentwise inverse of the ray direction.
    /// Zeros in direction get turned into positive infinity regardless of the sign of the zero
    pub inv_direction: WorldVector,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        let inv_direction = direction.map(|x| if x == 0.0 { FloatType::INFINITY } else { 1.0 / x });

        Ray {
            origin,
            direction,
            inv_direction,
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }
}
