use std::sync::Arc;

use crate::geometry::{
    Aabb, FloatType, INTERSECTION_EPSILON, Ray, TexturePoint, WorldPoint, WorldVector,
};
use crate::scene::{HitPayload, Intersection, Primitive};
use crate::shading::SurfaceShader;

fn surface_hit(ray: &Ray, distance: FloatType) -> Intersection {
    Intersection {
        distance,
        payload: HitPayload::Surface {
            point: ray.point_at(distance),
        },
    }
}

fn hit_point(hit: Intersection) -> WorldPoint {
    match hit.payload {
        HitPayload::Surface { point } => point,
        HitPayload::Nested { .. } => unreachable!("basic primitives produce surface payloads"),
    }
}

pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
    pub shader: Arc<dyn SurfaceShader>,
}

impl Primitive for Sphere {
    fn intersect(&self, ray: &Ray, best_distance: FloatType) -> Option<Intersection> {
        let to_origin = ray.origin - self.center;

        // Quadratic in the ray parameter; the direction is not assumed to
        // be normalized.
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&to_origin);
        let c = to_origin.dot(&to_origin) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_discriminant = discriminant.sqrt();

        // Prefer the near root, fall back to the far one when the ray
        // starts inside the sphere.
        let mut distance = (-b - sqrt_discriminant) / (2.0 * a);
        if distance <= INTERSECTION_EPSILON {
            distance = (-b + sqrt_discriminant) / (2.0 * a);
        }

        if distance <= INTERSECTION_EPSILON || distance >= best_distance {
            return None;
        }

        Some(surface_hit(ray, distance))
    }

    fn shader(&self, hit: Intersection) -> Box<dyn SurfaceShader> {
        let point = hit_point(hit);
        let local = (point - self.center) / self.radius;

        let mut shader = self.shader.clone_boxed();
        shader.set_position(&point);
        shader.set_normal(&local);
        shader.set_texture_coord(&TexturePoint::new(
            0.5 + local.z.atan2(local.x) / std::f32::consts::TAU,
            0.5 - local.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI,
        ));
        shader
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let half = WorldVector::new(self.radius, self.radius, self.radius);
        Some(Aabb::new(self.center - half, self.center + half))
    }
}

pub struct InfinitePlane {
    normal: WorldVector,
    /// Signed distance term of the plane equation `normal . p = offset`.
    offset: FloatType,
    shader: Arc<dyn SurfaceShader>,
}

impl InfinitePlane {
    pub fn new(
        point: WorldPoint,
        normal: WorldVector,
        shader: Arc<dyn SurfaceShader>,
    ) -> InfinitePlane {
        InfinitePlane {
            normal,
            offset: normal.dot(&point.coords),
            shader,
        }
    }
}

impl Primitive for InfinitePlane {
    fn intersect(&self, ray: &Ray, best_distance: FloatType) -> Option<Intersection> {
        let divisor = self.normal.dot(&ray.direction);
        if divisor.abs() < 1e-5 {
            // Parallel to the plane.
            return None;
        }

        let distance = (self.offset - self.normal.dot(&ray.origin.coords)) / divisor;
        if distance <= INTERSECTION_EPSILON || distance >= best_distance {
            return None;
        }

        Some(surface_hit(ray, distance))
    }

    fn shader(&self, hit: Intersection) -> Box<dyn SurfaceShader> {
        let point = hit_point(hit);
        let mut shader = self.shader.clone_boxed();
        shader.set_position(&point);
        shader.set_normal(&self.normal);
        shader
    }

    fn bounding_box(&self) -> Option<Aabb> {
        None
    }
}

pub struct Triangle {
    pub vertices: [WorldPoint; 3],
    pub shader: Arc<dyn SurfaceShader>,
}

impl Primitive for Triangle {
    fn intersect(&self, ray: &Ray, best_distance: FloatType) -> Option<Intersection> {
        // Moller-Trumbore.
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];

        let p = ray.direction.cross(&edge2);
        let determinant = edge1.dot(&p);
        if determinant.abs() < 1e-7 {
            return None;
        }
        let inv_determinant = 1.0 / determinant;

        let to_origin = ray.origin - self.vertices[0];
        let u = to_origin.dot(&p) * inv_determinant;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = to_origin.cross(&edge1);
        let v = ray.direction.dot(&q) * inv_determinant;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = edge2.dot(&q) * inv_determinant;
        if distance <= INTERSECTION_EPSILON || distance >= best_distance {
            return None;
        }

        Some(surface_hit(ray, distance))
    }

    fn shader(&self, hit: Intersection) -> Box<dyn SurfaceShader> {
        let point = hit_point(hit);
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];

        let mut shader = self.shader.clone_boxed();
        shader.set_position(&point);
        shader.set_normal(&edge1.cross(&edge2));
        shader
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let mut bbox = Aabb::empty();
        for vertex in &self.vertices {
            bbox.extend_point(vertex);
        }
        Some(bbox)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::test::{NonzeroWorldVectorWrapper, WorldPointWrapper};
    use crate::shading::phong::AmbientShader;
    use crate::util::Color;
    use assert2::assert;
    use proptest::prelude::*;
    use test_strategy::proptest;

    fn shader() -> Arc<dyn SurfaceShader> {
        Arc::new(AmbientShader::new(Color::new(1.0, 1.0, 1.0)))
    }

    fn unit_sphere() -> Sphere {
        Sphere {
            center: WorldPoint::origin(),
            radius: 1.0,
            shader: shader(),
        }
    }

    #[test]
    fn sphere_head_on_hit_distance() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 0.0, 5.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        let hit = unit_sphere().intersect(&ray, FloatType::INFINITY).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_hit_from_inside_uses_the_far_root() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(0.0, 0.0, -1.0));
        let hit = unit_sphere().intersect(&ray, FloatType::INFINITY).unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_behind_the_ray_misses() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 0.0, 5.0),
            WorldVector::new(0.0, 0.0, 1.0),
        );
        assert!(unit_sphere().intersect(&ray, FloatType::INFINITY).is_none());
    }

    #[test]
    fn sphere_respects_best_distance() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 0.0, 5.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        assert!(unit_sphere().intersect(&ray, 3.5).is_none());
    }

    #[test]
    fn sphere_scales_with_unnormalized_direction() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 0.0, 5.0),
            WorldVector::new(0.0, 0.0, -2.0),
        );
        let hit = unit_sphere().intersect(&ray, FloatType::INFINITY).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_shader_gets_an_outward_normal() {
        let sphere = unit_sphere();
        let ray = Ray::new(
            WorldPoint::new(0.0, 0.0, 5.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        let hit = sphere.intersect(&ray, FloatType::INFINITY).unwrap();
        // Exercises the setter path; AmbientShader ignores the values but
        // materialization must not panic.
        let shader = sphere.shader(hit);
        assert!(shader.ambient_coefficient() == Color::new(1.0, 1.0, 1.0));
    }

    #[proptest]
    fn sphere_hit_lies_on_the_surface(
        origin: WorldPointWrapper,
        direction: NonzeroWorldVectorWrapper,
    ) {
        let sphere = unit_sphere();
        let ray = Ray::new(*origin, *direction);
        if let Some(hit) = sphere.intersect(&ray, FloatType::INFINITY) {
            let point = ray.point_at(hit.distance);
            prop_assert!(((point - sphere.center).norm() - sphere.radius).abs() < 1e-3);
        }
    }

    fn floor_plane() -> InfinitePlane {
        InfinitePlane::new(
            WorldPoint::origin(),
            WorldVector::new(0.0, 1.0, 0.0),
            shader(),
        )
    }

    #[test]
    fn plane_head_on_hit_distance() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 5.0, 0.0),
            WorldVector::new(0.0, -1.0, 0.0),
        );
        let hit = floor_plane().intersect(&ray, FloatType::INFINITY).unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn parallel_ray_misses_the_plane() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 5.0, 0.0),
            WorldVector::new(1.0, 0.0, 0.0),
        );
        assert!(floor_plane().intersect(&ray, FloatType::INFINITY).is_none());
    }

    #[test]
    fn plane_behind_the_ray_misses() {
        let ray = Ray::new(
            WorldPoint::new(0.0, 5.0, 0.0),
            WorldVector::new(0.0, 1.0, 0.0),
        );
        assert!(floor_plane().intersect(&ray, FloatType::INFINITY).is_none());
    }

    #[test]
    fn plane_is_unbounded() {
        assert!(floor_plane().bounding_box().is_none());
    }

    fn xy_triangle() -> Triangle {
        Triangle {
            vertices: [
                WorldPoint::new(0.0, 0.0, 0.0),
                WorldPoint::new(2.0, 0.0, 0.0),
                WorldPoint::new(0.0, 2.0, 0.0),
            ],
            shader: shader(),
        }
    }

    #[test]
    fn triangle_interior_hit() {
        let ray = Ray::new(
            WorldPoint::new(0.5, 0.5, 3.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        let hit = xy_triangle().intersect(&ray, FloatType::INFINITY).unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn triangle_miss_outside_the_edges() {
        let ray = Ray::new(
            WorldPoint::new(1.5, 1.5, 3.0),
            WorldVector::new(0.0, 0.0, -1.0),
        );
        assert!(xy_triangle().intersect(&ray, FloatType::INFINITY).is_none());
    }

    #[test]
    fn triangle_edge_on_ray_misses() {
        let ray = Ray::new(
            WorldPoint::new(-1.0, 0.5, 0.0),
            WorldVector::new(1.0, 0.0, 0.0),
        );
        assert!(xy_triangle().intersect(&ray, FloatType::INFINITY).is_none());
    }

    #[test]
    fn triangle_bounding_box_covers_all_vertices() {
        let bbox = xy_triangle().bounding_box().unwrap();
        for vertex in xy_triangle().vertices {
            assert!(bbox.contains(&vertex));
        }
    }
}
