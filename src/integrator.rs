use assert2::debug_assert;

use crate::geometry::{FloatType, INTERSECTION_EPSILON, Ray, WorldPoint};
use crate::scene::{GeometryGroup, Primitive as _};
use crate::util::Color;

/// A point light source. `falloff` combines inverse-square, inverse-linear
/// and constant attenuation.
#[derive(Clone, Debug)]
pub struct PointLight {
    pub position: WorldPoint,
    pub intensity: Color,
    pub falloff: Falloff,
}

#[derive(Copy, Clone, Debug)]
pub struct Falloff {
    pub quadratic: FloatType,
    pub linear: FloatType,
    pub constant: FloatType,
}

impl Falloff {
    pub const CONSTANT: Falloff = Falloff {
        quadratic: 0.0,
        linear: 0.0,
        constant: 1.0,
    };

    pub const INVERSE_SQUARE: Falloff = Falloff {
        quadratic: 1.0,
        linear: 0.0,
        constant: 0.0,
    };

    pub fn eval(&self, distance: FloatType) -> FloatType {
        self.quadratic / (distance * distance) + self.linear / distance + self.constant
    }
}

/// Approximates a square area light with a `density` x `density` grid of
/// point lights sharing the total intensity. `corner` is the grid corner,
/// `width` the square's edge length; the square is parallel to the XY plane.
pub fn area_light_grid(
    intensity: Color,
    density: u32,
    corner: WorldPoint,
    width: FloatType,
) -> Vec<PointLight> {
    let step = width / density as FloatType;
    let shared_intensity = intensity / (density * density) as FloatType;

    let mut lights = Vec::with_capacity((density * density) as usize);
    for y in 0..density {
        for x in 0..density {
            lights.push(PointLight {
                position: corner
                    + crate::geometry::WorldVector::new(
                        (x as FloatType + 0.5) * step,
                        (y as FloatType + 0.5) * step,
                        0.0,
                    ),
                intensity: shared_intensity,
                falloff: Falloff::CONSTANT,
            });
        }
    }
    lights
}

/// Limits for recursive radiance evaluation. The contribution threshold is
/// the workhorse; the depth cap is the backstop for paths whose contribution
/// does not decay (a box of perfect mirrors).
#[derive(Copy, Clone, Debug)]
pub struct TerminationPolicy {
    pub max_depth: u32,
    pub min_contribution: FloatType,
}

impl Default for TerminationPolicy {
    fn default() -> TerminationPolicy {
        TerminationPolicy {
            max_depth: 10,
            min_contribution: 0.05,
        }
    }
}

/// Mutable state of one primary ray's evaluation tree.
///
/// Created fresh per primary ray and threaded through every recursive
/// radiance call, so concurrent primary rays can never observe each other's
/// depth or contribution.
#[derive(Clone, Debug)]
pub struct PathState {
    policy: TerminationPolicy,
    depth: u32,
    /// Product of all attenuation factors along the current path.
    surviving: FloatType,
    /// Products saved by `push_attenuation`, restored on pop. Restoring the
    /// saved value instead of dividing avoids floating point drift.
    saved: Vec<FloatType>,
}

impl PathState {
    pub fn new(policy: TerminationPolicy) -> PathState {
        PathState {
            policy,
            depth: 0,
            surviving: 1.0,
            saved: Vec::new(),
        }
    }

    /// Registers entry into one radiance evaluation. Returns false when the
    /// policy refuses further recursion; in that case `leave` must not be
    /// called.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= self.policy.max_depth || self.surviving < self.policy.min_contribution {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// Registers the weight of a recursive contribution about to be
    /// evaluated. Must be paired with `pop_attenuation`.
    pub fn push_attenuation(&mut self, factor: FloatType) {
        self.saved.push(self.surviving);
        self.surviving *= factor;
    }

    pub fn pop_attenuation(&mut self) {
        self.surviving = self
            .saved
            .pop()
            .expect("pop_attenuation without matching push");
    }
}

/// The recursive integrator interface shaders call back into.
pub trait Integrator: Send + Sync {
    /// Radiance arriving along the ray, subject to the termination state.
    fn radiance(&self, ray: &Ray, state: &mut PathState) -> Color;

    fn termination(&self) -> TerminationPolicy;

    /// Evaluates one primary ray with a fresh evaluation tree.
    fn primary_radiance(&self, ray: &Ray) -> Color {
        let mut state = PathState::new(self.termination());
        self.radiance(ray, &mut state)
    }
}

/// Whitted-style integrator: direct lighting from point lights with shadow
/// tests, a flat ambient term, and recursive indirect radiance delegated to
/// the shader.
pub struct WhittedIntegrator {
    pub scene: GeometryGroup,
    pub lights: Vec<PointLight>,
    pub ambient_light: Color,
    pub termination: TerminationPolicy,
}

/// Shadow rays are built so the light sits at parametric distance 1; any
/// hit meaningfully before that is a blocker. Querying slightly past the
/// light keeps hits just behind it from being reported at all.
const SHADOW_QUERY_DISTANCE: FloatType = 1.1;

impl WhittedIntegrator {
    pub fn new(scene: GeometryGroup) -> WhittedIntegrator {
        WhittedIntegrator {
            scene,
            lights: Vec::new(),
            ambient_light: Color::zeros(),
            termination: TerminationPolicy::default(),
        }
    }

    fn light_visible(&self, point: &WorldPoint, light_position: &WorldPoint) -> bool {
        let shadow_ray = Ray::new(*point, light_position - point);
        match self.scene.intersect(&shadow_ray, SHADOW_QUERY_DISTANCE) {
            None => true,
            Some(hit) => hit.distance >= 1.0 - INTERSECTION_EPSILON,
        }
    }
}

impl Integrator for WhittedIntegrator {
    fn radiance(&self, ray: &Ray, state: &mut PathState) -> Color {
        if !state.enter() {
            return Color::zeros();
        }

        let mut color = Color::zeros();

        if let Some(hit) = self.scene.intersect(ray, FloatType::INFINITY) {
            let point = ray.point_at(hit.distance);
            let shader = self.scene.shader(hit);

            color += shader.ambient_coefficient().component_mul(&self.ambient_light);

            for light in &self.lights {
                if self.light_visible(&point, &light.position) {
                    let to_light = light.position - point;
                    let reflectance = shader.reflectance(&-ray.direction, &to_light);
                    let falloff = light.falloff.eval(to_light.norm());
                    color += reflectance.component_mul(&light.intensity) * falloff;
                }
            }

            color += shader.indirect_radiance(&-ray.direction, self, state);
        }

        state.leave();
        color
    }

    fn termination(&self) -> TerminationPolicy {
        self.termination
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::WorldVector;
    use crate::scene::primitives::{InfinitePlane, Sphere};
    use crate::shading::phong::{AmbientShader, MirrorPhongShader, PhongShader};
    use crate::shading::{Shader, SurfaceShader, impl_clone_boxed};
    use assert2::assert;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_depth: u32, min_contribution: FloatType) -> TerminationPolicy {
        TerminationPolicy {
            max_depth,
            min_contribution,
        }
    }

    #[test]
    fn path_state_depth_cap() {
        let mut state = PathState::new(policy(2, 0.0));
        assert!(state.enter());
        assert!(state.enter());
        assert!(!state.enter());
        state.leave();
        assert!(state.enter());
    }

    #[test]
    fn path_state_contribution_threshold() {
        let mut state = PathState::new(policy(100, 0.05));
        state.push_attenuation(0.5);
        state.push_attenuation(0.5);
        state.push_attenuation(0.5);
        state.push_attenuation(0.5);
        assert!(state.enter());
        state.leave();
        state.push_attenuation(0.5);
        assert!(!state.enter());

        // Popping restores the previous product exactly.
        state.pop_attenuation();
        assert!(state.enter());
    }

    #[test]
    fn falloff_formula() {
        let falloff = Falloff {
            quadratic: 4.0,
            linear: 2.0,
            constant: 0.5,
        };
        assert!((falloff.eval(2.0) - (1.0 + 1.0 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn area_light_grid_distributes_intensity() {
        let lights = area_light_grid(
            Color::new(9.0, 9.0, 9.0),
            3,
            WorldPoint::new(0.0, 0.0, 5.0),
            3.0,
        );
        assert!(lights.len() == 9);
        for light in &lights {
            assert!(light.intensity == Color::new(1.0, 1.0, 1.0));
            assert!(light.position.z == 5.0);
        }
    }

    fn diffuse_floor_scene() -> WhittedIntegrator {
        let shader = Arc::new(PhongShader {
            diffuse: Color::new(1.0, 1.0, 1.0),
            specular: Color::zeros(),
            ambient: Color::new(0.2, 0.2, 0.2),
            exponent: 1.0,
            ..PhongShader::default()
        });

        let mut scene = GeometryGroup::new();
        scene.primitives.push(Arc::new(InfinitePlane::new(
            WorldPoint::origin(),
            WorldVector::new(0.0, 1.0, 0.0),
            shader,
        )));
        scene.rebuild_index();

        let mut integrator = WhittedIntegrator::new(scene);
        integrator.lights.push(PointLight {
            position: WorldPoint::new(0.0, 3.0, 0.0),
            intensity: Color::new(1.0, 1.0, 1.0),
            falloff: Falloff::CONSTANT,
        });
        integrator
    }

    fn primary_ray() -> Ray {
        // Hits the floor at the origin, light straight above the hit point.
        Ray::new(
            WorldPoint::new(0.0, 4.0, 4.0),
            WorldVector::new(0.0, -1.0, -1.0),
        )
    }

    #[test]
    fn unoccluded_light_contributes_reflectance_times_falloff_times_intensity() {
        let integrator = diffuse_floor_scene();
        let color = integrator.primary_radiance(&primary_ray());

        // Diffuse reflectance with the light straight up: cosine term is 1.
        assert!((color.x - 1.0).abs() < 1e-4);
        assert!((color.y - 1.0).abs() < 1e-4);
        assert!((color.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn occluded_light_contributes_exactly_zero() {
        let mut integrator = diffuse_floor_scene();
        // Opaque sphere halfway between the hit point and the light.
        integrator.scene.primitives.push(Arc::new(Sphere {
            center: WorldPoint::new(0.0, 1.5, 0.0),
            radius: 0.5,
            shader: Arc::new(AmbientShader::new(Color::zeros())),
        }));
        integrator.scene.rebuild_index();

        let color = integrator.primary_radiance(&primary_ray());
        assert!(color == Color::zeros());
    }

    #[test]
    fn falloff_scales_direct_lighting() {
        let mut integrator = diffuse_floor_scene();
        integrator.lights[0].falloff = Falloff::INVERSE_SQUARE;

        let color = integrator.primary_radiance(&primary_ray());
        // Light distance is 3, so inverse square falloff gives 1/9.
        assert!((color.x - 1.0 / 9.0).abs() < 1e-4);
    }

    #[test]
    fn ambient_term_uses_global_ambient_light() {
        let mut integrator = diffuse_floor_scene();
        integrator.lights.clear();
        integrator.ambient_light = Color::new(0.5, 0.5, 0.5);

        let color = integrator.primary_radiance(&primary_ray());
        // Shader ambient coefficient 0.2 times global 0.5.
        assert!((color.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn miss_returns_zero() {
        let mut scene = GeometryGroup::new();
        scene.rebuild_index();
        let integrator = WhittedIntegrator::new(scene);

        let color = integrator.primary_radiance(&Ray::new(
            WorldPoint::origin(),
            WorldVector::new(0.0, 0.0, -1.0),
        ));
        assert!(color == Color::zeros());
    }

    fn mirror_box_scene(reflectivity: FloatType, termination: TerminationPolicy) -> WhittedIntegrator {
        let mirror = |normal: WorldVector, origin: WorldPoint| {
            let mut shader = MirrorPhongShader::new();
            shader.reflectivity = reflectivity;
            Arc::new(InfinitePlane::new(origin, normal, Arc::new(shader)))
        };

        let mut scene = GeometryGroup::new();
        scene.primitives.push(mirror(
            WorldVector::new(0.0, 0.0, 1.0),
            WorldPoint::new(0.0, 0.0, -1.0),
        ));
        scene.primitives.push(mirror(
            WorldVector::new(0.0, 0.0, -1.0),
            WorldPoint::new(0.0, 0.0, 1.0),
        ));
        scene.rebuild_index();

        let mut integrator = WhittedIntegrator::new(scene);
        integrator.termination = termination;
        integrator
    }

    #[test]
    fn facing_mirrors_terminate_under_depth_cap() {
        // Perfect mirrors: contribution never decays, only the depth cap
        // can stop the recursion.
        let integrator = mirror_box_scene(1.0, policy(12, 0.05));
        let color = integrator.primary_radiance(&Ray::new(
            WorldPoint::origin(),
            WorldVector::new(0.0, 0.0, 1.0),
        ));
        assert!(color.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn facing_mirrors_terminate_under_contribution_threshold() {
        let integrator = mirror_box_scene(0.5, policy(1_000_000, 0.05));
        let color = integrator.primary_radiance(&Ray::new(
            WorldPoint::origin(),
            WorldVector::new(0.0, 0.0, 1.0),
        ));
        assert!(color.iter().all(|c| c.is_finite()));
    }

    /// Mirror shader that counts how many times it was asked for indirect
    /// radiance, to observe the actual recursion depth.
    #[derive(Clone)]
    struct CountingMirror {
        calls: Arc<AtomicU32>,
        position: WorldPoint,
        normal: WorldVector,
    }

    impl Shader for CountingMirror {
        fn indirect_radiance(
            &self,
            out_dir: &WorldVector,
            integrator: &dyn Integrator,
            state: &mut PathState,
        ) -> Color {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let normal = self.normal.normalize();
            let reflected = normal * (2.0 * normal.dot(out_dir)) - out_dir;
            state.push_attenuation(1.0);
            let color = integrator.radiance(&Ray::new(self.position, reflected), state);
            state.pop_attenuation();
            color
        }
    }

    impl SurfaceShader for CountingMirror {
        impl_clone_boxed!();

        fn set_position(&mut self, point: &WorldPoint) {
            self.position = *point;
        }

        fn set_normal(&mut self, normal: &WorldVector) {
            self.normal = *normal;
        }
    }

    #[test]
    fn recursion_stops_exactly_at_the_depth_cap() {
        let calls = Arc::new(AtomicU32::new(0));
        let prototype = CountingMirror {
            calls: Arc::clone(&calls),
            position: WorldPoint::origin(),
            normal: WorldVector::new(0.0, 0.0, 1.0),
        };

        let mut scene = GeometryGroup::new();
        scene.primitives.push(Arc::new(InfinitePlane::new(
            WorldPoint::new(0.0, 0.0, -1.0),
            WorldVector::new(0.0, 0.0, 1.0),
            Arc::new(prototype.clone()),
        )));
        scene.primitives.push(Arc::new(InfinitePlane::new(
            WorldPoint::new(0.0, 0.0, 1.0),
            WorldVector::new(0.0, 0.0, -1.0),
            Arc::new(prototype),
        )));
        scene.rebuild_index();

        let mut integrator = WhittedIntegrator::new(scene);
        integrator.termination = policy(7, 0.0);

        integrator.primary_radiance(&Ray::new(
            WorldPoint::origin(),
            WorldVector::new(0.0, 0.0, 1.0),
        ));

        // One indirect query per radiance evaluation that found a hit.
        assert!(calls.load(Ordering::Relaxed) == 7);
    }
}
