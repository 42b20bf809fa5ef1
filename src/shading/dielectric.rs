use super::phong::PhongShader;
use super::{Shader, SurfaceShader, impl_clone_boxed};
use crate::geometry::{FloatType, Ray, WorldPoint, WorldVector};
use crate::integrator::{Integrator, PathState};
use crate::util::Color;

use assert2::debug_assert;

/// Fraction of light reflected at a dielectric boundary, for unpolarized
/// light. `cos_i` is the cosine of the incident angle on the `n1` side and
/// must be positive. Returns 1.0 on total internal reflection.
fn fresnel_reflectance(n1: FloatType, n2: FloatType, cos_i: FloatType) -> FloatType {
    debug_assert!(cos_i > 0.0);

    let sin2_t = (n1 / n2).powi(2) * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();

    // Amplitude coefficients for the parallel and perpendicular
    // polarizations, averaged after squaring.
    let r_parallel = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
    let r_perpendicular = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    (r_parallel * r_parallel + r_perpendicular * r_perpendicular) / 2.0
}

/// Blinn-Phong material with Fresnel-weighted reflection and refraction,
/// e.g. glass or water. Handles rays entering and leaving the medium,
/// including total internal reflection.
#[derive(Clone, Debug)]
pub struct DielectricPhongShader {
    pub base: PhongShader,
    /// Refractive index on the side the normal points towards.
    pub index_outside: FloatType,
    /// Refractive index on the opposite side.
    pub index_inside: FloatType,
    /// Filter applied to the transmitted radiance; below one the medium
    /// absorbs.
    pub transparency: Color,

    pub position: WorldPoint,
}

impl Default for DielectricPhongShader {
    fn default() -> DielectricPhongShader {
        DielectricPhongShader {
            base: PhongShader::default(),
            index_outside: 1.0,
            index_inside: 1.5,
            transparency: Color::new(1.0, 1.0, 1.0),
            position: WorldPoint::origin(),
        }
    }
}

impl DielectricPhongShader {
    pub fn new() -> DielectricPhongShader {
        DielectricPhongShader::default()
    }
}

impl Shader for DielectricPhongShader {
    fn reflectance(&self, out_dir: &WorldVector, in_dir: &WorldVector) -> Color {
        self.base.reflectance(out_dir, in_dir)
    }

    fn ambient_coefficient(&self) -> Color {
        self.base.ambient_coefficient()
    }

    fn indirect_radiance(
        &self,
        out_dir: &WorldVector,
        integrator: &dyn Integrator,
        state: &mut PathState,
    ) -> Color {
        let out_dir = out_dir.normalize();
        let mut normal = self.base.normal.normalize();
        let mut cos_i = normal.dot(&out_dir);

        // A negative cosine means the ray leaves the medium; swap sides so
        // that the rest of the math always sees the incident ray on the n1
        // side of a normal pointing towards it.
        let (n1, n2) = if cos_i >= 0.0 {
            (self.index_outside, self.index_inside)
        } else {
            normal = -normal;
            cos_i = -cos_i;
            (self.index_inside, self.index_outside)
        };

        let reflected = normal * (2.0 * cos_i) - out_dir;
        let reflectance = fresnel_reflectance(n1, n2, cos_i);

        let mut color = Color::zeros();

        if reflectance > 0.0 {
            state.push_attenuation(reflectance);
            color += integrator.radiance(&Ray::new(self.position, reflected), state) * reflectance;
            state.pop_attenuation();
        }

        let transmittance = 1.0 - reflectance;
        if transmittance > 0.0 {
            let eta = n1 / n2;
            let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
            let cos_t = (1.0 - sin2_t).sqrt();
            let refracted = out_dir * -eta + normal * (eta * cos_i - cos_t);

            state.push_attenuation(transmittance * self.transparency.max());
            let radiance = integrator.radiance(&Ray::new(self.position, refracted), state);
            state.pop_attenuation();

            color += radiance.component_mul(&self.transparency) * transmittance;
        }

        color
    }
}

impl SurfaceShader for DielectricPhongShader {
    impl_clone_boxed!();

    fn set_position(&mut self, point: &WorldPoint) {
        self.position = *point;
    }

    fn set_normal(&mut self, normal: &WorldVector) {
        self.base.normal = *normal;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::integrator::TerminationPolicy;
    use assert2::assert;
    use std::sync::Mutex;
    use test_case::test_case;

    #[test_case(1.0, 1.5 ; "entering glass")]
    #[test_case(1.5, 1.0 ; "leaving glass")]
    #[test_case(1.0, 1.33 ; "entering water")]
    fn normal_incidence_matches_the_closed_form(n1: FloatType, n2: FloatType) {
        let expected = ((n1 - n2) / (n1 + n2)).powi(2);
        assert!((fresnel_reflectance(n1, n2, 1.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn beyond_the_critical_angle_everything_reflects() {
        // Critical angle for glass to air is about 41.8 degrees.
        let cos_50_degrees = (50.0 as FloatType).to_radians().cos();
        assert!(fresnel_reflectance(1.5, 1.0, cos_50_degrees) == 1.0);
    }

    #[test]
    fn grazing_incidence_approaches_full_reflection() {
        assert!(fresnel_reflectance(1.0, 1.5, 1e-4) > 0.99);
    }

    #[test]
    fn reflectance_stays_in_unit_range() {
        for i in 1..100 {
            let cos_i = i as FloatType / 100.0;
            let r = fresnel_reflectance(1.0, 1.5, cos_i);
            assert!((0.0..=1.0).contains(&r), "cos_i = {}", cos_i);
        }
    }

    struct RayRecorder {
        rays: Mutex<Vec<Ray>>,
    }

    impl Integrator for RayRecorder {
        fn radiance(&self, ray: &Ray, _state: &mut PathState) -> Color {
            self.rays.lock().unwrap().push(*ray);
            Color::new(1.0, 1.0, 1.0)
        }

        fn termination(&self) -> TerminationPolicy {
            TerminationPolicy::default()
        }
    }

    fn query(shader: &DielectricPhongShader, out_dir: WorldVector) -> (Color, Vec<Ray>) {
        let recorder = RayRecorder {
            rays: Mutex::new(Vec::new()),
        };
        let mut state = PathState::new(TerminationPolicy::default());
        let color = shader.indirect_radiance(&out_dir, &recorder, &mut state);
        let rays = recorder.rays.lock().unwrap().clone();
        (color, rays)
    }

    #[test]
    fn normal_incidence_spawns_straight_reflection_and_refraction() {
        let mut shader = DielectricPhongShader::new();
        shader.set_normal(&WorldVector::new(0.0, 0.0, 1.0));

        let (color, rays) = query(&shader, WorldVector::new(0.0, 0.0, 1.0));
        assert!(rays.len() == 2);
        // Reflection back along the incident direction, refraction straight
        // through.
        assert!((rays[0].direction - WorldVector::new(0.0, 0.0, 1.0)).norm() < 1e-5);
        assert!((rays[1].direction - WorldVector::new(0.0, 0.0, -1.0)).norm() < 1e-5);

        // Both branches return white, so the weights must sum back to one.
        assert!((color - Color::new(1.0, 1.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn refraction_bends_towards_the_normal_when_entering() {
        let mut shader = DielectricPhongShader::new();
        shader.set_normal(&WorldVector::new(0.0, 0.0, 1.0));

        // 45 degree incidence.
        let (_, rays) = query(&shader, WorldVector::new(1.0, 0.0, 1.0));
        assert!(rays.len() == 2);

        let refracted = rays[1].direction;
        assert!(refracted.z < 0.0);
        // Snell: sin(theta_t) = sin(45 deg) / 1.5.
        let sin_t = (0.5 as FloatType).sqrt() / 1.5;
        assert!((refracted.normalize().x - sin_t).abs() < 1e-5);
    }

    #[test]
    fn internal_ray_beyond_critical_angle_only_reflects() {
        let mut shader = DielectricPhongShader::new();
        shader.set_normal(&WorldVector::new(0.0, 0.0, 1.0));

        // Ray travelling inside the medium, hitting the surface from below
        // at 45 degrees, well past the glass/air critical angle.
        let (_, rays) = query(&shader, WorldVector::new(1.0, 0.0, -1.0));
        assert!(rays.len() == 1);
        let expected = WorldVector::new(-1.0, 0.0, -1.0).normalize();
        assert!((rays[0].direction - expected).norm() < 1e-5);
    }

    #[test]
    fn transparency_filters_the_transmitted_radiance() {
        let mut shader = DielectricPhongShader::new();
        shader.transparency = Color::new(0.0, 0.0, 0.0);
        shader.set_normal(&WorldVector::new(0.0, 0.0, 1.0));

        let (color, rays) = query(&shader, WorldVector::new(0.0, 0.0, 1.0));
        assert!(rays.len() == 2);

        // Only the reflected fraction survives.
        let expected = fresnel_reflectance(1.0, 1.5, 1.0);
        assert!((color.x - expected).abs() < 1e-5);
    }
}
