use super::{Shader, SurfaceShader, impl_clone_boxed};
use crate::geometry::{FloatType, Ray, WorldPoint, WorldVector};
use crate::integrator::{Integrator, PathState};
use crate::util::Color;

/// Blinn-Phong reflectance with the cosine term to the light folded in.
/// Input directions do not need to be normalized.
pub(crate) fn phong_reflectance(
    normal: &WorldVector,
    out_dir: &WorldVector,
    in_dir: &WorldVector,
    diffuse: &Color,
    specular: &Color,
    exponent: FloatType,
) -> Color {
    let normal = normal.normalize();
    let in_dir = in_dir.normalize();

    let cos_in = normal.dot(&in_dir);
    if cos_in <= 0.0 {
        // Light is behind the surface.
        return Color::zeros();
    }

    let mut ret = diffuse * cos_in;

    let half = (in_dir + out_dir.normalize()).normalize();
    let cos_half = normal.dot(&half);
    if cos_half > 0.0 {
        ret += specular * cos_half.powf(exponent);
    }

    ret
}

/// A material that only responds to ambient light. Mostly useful as a flat
/// debug material.
#[derive(Clone, Debug)]
pub struct AmbientShader {
    pub ambient: Color,
}

impl AmbientShader {
    pub fn new(ambient: Color) -> AmbientShader {
        AmbientShader { ambient }
    }
}

impl Shader for AmbientShader {
    fn ambient_coefficient(&self) -> Color {
        self.ambient
    }
}

impl SurfaceShader for AmbientShader {
    impl_clone_boxed!();
}

/// Plain Blinn-Phong material.
#[derive(Clone, Debug)]
pub struct PhongShader {
    pub diffuse: Color,
    pub specular: Color,
    pub ambient: Color,
    pub exponent: FloatType,

    /// Per-hit state, configured through the setters.
    pub normal: WorldVector,
}

impl Default for PhongShader {
    fn default() -> PhongShader {
        PhongShader {
            diffuse: Color::zeros(),
            specular: Color::zeros(),
            ambient: Color::zeros(),
            exponent: 1.0,
            normal: WorldVector::zeros(),
        }
    }
}

impl Shader for PhongShader {
    fn reflectance(&self, out_dir: &WorldVector, in_dir: &WorldVector) -> Color {
        phong_reflectance(
            &self.normal,
            out_dir,
            in_dir,
            &self.diffuse,
            &self.specular,
            self.exponent,
        )
    }

    fn ambient_coefficient(&self) -> Color {
        self.ambient
    }
}

impl SurfaceShader for PhongShader {
    impl_clone_boxed!();

    fn set_normal(&mut self, normal: &WorldVector) {
        self.normal = *normal;
    }
}

/// Blinn-Phong material with an ideal mirror component on top. The mirror
/// contribution is a recursive integrator query weighted by `reflectivity`.
#[derive(Clone, Debug)]
pub struct MirrorPhongShader {
    pub base: PhongShader,
    pub reflectivity: FloatType,

    pub position: WorldPoint,
}

impl MirrorPhongShader {
    pub fn new() -> MirrorPhongShader {
        MirrorPhongShader::default()
    }
}

impl Default for MirrorPhongShader {
    fn default() -> MirrorPhongShader {
        MirrorPhongShader {
            base: PhongShader::default(),
            reflectivity: 1.0,
            position: WorldPoint::origin(),
        }
    }
}

impl Shader for MirrorPhongShader {
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
        if self.reflectivity <= 0.0 {
            return Color::zeros();
        }

        let normal = self.base.normal.normalize();
        let out_dir = out_dir.normalize();
        let reflected = normal * (2.0 * normal.dot(&out_dir)) - out_dir;

        state.push_attenuation(self.reflectivity);
        let radiance = integrator.radiance(&Ray::new(self.position, reflected), state);
        state.pop_attenuation();

        radiance * self.reflectivity
    }
}

impl SurfaceShader for MirrorPhongShader {
    impl_clone_boxed!();

    fn set_position(&mut self, point: &WorldPoint) {
        self.position = *point;
    }

    fn set_normal(&mut self, normal: &WorldVector) {
        self.base.normal = *normal;
    }
}
