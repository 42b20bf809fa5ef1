pub mod dielectric;
pub mod phong;

use crate::geometry::{TexturePoint, WorldPoint, WorldVector};
use crate::integrator::{Integrator, PathState};
use crate::util::Color;

/// The capability surface a shader exposes to the integrator. All queries
/// work in the context of one intersection and default to a zero
/// contribution when the material does not support them.
pub trait Shader: Send + Sync {
    /// Reflectance towards `out_dir` when illuminated from `in_dir`,
    /// including the cosine term to the light source. Neither direction is
    /// required to be normalized.
    fn reflectance(&self, _out_dir: &WorldVector, _in_dir: &WorldVector) -> Color {
        Color::zeros()
    }

    /// Flat ambient response of the material.
    fn ambient_coefficient(&self) -> Color {
        Color::zeros()
    }

    /// Radiance that does not come from direct illumination, e.g. a mirror
    /// reflection. Implementations call back into the integrator with new
    /// rays, registering their weight on `state` around each call.
    fn indirect_radiance(
        &self,
        _out_dir: &WorldVector,
        _integrator: &dyn Integrator,
        _state: &mut PathState,
    ) -> Color {
        Color::zeros()
    }
}

/// A shader that can be plugged into any primitive. Prototypes are immutable
/// and shared; every intersection works on its own clone, configured through
/// the setters below. This is what keeps shading safe under recursive and
/// multi-threaded integration.
pub trait SurfaceShader: Shader {
    fn clone_boxed(&self) -> Box<dyn SurfaceShader>;

    /// Sets the surface point which is shaded.
    fn set_position(&mut self, _point: &WorldPoint) {}

    /// Sets the surface normal at the shaded point. Not required to be
    /// normalized by the caller.
    fn set_normal(&mut self, _normal: &WorldVector) {}

    /// Sets the texture coordinates for the intersection.
    fn set_texture_coord(&mut self, _tex_coord: &TexturePoint) {}
}

/// Implements [`SurfaceShader::clone_boxed`] in terms of `Clone`.
macro_rules! impl_clone_boxed {
    () => {
        fn clone_boxed(&self) -> Box<dyn SurfaceShader> {
            Box::new(self.clone())
        }
    };
}
pub(crate) use impl_clone_boxed;

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::Color;
    use assert2::assert;

    #[derive(Clone)]
    struct NullShader;

    impl Shader for NullShader {}

    impl SurfaceShader for NullShader {
        impl_clone_boxed!();
    }

    #[test]
    fn unsupported_capabilities_contribute_nothing() {
        let shader = NullShader;
        let dir = WorldVector::new(0.0, 1.0, 0.0);
        assert!(shader.reflectance(&dir, &dir) == Color::zeros());
        assert!(shader.ambient_coefficient() == Color::zeros());
    }
}
