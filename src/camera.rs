use assert2::assert;
use bon::bon;
use nalgebra::Unit;

use crate::geometry::{FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector};

/// Pinhole perspective camera.
///
/// Screen space has the origin in the top left corner, x going right and y
/// going down; the film plane basis is precomputed so that generating a
/// primary ray is just two multiply-adds.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    center: WorldPoint,

    resolution: ScreenSize,

    up: Unit<WorldVector>,
    right: Unit<WorldVector>,
    /// Direction from the center through the middle of the top left pixel,
    /// on a film plane at distance 1.
    film_origin_offset: WorldVector,

    /// Distance between adjacent pixel centers on the film plane.
    pixel_pitch: FloatType,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        center: WorldPoint,
        look_at: WorldPoint,
        up: WorldVector,
        /// Vertical field of view in degrees.
        vertical_fov: FloatType,
        resolution: ScreenSize,
    ) -> Self {
        let forward =
            Unit::try_new(look_at - center, 1e-6).expect("Camera must not sit on its target");
        let up = Unit::try_new(up, 1e-6).expect("Up vector must be non-zero");
        let right = Unit::try_new(forward.cross(&up), 1e-6)
            .expect("`up` and the view direction must be linearly independent");
        let up = Unit::new_normalize(right.cross(&forward));

        assert!(resolution.x > 0);
        assert!(resolution.y > 0);
        assert!(vertical_fov > 0.0 && vertical_fov < 180.0);

        let half_height = (vertical_fov.to_radians() / 2.0).tan();
        let pixel_pitch = 2.0 * half_height / resolution.y as FloatType;

        let resolution_minus_one = ScreenSize::new(resolution.x - 1, resolution.y - 1);
        let film_origin_uv = resolution_minus_one.cast::<FloatType>() * pixel_pitch / 2.0;
        let film_origin_offset = forward.into_inner() - right.as_ref() * film_origin_uv.x
            + up.as_ref() * film_origin_uv.y;

        Camera {
            center,

            resolution,

            up,
            right,
            film_origin_offset,
            pixel_pitch,
        }
    }
}

impl Camera {
    pub fn resolution(&self) -> ScreenSize {
        self.resolution
    }

    /// Primary ray through the given pixel. `offset` shifts the sample
    /// within the pixel, in units of one pixel; (0, 0) is the pixel center.
    pub fn primary_ray(&self, pixel: &ScreenPoint, offset: (FloatType, FloatType)) -> Ray {
        let film_u = pixel.x as FloatType + offset.0;
        let film_v = pixel.y as FloatType + offset.1;

        let direction = self.film_origin_offset
            + self.right.as_ref() * (film_u * self.pixel_pitch)
            - self.up.as_ref() * (film_v * self.pixel_pitch);

        Ray::new(self.center, direction.normalize())
    }
}
