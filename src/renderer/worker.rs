use image::RgbaImage;
use rand::{SeedableRng as _, rngs::SmallRng};

use crate::{
    camera::Camera,
    geometry::ScreenPoint,
    integrator::Integrator,
    renderer::RenderSettings,
    sampler::{Sample, Sampler},
    screen_block::ScreenBlock,
    util::Rgba,
};

pub struct Worker {
    samples: Vec<Sample>,
}

impl Worker {
    pub fn new() -> Worker {
        Worker {
            samples: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render_tile(
        &mut self,
        integrator: &impl Integrator,
        camera: &Camera,
        sampler: &impl Sampler,
        settings: &RenderSettings,
        tile_index: usize,
        tile: &ScreenBlock,
        buffer: &mut RgbaImage,
    ) {
        // The random state depends only on the tile, not on which worker
        // picked it up.
        let mut rng = SmallRng::seed_from_u64(settings.seed.wrapping_add(tile_index as u64));

        for point in tile.internal_points() {
            self.samples.clear();
            sampler.samples(&mut rng, &mut self.samples);

            let mut pixel = Rgba::new(0.0, 0.0, 0.0, 0.0);
            for sample in &self.samples {
                pixel += render_sample(integrator, camera, &point, sample);
            }

            let buffer_position = point - tile.min;
            buffer.put_pixel(buffer_position.x, buffer_position.y, color_to_image(pixel));
        }
    }
}

fn render_sample(
    integrator: &impl Integrator,
    camera: &Camera,
    point: &ScreenPoint,
    sample: &Sample,
) -> Rgba {
    let ray = camera.primary_ray(point, sample.offset);
    let color = integrator.primary_radiance(&ray);
    Rgba::new(color.x, color.y, color.z, 1.0) * sample.weight
}

/// Maps a 0-1 f32 rgba pixel to pixel type compatible with module image.
pub fn color_to_image(color: Rgba) -> image::Rgba<u8> {
    image::Rgba([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    #[test]
    fn color_conversion_rounds_and_clamps() {
        assert!(color_to_image(Rgba::new(0.0, 0.5, 1.0, 2.0)) == image::Rgba([0, 128, 255, 255]));
        assert!(color_to_image(Rgba::new(-1.0, 0.999, 0.001, 1.0)) == image::Rgba([0, 255, 0, 255]));
    }
}
