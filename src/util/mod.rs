mod stats;

pub use stats::Stats;

use crate::geometry::FloatType;

/// Linear radiance / reflectance value, one component per channel.
pub type Color = nalgebra::Vector3<FloatType>;

/// Floating point RGBA pixel, used on the way into the image buffer.
pub type Rgba = rgb::RGBA<FloatType>;
