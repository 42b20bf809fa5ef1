use itertools::Itertools as _;
use rand::Rng as _;
use rand::rngs::SmallRng;

use crate::geometry::FloatType;

/// One sample position within a pixel. Offsets are in pixel units relative
/// to the pixel center, always inside [-0.5, 0.5].
#[derive(Copy, Clone, Debug)]
pub struct Sample {
    pub offset: (FloatType, FloatType),
    pub weight: FloatType,
}

/// Strategy for placing samples within a pixel. Weights of the generated
/// samples sum to one, so the pixel value is just the weighted sum of the
/// sample radiances.
pub trait Sampler: Send + Sync {
    fn samples(&self, rng: &mut SmallRng, out: &mut Vec<Sample>);
}

/// Single sample through the pixel center. No noise, but hard aliasing.
pub struct CenterSampler;

impl Sampler for CenterSampler {
    fn samples(&self, _rng: &mut SmallRng, out: &mut Vec<Sample>) {
        out.push(Sample {
            offset: (0.0, 0.0),
            weight: 1.0,
        });
    }
}

/// Stratified sampling: the pixel is split into `grid` x `grid` strata with
/// one uniformly placed sample in each.
pub struct JitteredSampler {
    pub grid: u32,
}

impl Sampler for JitteredSampler {
    fn samples(&self, rng: &mut SmallRng, out: &mut Vec<Sample>) {
        let step = 1.0 / self.grid as FloatType;
        let weight = step * step;

        for (i, j) in (0..self.grid).cartesian_product(0..self.grid) {
            out.push(Sample {
                offset: (
                    (i as FloatType + rng.random::<FloatType>()) * step - 0.5,
                    (j as FloatType + rng.random::<FloatType>()) * step - 0.5,
                ),
                weight,
            });
        }
    }
}
