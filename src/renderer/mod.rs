mod machinery;
mod worker;

pub use crate::renderer::machinery::{RenderError, RenderProgress, render};

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    /// Edge length of the square tiles handed out to workers.
    pub tile_size: std::num::NonZeroU32,

    /// Base seed for per tile random state. Renders with the same seed are
    /// bit identical regardless of the worker count.
    pub seed: u64,

    /// Number of worker threads, one per core when not set.
    pub workers: Option<std::num::NonZeroUsize>,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings {
            tile_size: std::num::NonZeroU32::new(32).unwrap(),
            seed: 0,
            workers: None,
        }
    }
}
