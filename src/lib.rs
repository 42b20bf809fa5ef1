pub mod camera;
pub mod geometry;
pub mod integrator;
pub mod renderer;
pub mod sampler;
pub mod scene;
pub mod screen_block;
pub mod shading;
pub mod util;

pub use camera::Camera;
pub use integrator::WhittedIntegrator;
pub use renderer::{RenderProgress, RenderSettings, render};
pub use scene::GeometryGroup;
