use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indicatif::ProgressBar;

use glint::geometry::{ScreenSize, WorldPoint, WorldVector};
use glint::integrator::{Falloff, PointLight, TerminationPolicy, area_light_grid};
use glint::sampler::{CenterSampler, JitteredSampler, Sampler};
use glint::scene::primitives::{InfinitePlane, Sphere};
use glint::shading::dielectric::DielectricPhongShader;
use glint::shading::phong::{MirrorPhongShader, PhongShader};
use glint::util::Color;
use glint::{Camera, GeometryGroup, RenderSettings, WhittedIntegrator, render};

/// Renders the built-in demo scene to a PNG file.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Edge of the per pixel sample grid; 1 samples pixel centers only.
    #[arg(long, default_value_t = 2)]
    samples: u32,

    /// Maximum recursion depth of the shading evaluation.
    #[arg(long, default_value_t = 10)]
    max_depth: u32,

    /// Contribution threshold below which recursion is cut off.
    #[arg(long, default_value_t = 0.05)]
    min_contribution: f32,

    #[arg(long, default_value_t = NonZeroU32::new(32).unwrap())]
    tile_size: NonZeroU32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker thread count, one per core when not given.
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    #[arg(long, default_value = "render.png")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.samples <= 1 {
        run(&args, CenterSampler)
    } else {
        run(&args, JitteredSampler { grid: args.samples })
    }
}

fn run<S: Sampler + 'static>(args: &Args, sampler: S) -> anyhow::Result<()> {
    let mut integrator = WhittedIntegrator::new(demo_scene());
    integrator.ambient_light = Color::new(0.6, 0.6, 0.65);
    integrator.termination = TerminationPolicy {
        max_depth: args.max_depth,
        min_contribution: args.min_contribution,
    };
    integrator.lights.push(PointLight {
        position: WorldPoint::new(-6.0, 8.0, 4.0),
        intensity: Color::new(60.0, 60.0, 55.0),
        falloff: Falloff::INVERSE_SQUARE,
    });
    integrator.lights.extend(area_light_grid(
        Color::new(0.5, 0.5, 0.6),
        4,
        WorldPoint::new(2.0, 6.0, 6.0),
        2.0,
    ));

    let camera = Camera::builder()
        .center(WorldPoint::new(0.0, 3.0, 9.0))
        .look_at(WorldPoint::new(0.0, 1.0, 0.0))
        .up(WorldVector::new(0.0, 1.0, 0.0))
        .vertical_fov(50.0)
        .resolution(ScreenSize::new(args.width, args.height))
        .build();

    let settings = RenderSettings {
        tile_size: args.tile_size,
        seed: args.seed,
        workers: args.threads,
    };

    let bar = ProgressBar::no_length();
    let mut progress = render(integrator, camera, sampler, settings, |_| {}, {
        let bar = bar.clone();
        move |_| bar.inc(1)
    })?;
    bar.set_length(progress.progress().1 as u64);

    progress.wait();
    bar.finish();

    let image = progress.image().lock().expect("Poisoned lock!").clone();
    image.save(&args.output)?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}

fn demo_scene() -> GeometryGroup {
    let floor = Arc::new(PhongShader {
        diffuse: Color::new(0.6, 0.6, 0.6),
        ambient: Color::new(0.12, 0.12, 0.12),
        ..PhongShader::default()
    });

    let red = Arc::new(PhongShader {
        diffuse: Color::new(0.7, 0.15, 0.1),
        specular: Color::new(0.4, 0.4, 0.4),
        ambient: Color::new(0.14, 0.03, 0.02),
        exponent: 40.0,
        ..PhongShader::default()
    });

    let mut mirror = MirrorPhongShader::new();
    mirror.base.diffuse = Color::new(0.05, 0.05, 0.05);
    mirror.base.specular = Color::new(0.5, 0.5, 0.5);
    mirror.base.exponent = 200.0;
    mirror.reflectivity = 0.85;
    let mirror = Arc::new(mirror);

    let mut glass = DielectricPhongShader::new();
    glass.base.specular = Color::new(0.3, 0.3, 0.3);
    glass.base.exponent = 120.0;
    glass.index_inside = 1.5;
    glass.transparency = Color::new(0.9, 0.95, 0.9);
    let glass = Arc::new(glass);

    let mut scene = GeometryGroup::new();
    scene.primitives.push(Arc::new(InfinitePlane::new(
        WorldPoint::origin(),
        WorldVector::new(0.0, 1.0, 0.0),
        floor,
    )));
    scene.primitives.push(Arc::new(Sphere {
        center: WorldPoint::new(-2.2, 1.0, 0.0),
        radius: 1.0,
        shader: red,
    }));
    scene.primitives.push(Arc::new(Sphere {
        center: WorldPoint::new(0.0, 1.0, -1.5),
        radius: 1.0,
        shader: mirror,
    }));
    scene.primitives.push(Arc::new(Sphere {
        center: WorldPoint::new(2.2, 1.0, 0.5),
        radius: 1.0,
        shader: glass,
    }));
    scene.rebuild_index();
    scene
}
