use std::{
    ops::Deref as _,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use image::{GenericImage, GenericImageView, RgbaImage};

use crate::{
    camera::Camera,
    integrator::Integrator,
    renderer::{RenderSettings, worker::Worker},
    sampler::Sampler,
    screen_block::ScreenBlock,
};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Starts rendering on a pool of worker threads and returns immediately.
/// Tiles are handed out in the screen block spiral order; the callbacks fire
/// from worker threads as tiles are started and finished.
pub fn render<
    I: Integrator + 'static,
    S: Sampler + 'static,
    F1: Fn(ScreenBlock) + Send + Sync + 'static,
    F2: Fn(ScreenBlock) + Send + Sync + 'static,
>(
    integrator: I,
    camera: Camera,
    sampler: S,
    settings: RenderSettings,
    started_tile_callback: F1,
    finished_tile_callback: F2,
) -> Result<RenderProgress<I, S>, RenderError> {
    let resolution = camera.resolution();
    let image = RgbaImage::new(resolution.x, resolution.y);
    let state = Arc::new(RenderState {
        integrator,
        camera,
        sampler,
        settings,

        image: Mutex::new(image),

        tile_ordering: ScreenBlock::from_size(resolution)
            .spiral_chunks(settings.tile_size.get())
            .collect(),
        next_tile_index: AtomicUsize::new(0),
        finished_tiles: AtomicUsize::new(0),
    });
    let started_tile_callback = Arc::new(started_tile_callback);
    let finished_tile_callback = Arc::new(finished_tile_callback);

    let cores = core_affinity::get_core_ids().unwrap_or_default();
    let worker_count = settings
        .workers
        .map(|count| count.get())
        .unwrap_or_else(|| cores.len().max(1).min(num_cpus::get()));

    let threads = (0..worker_count)
        .map(|worker_id| {
            let state = Arc::clone(&state);
            let started_tile_callback = Arc::clone(&started_tile_callback);
            let finished_tile_callback = Arc::clone(&finished_tile_callback);
            let core = cores.get(worker_id).copied();

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }

                    let mut worker = Worker::new();
                    let mut buffer =
                        RgbaImage::new(settings.tile_size.into(), settings.tile_size.into());

                    while let Some((tile_index, tile)) = state.get_next_tile() {
                        (started_tile_callback)(*tile);

                        worker.render_tile(
                            &state.integrator,
                            &state.camera,
                            &state.sampler,
                            &state.settings,
                            tile_index,
                            tile,
                            &mut buffer,
                        );
                        state
                            .image
                            .lock()
                            .expect("Poisoned lock!")
                            .copy_from(
                                buffer.view(0, 0, tile.width(), tile.height()).deref(),
                                tile.min.x,
                                tile.min.y,
                            )
                            .unwrap_or_else(|_| {
                                unreachable!("The buffer should always fit into the output")
                            });
                        state.finished_tiles.fetch_add(1, Ordering::AcqRel);

                        (finished_tile_callback)(*tile);
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderProgress {
        render_state: state,
        threads,
    })
}

pub struct RenderProgress<I: Integrator, S: Sampler> {
    render_state: Arc<RenderState<I, S>>,
    threads: Vec<JoinHandle<()>>,
}

impl<I: Integrator, S: Sampler> RenderProgress<I, S> {
    /// Return number of finished and total tiles.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.render_state.tile_ordering.len();
        let finished = self
            .render_state
            .finished_tiles
            .load(Ordering::Acquire)
            .min(total);
        (finished, total)
    }

    pub fn progress_percent(&self) -> f32 {
        let (finished, total) = self.progress();
        100.0 * (finished as f32) / (total as f32)
    }

    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|handle| handle.is_finished())
    }

    /// Signal the workers to abort.
    /// Any running workers will still finish their tiles, but no new ones will be started.
    pub fn abort(&self) {
        self.render_state
            .next_tile_index
            .store(self.render_state.tile_ordering.len(), Ordering::Release);
    }

    /// Wait for the workers to finish.
    pub fn wait(&mut self) {
        self.threads
            .drain(..)
            .for_each(|handle| handle.join().unwrap());
    }

    pub fn image(&self) -> &Mutex<RgbaImage> {
        &self.render_state.image
    }
}

struct RenderState<I: Integrator, S: Sampler> {
    integrator: I,
    camera: Camera,
    sampler: S,
    settings: RenderSettings,

    image: Mutex<RgbaImage>,

    tile_ordering: Vec<ScreenBlock>,
    next_tile_index: AtomicUsize,
    finished_tiles: AtomicUsize,
}

impl<I: Integrator, S: Sampler> RenderState<I, S> {
    fn get_next_tile(&self) -> Option<(usize, &ScreenBlock)> {
        let id = self.next_tile_index.fetch_add(1, Ordering::AcqRel);
        self.tile_ordering.get(id).map(|tile| (id, tile))
    }
}
