use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use bytemuck::Pod;
use log::{debug, error, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use winit::event_loop::EventLoopProxy;

use super::pacing::{FpsCounter, FramePacer, PacingMode};
use super::state::{FrameStats, SharedState};
use super::window::RenderTarget;
use super::DriverEvent;
use crate::geometry::ClFloat3;
use crate::renderer::{Extent, InteropRenderer, KernelSource};
use crate::scene::Scene;

/// Argument slots of `cl/render.cl`'s `render` kernel; slot 0 is the output image
pub mod slot {
    pub const INVERSE_VIEW_PROJECTION: u32 = 1;
    pub const PIXEL_SEEDS: u32 = 2;
    pub const SAMPLES: u32 = 3;
    pub const FRAME_SEED: u32 = 4;
    pub const OBJECTS: u32 = 5;
    pub const OBJECT_COUNT: u32 = 6;
    pub const LIGHTS: u32 = 7;
    pub const LIGHT_COUNT: u32 = 8;
    pub const SCENE_LOWER: u32 = 9;
    pub const SCENE_UPPER: u32 = 10;
    pub const NODES: u32 = 11;
    pub const INDICES: u32 = 12;
}

pub struct RenderSettings {
    pub kernel_source: String,
    pub entry_point: String,
    pub build_options: String,
    pub samples: u32,
    pub framerate: f32,
    pub pacing: PacingMode,
    pub screenshot_dir: PathBuf,
    pub size: (i32, i32),
}

/// Render thread body. Whatever happens, the other threads are told to stop on return.
pub fn run(
    target: RenderTarget,
    state: Arc<SharedState>,
    scene: Scene,
    settings: RenderSettings,
    proxy: EventLoopProxy<DriverEvent>,
) -> anyhow::Result<()> {
    let result = render_frames(target, &state, &scene, &settings, &proxy);
    if let Err(err) = &result {
        error!("render thread failed: {err:#}");
    }
    state.request_stop();
    // the event loop may already be gone
    let _ = proxy.send_event(DriverEvent::Stopped);
    result
}

fn render_frames(
    target: RenderTarget,
    state: &SharedState,
    scene: &Scene,
    settings: &RenderSettings,
    proxy: &EventLoopProxy<DriverEvent>,
) -> anyhow::Result<()> {
    let target = target.make_current()?;
    let gl = Rc::new(target.load_gl());
    let sharing = target.gl_sharing()?;

    let kernel = KernelSource {
        source: &settings.kernel_source,
        entry_point: &settings.entry_point,
        options: &settings.build_options,
    };
    let (width, height) = settings.size;
    let mut renderer = InteropRenderer::new(gl, &sharing, kernel, width, height)?;

    upload_scene(&mut renderer, scene)?;
    let mut rng = StdRng::from_entropy();
    upload_pixel_seeds(&mut renderer, &mut rng)?;
    renderer.set_kernel_arg(slot::SAMPLES, &settings.samples)?;

    let pacer = FramePacer::new(settings.framerate, settings.pacing);
    let mut fps = FpsCounter::new(Instant::now());
    let mut frame: u64 = 0;

    while !state.should_stop() {
        let frame_start = Instant::now();

        if let Some((width, height)) = state.pending_resize.take() {
            target.resize(width, height);
            if renderer.resize(width, height)? {
                upload_pixel_seeds(&mut renderer, &mut rng)?;
            }
        }

        let Extent { width, height } = renderer.extent();
        let camera = state.camera.get();
        let inverse_view_projection = camera.inverse_view_projection(width as f32 / height as f32);
        renderer.set_kernel_arg(slot::INVERSE_VIEW_PROJECTION, &inverse_view_projection.to_row_major())?;
        renderer.set_kernel_arg(slot::FRAME_SEED, &rng.gen::<u32>())?;
        renderer.render()?;

        if state.take_screenshot_request() {
            // a failed screenshot is not worth stopping for
            if let Err(err) = save_screenshot(&renderer, &settings.screenshot_dir) {
                error!("{err:#}");
            }
        }
        target.swap_buffers()?;

        pacer.wait(frame_start);
        frame += 1;
        if let Some(rate) = fps.tick(Instant::now()) {
            info!("{rate:.1} fps");
            state.stats.assign(FrameStats { fps: rate, frame });
            let _ = proxy.send_event(DriverEvent::Stats);
        }
    }

    info!("render thread stopping after {frame} frames");
    Ok(())
}

/// Upload the scene's objects, lights, bounds and kd-tree to their slots
pub fn upload_scene(renderer: &mut InteropRenderer, scene: &Scene) -> anyhow::Result<()> {
    let start = Instant::now();
    let tree = scene.build_tree();
    let objects = scene.device_objects();
    let lights = scene.lights();
    let bounds = scene.bounds().unwrap_or_default();
    info!(
        "uploading {} objects, {} lights, {} tree nodes (built in {:.2?})",
        objects.len(),
        lights.len(),
        tree.nodes.len(),
        start.elapsed()
    );

    upload(renderer, slot::OBJECTS, &objects)?;
    renderer.set_kernel_arg(slot::OBJECT_COUNT, &(objects.len() as u32))?;
    upload(renderer, slot::LIGHTS, &lights)?;
    renderer.set_kernel_arg(slot::LIGHT_COUNT, &(lights.len() as u32))?;
    renderer.set_kernel_arg(slot::SCENE_LOWER, &ClFloat3::from(bounds.minimum))?;
    renderer.set_kernel_arg(slot::SCENE_UPPER, &ClFloat3::from(bounds.maximum))?;
    upload(renderer, slot::NODES, &tree.nodes)?;
    upload(renderer, slot::INDICES, &tree.indices)?;
    Ok(())
}

/// Fresh random state for every pixel; the buffer follows the output size
fn upload_pixel_seeds(renderer: &mut InteropRenderer, rng: &mut StdRng) -> anyhow::Result<()> {
    let seeds: Vec<[u32; 2]> = (0..renderer.extent().pixels()).map(|_| rng.gen()).collect();
    upload(renderer, slot::PIXEL_SEEDS, &seeds)
}

// empty arrays still get a one-element buffer so the slot is never left unbound
fn upload<T: Pod>(renderer: &mut InteropRenderer, slot: u32, data: &[T]) -> anyhow::Result<()> {
    let size = std::mem::size_of_val(data).max(std::mem::size_of::<T>());
    renderer.add_input_buffer(slot, size)?;
    renderer.write_buffer(slot, data)?;
    debug!("slot {slot}: {} elements", data.len());
    Ok(())
}

fn save_screenshot(renderer: &InteropRenderer, directory: &Path) -> anyhow::Result<()> {
    let frame = renderer.capture()?;
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    let path = directory.join(format!("screenshot-{timestamp}.png"));
    frame.save(&path).with_context(|| format!("failed to save screenshot to {}", path.display()))?;
    info!("saved screenshot to {}", path.display());
    Ok(())
}
