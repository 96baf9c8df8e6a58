//! Frame driver
//! Three threads: the winit event loop on the main thread turns input into
//! shared state, the physics thread moves the camera, and the render thread
//! owns every GPU object.

pub mod input;
pub mod pacing;
pub mod physics;
pub mod render_loop;
pub mod state;
pub mod window;

use std::fs;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context as _};
use log::{info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::cli::Cli;
use crate::scene::{Scene, Sensitivity};
use input::{key_action, HeldKeys, KeyAction};
use render_loop::RenderSettings;
use state::SharedState;

const TITLE: &str = "clpt";

/// Sent from the render thread to wake the event loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    Stats,
    Stopped,
}

struct Threads {
    render: JoinHandle<anyhow::Result<()>>,
    physics: JoinHandle<()>,
}

struct Application {
    state: Arc<SharedState>,
    proxy: EventLoopProxy<DriverEvent>,
    // consumed when the window is created
    job: Option<(Scene, RenderSettings)>,
    size: PhysicalSize<u32>,
    speed: f32,
    tick_rate: f32,

    window: Option<Arc<Window>>,
    threads: Option<Threads>,
    keys: HeldKeys,
    error: Option<anyhow::Error>,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let kernel_source = fs::read_to_string(&cli.kernel)
        .with_context(|| format!("failed to read kernel source {}", cli.kernel.display()))?;
    let scene = cli.scene.build(cli.seed, cli.fov).context("failed to build scene")?;
    info!("loaded {:?} scene with {} objects", cli.scene, scene.objects.len());

    let state = Arc::new(SharedState::new(scene.camera, Sensitivity::new(cli.sensitivity, cli.sensitivity)));
    let settings = RenderSettings {
        kernel_source,
        entry_point: cli.entry_point,
        build_options: cli.build_options,
        samples: cli.spp,
        framerate: cli.framerate,
        pacing: cli.pacing,
        screenshot_dir: cli.screenshot_dir,
        size: (cli.width as i32, cli.height as i32),
    };

    let event_loop = EventLoop::<DriverEvent>::with_user_event().build().context("failed to create event loop")?;
    let mut app = Application {
        state,
        proxy: event_loop.create_proxy(),
        job: Some((scene, settings)),
        size: PhysicalSize::new(cli.width, cli.height),
        speed: cli.speed,
        tick_rate: cli.tick_rate,
        window: None,
        threads: None,
        keys: HeldKeys::default(),
        error: None,
    };
    event_loop.run_app(&mut app).context("event loop failed")?;
    app.shutdown()
}

impl Application {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let Some((scene, settings)) = self.job.take() else {
            return Ok(());
        };
        let attributes = Window::default_attributes().with_title(TITLE).with_inner_size(self.size);
        let (window, target) = window::create_gl_window(event_loop, attributes)?;
        self.window = Some(window);

        let physics = {
            let state = Arc::clone(&self.state);
            let tick_rate = self.tick_rate;
            thread::Builder::new()
                .name("physics".into())
                .spawn(move || physics::run(state, tick_rate))
                .context("failed to spawn physics thread")?
        };
        let render = {
            let state = Arc::clone(&self.state);
            let proxy = self.proxy.clone();
            thread::Builder::new()
                .name("render".into())
                .spawn(move || render_loop::run(target, state, scene, settings, proxy))
                .context("failed to spawn render thread")?
        };
        self.threads = Some(Threads { render, physics });
        Ok(())
    }

    fn handle_key(&mut self, event: KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(action) = key_action(code) else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        match action {
            KeyAction::Move(direction) => {
                self.keys.set(direction, pressed);
                self.state.velocity.assign(self.keys.velocity(self.speed));
            }
            _ if !pressed || event.repeat => {}
            KeyAction::ToggleCursorLock => {
                let locked = !self.state.cursor_locked.get();
                self.state.cursor_locked.assign(locked);
                if let Some(window) = &self.window {
                    set_cursor_lock(window, locked);
                }
            }
            KeyAction::ScaleSensitivity(factor) => {
                self.state.sensitivity.modify(|sensitivity| sensitivity.scaled(factor));
                info!("mouse sensitivity {:?}", self.state.sensitivity.get());
            }
            KeyAction::Screenshot => self.state.request_screenshot(),
        }
    }

    /// Stop the worker threads and report the render thread's failure, if any
    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.state.request_stop();
        if let Some(Threads { render, physics }) = self.threads.take() {
            if physics.join().is_err() {
                warn!("physics thread panicked");
            }
            let rendered = render.join().map_err(|_| anyhow!("render thread panicked"))?;
            if let Err(err) = rendered {
                self.error.get_or_insert(err);
            }
        }
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn set_cursor_lock(window: &Window, locked: bool) {
    let grabbed = if locked {
        window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
    } else {
        window.set_cursor_grab(CursorGrabMode::None)
    };
    if let Err(err) = grabbed {
        warn!("could not change cursor grab: {err}");
    }
    window.set_cursor_visible(!locked);
}

impl ApplicationHandler<DriverEvent> for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.start(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("window close requested");
                self.state.request_stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.state.pending_resize.assign(Some((size.width as i32, size.height as i32)));
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event),
            WindowEvent::Focused(false) if self.state.cursor_locked.get() => {
                self.state.cursor_locked.assign(false);
                if let Some(window) = &self.window {
                    set_cursor_lock(window, false);
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.state.cursor_locked.get() {
                let sensitivity = self.state.sensitivity.get();
                self.state.camera.modify(|mut camera| {
                    camera.add_rotation(dx as f32, -dy as f32, sensitivity);
                    camera
                });
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: DriverEvent) {
        match event {
            DriverEvent::Stats => {
                if let Some(window) = &self.window {
                    let stats = self.state.stats.get();
                    window.set_title(&format!("{TITLE} - {:.1} fps", stats.fps));
                }
            }
            DriverEvent::Stopped => event_loop.exit(),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.should_stop() {
            event_loop.exit();
        }
    }
}
