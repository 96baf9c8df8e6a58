use std::ffi::CString;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    AsRawContext, ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext, NotCurrentGlContext,
    PossiblyCurrentContext, RawContext, Version,
};
use glutin::display::{AsRawDisplay, GetGlDisplay, GlDisplay, RawDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::info;
use raw_window_handle::HasWindowHandle;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use crate::renderer::GlSharing;

/// GL context and window surface, not yet current on any thread
pub struct RenderTarget {
    surface: Surface<WindowSurface>,
    context: NotCurrentContext,
}

// Created on the event thread, then used only by the render thread, which is
// joined before the window is dropped.
unsafe impl Send for RenderTarget {}

/// Create a window with a GL 3.3 core context for it
pub fn create_gl_window(event_loop: &ActiveEventLoop, attributes: WindowAttributes) -> anyhow::Result<(Arc<Window>, RenderTarget)> {
    let template = ConfigTemplateBuilder::new().with_alpha_size(8);
    let display_builder = DisplayBuilder::new().with_window_attributes(Some(attributes));
    let (window, config) = display_builder
        .build(event_loop, template, |configs| {
            configs
                .reduce(|best, config| if config.num_samples() < best.num_samples() { config } else { best })
                .expect("glutin offers at least one config")
        })
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = window.ok_or_else(|| anyhow!("display builder did not create a window"))?;

    let raw_window_handle = window.window_handle().context("window has no handle")?.as_raw();
    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .with_profile(GlProfile::Core)
        .build(Some(raw_window_handle));

    let display = config.display();
    let context = unsafe { display.create_context(&config, &context_attributes) }
        .context("failed to create GL context")?;
    let surface_attributes = window
        .build_surface_attributes(Default::default())
        .context("failed to describe window surface")?;
    let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
        .context("failed to create window surface")?;

    Ok((Arc::new(window), RenderTarget { surface, context }))
}

impl RenderTarget {
    /// Make the context current on the calling thread, with vsync off
    pub fn make_current(self) -> anyhow::Result<CurrentTarget> {
        let context = self.context.make_current(&self.surface).context("failed to make GL context current")?;
        if let Err(err) = self.surface.set_swap_interval(&context, SwapInterval::DontWait) {
            log::warn!("could not disable vsync: {err}");
        }
        Ok(CurrentTarget { surface: self.surface, context })
    }
}

pub struct CurrentTarget {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
}

impl CurrentTarget {
    pub fn load_gl(&self) -> glow::Context {
        let display = self.context.display();
        unsafe {
            glow::Context::from_loader_function(|symbol| match CString::new(symbol) {
                Ok(symbol) => display.get_proc_address(&symbol),
                Err(_) => std::ptr::null(),
            })
        }
    }

    /// Native handles the OpenCL context needs to share objects with this context
    pub fn gl_sharing(&self) -> anyhow::Result<GlSharing> {
        let display = self.context.display().raw_display();
        #[allow(unreachable_patterns)]
        let sharing = match (self.context.raw_context(), display) {
            (RawContext::Glx(context), RawDisplay::Glx(display)) => GlSharing::Glx { context, display },
            (RawContext::Egl(context), RawDisplay::Egl(display)) => GlSharing::Egl { context, display },
            _ => return Err(anyhow!("GL/CL sharing is only supported on GLX and EGL displays")),
        };
        info!("sharing GL context {sharing:?}");
        Ok(sharing)
    }

    pub fn resize(&self, width: i32, height: i32) {
        let (Some(width), Some(height)) = (NonZeroU32::new(width.max(0) as u32), NonZeroU32::new(height.max(0) as u32))
        else {
            return;
        };
        self.surface.resize(&self.context, width, height);
    }

    pub fn swap_buffers(&self) -> anyhow::Result<()> {
        self.surface.swap_buffers(&self.context).context("failed to swap buffers")
    }
}
