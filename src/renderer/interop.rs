use std::ffi::c_void;
use std::ptr;
use std::rc::Rc;
use std::time::Instant;

use bytemuck::Pod;
use glow::HasContext;
use image::RgbaImage;
use log::{debug, info, warn};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::event::Event;
use opencl3::kernel::Kernel;
use opencl3::memory::{Buffer, ClMem, CL_MEM_HOST_WRITE_ONLY, CL_MEM_READ_ONLY};
use opencl3::program::Program;
use opencl3::types::{cl_mem, CL_NON_BLOCKING};

use super::buffers::{BufferTable, SizedBuffer};
use super::error::{ClResultExt, RenderError};
use super::gl::{check_gl_error, GlProgram, QuadMesh};
use super::shared_texture::SharedTexture;
use super::sharing::{select_device, GlSharing};
use super::OUTPUT_SLOT;

/// Kernel program to build, and the entry point to dispatch
#[derive(Clone, Copy, Debug)]
pub struct KernelSource<'a> {
    pub source: &'a str,
    pub entry_point: &'a str,
    pub options: &'a str,
}

/// Output size in pixels; only positive sizes exist
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub width: i32,
    pub height: i32,
}

impl Extent {
    pub fn new(width: i32, height: i32) -> Option<Extent> {
        (width > 0 && height > 0).then_some(Extent { width, height })
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Device buffer bound to an argument slot. The kernel only reads it.
pub struct InputBuffer {
    buffer: Buffer<u8>,
    size: usize,
}

impl InputBuffer {
    fn create(context: &Context, size: usize) -> Result<InputBuffer, RenderError> {
        let buffer = unsafe {
            Buffer::<u8>::create(context, CL_MEM_READ_ONLY | CL_MEM_HOST_WRITE_ONLY, size, ptr::null_mut())
        }
        .cl_context("clCreateBuffer")?;
        Ok(InputBuffer { buffer, size })
    }
}

impl SizedBuffer for InputBuffer {
    fn size(&self) -> usize {
        self.size
    }
}

/// Renders with an OpenCL kernel into a texture shared with the current GL
/// context, then draws that texture over the whole viewport.
///
/// Argument slot 0 is always the output image. Every other slot is either an
/// immediate value set with [`InteropRenderer::set_kernel_arg`] or an input
/// buffer created with [`InteropRenderer::add_input_buffer`].
///
/// Holds an `Rc` of the GL context, so it stays on the thread that created it.
pub struct InteropRenderer {
    // bytes handed to non-blocking writes, freed once the queue drains
    staged: Vec<Vec<u8>>,
    buffers: BufferTable<InputBuffer>,
    kernel: Kernel,
    target: SharedTexture,
    _program: Program,
    queue: CommandQueue,
    context: Context,

    quad: QuadMesh,
    display_program: GlProgram,
    gl: Rc<glow::Context>,
}

impl InteropRenderer {
    /// Build every CL and GL object for a `width` x `height` output.
    /// The GL context behind `gl` and `sharing` must be current.
    pub fn new(
        gl: Rc<glow::Context>,
        sharing: &GlSharing,
        kernel: KernelSource,
        width: i32,
        height: i32,
    ) -> Result<InteropRenderer, RenderError> {
        let extent = Extent::new(width, height).unwrap_or(Extent { width: 1, height: 1 });

        let display_program = GlProgram::passthrough(Rc::clone(&gl))?;
        let quad = QuadMesh::new(Rc::clone(&gl))?;

        let (platform, device_id) = select_device()?;
        let properties = sharing.context_properties(platform.id());
        let context = Context::from_devices(&[device_id], &properties, None, ptr::null_mut())
            .cl_context("clCreateContext")?;
        let queue = CommandQueue::create_default_with_properties(&context, 0, 0)
            .cl_context("clCreateCommandQueue")?;

        let program = build_program(&context, kernel)?;
        let cl_kernel = Kernel::create(&program, kernel.entry_point).cl_context("clCreateKernel")?;
        let target = SharedTexture::new(Rc::clone(&gl), &context, extent.width, extent.height)?;

        let renderer = InteropRenderer {
            staged: Vec::new(),
            buffers: BufferTable::new(),
            kernel: cl_kernel,
            target,
            _program: program,
            queue,
            context,
            quad,
            display_program,
            gl,
        };
        renderer.bind_output()?;
        unsafe {
            renderer.gl.viewport(0, 0, extent.width, extent.height);
            renderer.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        }
        check_gl_error(&renderer.gl, "renderer setup")?;
        Ok(renderer)
    }

    pub fn extent(&self) -> Extent {
        Extent { width: self.target.width(), height: self.target.height() }
    }

    /// Run the kernel over every pixel of the shared texture and draw it.
    pub fn render(&mut self) -> Result<(), RenderError> {
        // GL must be done with the texture before CL takes it
        unsafe { self.gl.finish() };

        let mem = self.target.mem();
        let global_work_size = [self.target.width() as usize, self.target.height() as usize];
        unsafe {
            let acquired = cl3::gl::enqueue_acquire_gl_objects(self.queue.get(), 1, &mem, 0, ptr::null())
                .cl_context("clEnqueueAcquireGLObjects")?;
            drop(Event::new(acquired));

            let dispatched = self
                .queue
                .enqueue_nd_range_kernel(
                    self.kernel.get(),
                    2,
                    ptr::null(),
                    global_work_size.as_ptr(),
                    ptr::null(),
                    &[],
                )
                .cl_context("clEnqueueNDRangeKernel");

            // the texture goes back to GL whether or not the dispatch was accepted
            let released = cl3::gl::enqueue_release_gl_objects(self.queue.get(), 1, &mem, 0, ptr::null())
                .cl_context("clEnqueueReleaseGLObjects");
            drop(dispatched?);
            drop(Event::new(released?));
        }
        self.drain_queue()?;

        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT) };
        self.display_program.bind();
        self.target.texture().bind(0);
        self.quad.draw();
        check_gl_error(&self.gl, "present")
    }

    /// Recreate the shared texture at the new size and rebind slot 0.
    /// Returns `false`, changing nothing, unless both sizes are positive.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<bool, RenderError> {
        let Some(extent) = Extent::new(width, height) else {
            debug!("ignoring resize to {width}x{height}");
            return Ok(false);
        };
        self.drain_queue()?;

        unsafe { self.gl.viewport(0, 0, extent.width, extent.height) };
        self.target = SharedTexture::new(Rc::clone(&self.gl), &self.context, extent.width, extent.height)?;
        self.bind_output()?;
        info!("resized output to {}x{}", extent.width, extent.height);
        Ok(true)
    }

    /// Bind an immediate kernel argument
    pub fn set_kernel_arg<T: Pod>(&mut self, slot: u32, value: &T) -> Result<(), RenderError> {
        if slot == OUTPUT_SLOT {
            return Err(RenderError::ReservedSlot);
        }
        unsafe { set_raw_arg(&self.kernel, slot, std::mem::size_of::<T>(), value as *const T as *const c_void) }
    }

    /// Create a `size` byte input buffer for `slot`, freeing any previous one first
    pub fn add_input_buffer(&mut self, slot: u32, size: usize) -> Result<(), RenderError> {
        self.drain_queue()?;
        let context = &self.context;
        let mem = self.buffers.replace_with(slot, size, |size| InputBuffer::create(context, size))?.buffer.get();
        debug!("bound {size} byte input buffer to slot {slot}");
        unsafe { set_raw_arg(&self.kernel, slot, std::mem::size_of::<cl_mem>(), &mem as *const cl_mem as *const c_void) }
    }

    /// Queue an upload of `data` to the start of the buffer at `slot`.
    /// The write completes before the next frame's kernel runs.
    pub fn write_buffer<T: Pod>(&mut self, slot: u32, data: &[T]) -> Result<(), RenderError> {
        let bytes: Vec<u8> = bytemuck::cast_slice(data).to_vec();
        let input = self.buffers.writable(slot, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        let written = unsafe { self.queue.enqueue_write_buffer(&mut input.buffer, CL_NON_BLOCKING, 0, &bytes, &[]) }
            .cl_context("clEnqueueWriteBuffer")?;
        drop(written);
        self.staged.push(bytes);
        Ok(())
    }

    /// Read back what the last [`InteropRenderer::render`] drew, top row first
    pub fn capture(&self) -> Result<RgbaImage, RenderError> {
        let Extent { width, height } = self.extent();
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                0,
                0,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixels[..]),
            );
        }
        check_gl_error(&self.gl, "glReadPixels")?;

        let mut frame = RgbaImage::from_raw(width as u32, height as u32, pixels)
            .ok_or(RenderError::CaptureSize { width, height })?;
        // GL rows run bottom to top
        image::imageops::flip_vertical_in_place(&mut frame);
        Ok(frame)
    }

    fn bind_output(&self) -> Result<(), RenderError> {
        let mem = self.target.mem();
        unsafe {
            set_raw_arg(&self.kernel, OUTPUT_SLOT, std::mem::size_of::<cl_mem>(), &mem as *const cl_mem as *const c_void)
        }
    }

    fn drain_queue(&mut self) -> Result<(), RenderError> {
        self.queue.finish().cl_context("clFinish")?;
        self.staged.clear();
        Ok(())
    }
}

impl Drop for InteropRenderer {
    fn drop(&mut self) {
        // staged writes may still be reading host memory
        if let Err(err) = self.queue.finish() {
            warn!("failed to drain command queue on shutdown: {}", cl3::error_codes::error_text(err.0));
        }
    }
}

unsafe fn set_raw_arg(kernel: &Kernel, slot: u32, size: usize, value: *const c_void) -> Result<(), RenderError> {
    cl3::kernel::set_kernel_arg(kernel.get(), slot, size, value).cl_context("clSetKernelArg")
}

fn build_program(context: &Context, kernel: KernelSource) -> Result<Program, RenderError> {
    let start = Instant::now();
    let mut program = Program::create_from_source(context, kernel.source).cl_context("clCreateProgramWithSource")?;
    if program.build(context.devices(), kernel.options).is_err() {
        let logs = context
            .devices()
            .iter()
            .map(|&id| {
                let name = Device::new(id).name().unwrap_or_else(|_| format!("{id:?}"));
                let log = program.get_build_log(id).unwrap_or_default();
                (name, log)
            })
            .collect();
        return Err(RenderError::Build { logs });
    }
    info!("built kernel program in {:.2?}", start.elapsed());
    Ok(program)
}
