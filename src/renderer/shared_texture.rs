use std::rc::Rc;

use opencl3::context::Context;
use opencl3::memory::{ClMem, Image, CL_MEM_WRITE_ONLY};
use opencl3::types::cl_mem;

use super::error::{ClResultExt, RenderError};
use super::gl::GlTexture;

/// A GL texture and the CL image aliasing it.
pub struct SharedTexture {
    // released before the texture it aliases
    image: Image,
    texture: GlTexture,
}

impl SharedTexture {
    pub fn new(gl: Rc<glow::Context>, context: &Context, width: i32, height: i32) -> Result<SharedTexture, RenderError> {
        let texture = GlTexture::new(gl, width, height)?;
        let mem = unsafe {
            cl3::gl::create_from_gl_texture(context.get(), CL_MEM_WRITE_ONLY, glow::TEXTURE_2D, 0, texture.name())
        }
        .cl_context("clCreateFromGLTexture")?;
        Ok(SharedTexture { image: Image::new(mem), texture })
    }

    pub fn mem(&self) -> cl_mem {
        self.image.get()
    }

    pub fn texture(&self) -> &GlTexture {
        &self.texture
    }

    pub fn width(&self) -> i32 {
        self.texture.width()
    }

    pub fn height(&self) -> i32 {
        self.texture.height()
    }
}
