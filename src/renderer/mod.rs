//! OpenCL/OpenGL interop renderer
//! The kernel writes into a texture that is shared between both APIs; the texture
//! is handed to OpenCL for the dispatch and back to OpenGL for display each frame.

pub mod buffers;
pub mod error;
pub mod gl;
pub mod interop;
pub mod shared_texture;
pub mod sharing;

pub use error::RenderError;
pub use interop::{Extent, InteropRenderer, KernelSource};
pub use sharing::GlSharing;

/// Argument slot the shared output image is bound to
pub const OUTPUT_SLOT: u32 = 0;
