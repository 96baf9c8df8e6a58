use opencl3::error_codes::ClError;
use thiserror::Error;

use super::gl::gl_error_string;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no OpenCL device with cl_khr_gl_sharing support was found")]
    NoDevice,
    #[error("{context} failed: {} ({code})", cl_error_name(.code))]
    Cl { context: &'static str, code: i32 },
    #[error("failed to build kernel program:\n{}", format_build_logs(.logs))]
    Build { logs: Vec<(String, String)> },
    #[error("{context} failed: {} ({code:#x})", gl_error_name(.code))]
    Gl { context: &'static str, code: u32 },
    #[error("failed to create {object}: {message}")]
    GlObject { object: &'static str, message: String },
    #[error("failed to compile {stage} shader:\n{log}")]
    ShaderCompile { stage: &'static str, log: String },
    #[error("failed to link shader program:\n{log}")]
    ShaderLink { log: String },
    #[error("kernel argument slot 0 is reserved for the output texture")]
    ReservedSlot,
    #[error("no input buffer is bound to slot {slot}")]
    UnboundSlot { slot: u32 },
    #[error("input buffer for slot {slot} must not be empty")]
    EmptyBuffer { slot: u32 },
    #[error("write of {len} bytes overflows the {size} byte buffer at slot {slot}")]
    WriteOutOfBounds { slot: u32, len: usize, size: usize },
    #[error("captured pixels do not fill a {width}x{height} image")]
    CaptureSize { width: i32, height: i32 },
    #[error("failed to encode captured frame")]
    Capture(#[from] image::ImageError),
}

fn cl_error_name(code: &i32) -> &'static str {
    cl3::error_codes::error_text(*code)
}

fn gl_error_name(code: &u32) -> &'static str {
    gl_error_string(*code)
}

fn format_build_logs(logs: &[(String, String)]) -> String {
    logs.iter()
        .map(|(device, log)| format!("\t{device}: {log}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Attach a description of the failed call to a raw OpenCL status
pub(crate) trait ClResultExt<T> {
    fn cl_context(self, context: &'static str) -> Result<T, RenderError>;
}

impl<T> ClResultExt<T> for Result<T, ClError> {
    fn cl_context(self, context: &'static str) -> Result<T, RenderError> {
        self.map_err(|ClError(code)| RenderError::Cl { context, code })
    }
}

impl<T> ClResultExt<T> for Result<T, i32> {
    fn cl_context(self, context: &'static str) -> Result<T, RenderError> {
        self.map_err(|code| RenderError::Cl { context, code })
    }
}
