use std::ffi::c_void;

use log::{debug, info};
use opencl3::device::{Device, CL_DEVICE_TYPE_GPU};
use opencl3::platform::{get_platforms, Platform};
use opencl3::types::{cl_context_properties, cl_device_id, cl_platform_id};

use super::error::{ClResultExt, RenderError};

// cl_gl.h
const CL_CONTEXT_PLATFORM: cl_context_properties = 0x1084;
const CL_GL_CONTEXT_KHR: cl_context_properties = 0x2008;
const CL_EGL_DISPLAY_KHR: cl_context_properties = 0x2009;
const CL_GLX_DISPLAY_KHR: cl_context_properties = 0x200A;

const GL_SHARING_EXTENSION: &str = "cl_khr_gl_sharing";

/// Native handles of the GL context the OpenCL context must share objects with.
/// Both pointers belong to the context current on the calling thread.
#[derive(Clone, Copy, Debug)]
pub enum GlSharing {
    Glx { context: *const c_void, display: *const c_void },
    Egl { context: *const c_void, display: *const c_void },
}

impl GlSharing {
    /// Zero-terminated property list for `clCreateContext`
    pub fn context_properties(&self, platform: cl_platform_id) -> Vec<cl_context_properties> {
        let (context, display_key, display) = match *self {
            GlSharing::Glx { context, display } => (context, CL_GLX_DISPLAY_KHR, display),
            GlSharing::Egl { context, display } => (context, CL_EGL_DISPLAY_KHR, display),
        };
        vec![
            CL_CONTEXT_PLATFORM,
            platform as cl_context_properties,
            CL_GL_CONTEXT_KHR,
            context as cl_context_properties,
            display_key,
            display as cl_context_properties,
            0,
        ]
    }
}

/// First GPU, on any platform, that advertises GL sharing
pub fn select_device() -> Result<(Platform, cl_device_id), RenderError> {
    let platforms = get_platforms().cl_context("clGetPlatformIDs")?;
    for platform in platforms {
        let platform_name = platform.name().unwrap_or_default();
        let Ok(device_ids) = platform.get_devices(CL_DEVICE_TYPE_GPU) else {
            debug!("platform {platform_name} has no GPU devices");
            continue;
        };
        for id in device_ids {
            let device = Device::new(id);
            let extensions = device.extensions().unwrap_or_default();
            if supports_gl_sharing(&extensions) {
                info!(
                    "using {} on {} as opencl device",
                    device.name().unwrap_or_default(),
                    platform_name
                );
                return Ok((platform, id));
            }
            debug!("skipping {}: no {GL_SHARING_EXTENSION}", device.name().unwrap_or_default());
        }
    }
    Err(RenderError::NoDevice)
}

fn supports_gl_sharing(extensions: &str) -> bool {
    extensions.split_whitespace().any(|ext| ext == GL_SHARING_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glx_properties_name_platform_context_and_display() {
        let sharing = GlSharing::Glx { context: 0x10 as *const c_void, display: 0x20 as *const c_void };
        let platform = 0x30 as cl_platform_id;
        assert_eq!(
            sharing.context_properties(platform),
            vec![0x1084, 0x30, 0x2008, 0x10, 0x200A, 0x20, 0]
        );
    }

    #[test]
    fn egl_properties_use_egl_display_key() {
        let sharing = GlSharing::Egl { context: 0x1 as *const c_void, display: 0x2 as *const c_void };
        let properties = sharing.context_properties(std::ptr::null_mut());
        assert_eq!(properties[4], CL_EGL_DISPLAY_KHR);
        assert_eq!(properties.last(), Some(&0));
    }

    #[test]
    fn extension_match_is_exact() {
        assert!(supports_gl_sharing("cl_khr_fp64 cl_khr_gl_sharing cl_khr_icd"));
        assert!(!supports_gl_sharing("cl_khr_gl_sharing_ext cl_khr_icd"));
        assert!(!supports_gl_sharing(""));
    }
}
