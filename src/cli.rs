use std::path::PathBuf;

use clap::Parser;

use crate::driver::pacing::PacingMode;
use crate::scene::ScenePreset;

/// Interactive OpenCL path tracer displayed through OpenGL
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Initial window width in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,
    /// Initial window height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,
    /// Frame rate cap; 0 renders as fast as possible
    #[arg(long, default_value_t = 120.0)]
    pub framerate: f32,
    #[arg(long, value_enum, default_value_t = PacingMode::Spin)]
    pub pacing: PacingMode,
    /// Samples per pixel per frame
    #[arg(long, default_value_t = 4)]
    pub spp: u32,
    /// OpenCL source of the render kernel
    #[arg(long, default_value = "cl/render.cl")]
    pub kernel: PathBuf,
    #[arg(long, default_value = "render")]
    pub entry_point: String,
    /// Options passed to the OpenCL compiler
    #[arg(long, default_value = "-cl-fast-relaxed-math", allow_hyphen_values = true)]
    pub build_options: String,
    #[arg(long, value_enum, default_value_t = ScenePreset::Cornell)]
    pub scene: ScenePreset,
    /// Seed for randomly generated scenes
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 70.0)]
    pub fov: f32,
    /// Degrees of rotation per pixel of mouse motion
    #[arg(long, default_value_t = 0.1)]
    pub sensitivity: f32,
    /// Movement speed in units per second
    #[arg(long, default_value_t = 5.0)]
    pub speed: f32,
    /// Physics updates per second
    #[arg(long, default_value_t = 240.0)]
    pub tick_rate: f32,
    /// Where F12 screenshots are written
    #[arg(long, default_value = ".")]
    pub screenshot_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_render_cornell_box() {
        let cli = Cli::parse_from(["clpt"]);
        assert_eq!(cli.scene, ScenePreset::Cornell);
        assert_eq!(cli.pacing, PacingMode::Spin);
        assert_eq!(cli.kernel, PathBuf::from("cl/render.cl"));
        assert_eq!(cli.entry_point, "render");
    }

    #[test]
    fn build_options_accept_leading_hyphen() {
        let cli = Cli::parse_from(["clpt", "--build-options", "-cl-std=CL2.0", "--scene", "spheres", "--pacing", "sleep"]);
        assert_eq!(cli.build_options, "-cl-std=CL2.0");
        assert_eq!(cli.scene, ScenePreset::Spheres);
        assert_eq!(cli.pacing, PacingMode::Sleep);
    }
}
