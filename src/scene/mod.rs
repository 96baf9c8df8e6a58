pub mod camera;
pub mod object;
pub mod presets;
#[allow(clippy::module_inception)]
pub mod scene;

pub use camera::{Camera, Sensitivity};
pub use object::{ClObject, Material, Object, Primitive};
pub use presets::ScenePreset;
pub use scene::{Scene, SceneError};
