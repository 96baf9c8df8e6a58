pub mod accel;
pub mod cli;
pub mod driver;
pub mod geometry;
pub mod renderer;
pub mod scene;
pub mod sync;

mod macros;
