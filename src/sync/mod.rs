pub mod shared_cell;

pub use shared_cell::SharedCell;
