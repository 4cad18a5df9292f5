//! Report assembly and rendering.

pub mod builder;
pub mod generator;

pub use builder::*;
pub use generator::*;
