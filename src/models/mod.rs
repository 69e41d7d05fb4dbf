pub mod common;
pub mod gemini;
pub mod image;
pub mod trigger;

pub use common::*;
pub use image::*;
pub use trigger::*;
