pub mod error;
pub mod frame;
pub mod palette;
pub mod pixel;
pub mod pixelator;
