//! Rendering backends
//!
//! `canvas` holds the drawing abstraction draw ops target, `raster` the
//! tiny-skia implementation of it, `text` title fonts and `pixbuf` image
//! loading and tinting.

pub mod canvas;
pub mod pixbuf;
pub mod raster;
pub mod text;

pub use canvas::{AlphaMask, Canvas, Paint, Stroke, TitleLayout};
pub use raster::RasterCanvas;
pub use text::TitleFont;
