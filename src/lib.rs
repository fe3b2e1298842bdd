//! Area decoration theme engine
//!
//! Loads window-frame themes (geometry, draw op lists, frame styles and the
//! style set used per window type), resolves the style for a window's state
//! and paints frames through the `render::Canvas` abstraction.

pub mod config;
pub mod render;
pub mod shared;
pub mod theme;
