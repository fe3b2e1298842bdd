//! Shared types used by both the theme engine and its renderers

pub mod geometry;

pub use geometry::{Geometry, Point, Rect};
