//! Bitmap helpers for image and icon ops
//!
//! Recoloring, scaling to a target size, tiling, and stripe replication.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba as Pixel, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::theme::color::Rgba;
use crate::theme::error::{Result, ThemeError};

/// How a bitmap fills a target larger or smaller than itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFillType {
    Tile,
    #[default]
    Scale,
}

/// Load a theme image from disk
pub fn load(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(|source| ThemeError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

fn intensity(r: u8, g: u8, b: u8) -> f64 {
    (r as f64 * 0.30 + g as f64 * 0.59 + b as f64 * 0.11) / 255.0
}

/// Map pixel intensity onto a black → `color` → white ramp; alpha is kept
pub fn colorize(image: &RgbaImage, color: Rgba) -> RgbaImage {
    let byte = |v: f64| (255.0 * v).round().clamp(0.0, 255.0) as u8;

    let mut out = RgbaImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let i = intensity(r, g, b);

        let (dr, dg, db) = if i <= 0.5 {
            (color.red * i * 2.0, color.green * i * 2.0, color.blue * i * 2.0)
        } else {
            let t = (i - 0.5) * 2.0;
            (
                color.red + (1.0 - color.red) * t,
                color.green + (1.0 - color.green) * t,
                color.blue + (1.0 - color.blue) * t,
            )
        };

        out.put_pixel(x, y, Pixel([byte(dr), byte(dg), byte(db), a]));
    }
    out
}

fn pixels(v: f64) -> u32 {
    v.ceil().max(1.0) as u32
}

/// Stretch to the new size. With only one stripe direction requested, the
/// stripe axis keeps its original length and is repeated later instead.
fn scale(
    image: &RgbaImage,
    width: f64,
    height: f64,
    vertical_stripes: bool,
    horizontal_stripes: bool,
) -> RgbaImage {
    let (mut width, mut height) = (width, height);
    if horizontal_stripes && !vertical_stripes {
        width = image.width() as f64;
    } else if vertical_stripes && !horizontal_stripes {
        height = image.height() as f64;
    }

    imageops::resize(image, pixels(width), pixels(height), FilterType::Triangle)
}

/// Copy `source` into a `width`×`height` bitmap, repeating it if `repeat`
fn fill(source: &RgbaImage, width: u32, height: u32, repeat: bool) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    let (sw, sh) = source.dimensions();
    if sw == 0 || sh == 0 {
        return out;
    }

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if repeat {
            *pixel = *source.get_pixel(x % sw, y % sh);
        } else if x < sw && y < sh {
            *pixel = *source.get_pixel(x, y);
        }
    }
    out
}

/// Produce a bitmap of the requested size from `image` according to the fill
/// rules of the image op
pub fn surface_for(
    image: &RgbaImage,
    fill_type: ImageFillType,
    width: f64,
    height: f64,
    vertical_stripes: bool,
    horizontal_stripes: bool,
) -> RgbaImage {
    if image.width() as f64 == width && image.height() as f64 == height {
        return image.clone();
    }

    let scaled;
    let source = if fill_type == ImageFillType::Tile {
        image
    } else {
        scaled = scale(image, width, height, vertical_stripes, horizontal_stripes);
        &scaled
    };

    let repeat = fill_type == ImageFillType::Tile || vertical_stripes || horizontal_stripes;
    fill(source, pixels(width), pixels(height), repeat)
}
