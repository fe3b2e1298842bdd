//! Raster backend on tiny-skia
//!
//! Draws into a `tiny_skia::Pixmap`. Images cross the boundary as straight
//! alpha `image::RgbaImage` and are converted only at the edges. The clip is
//! an axis-aligned rectangle, kept both as float extents and as a pixel mask
//! for tiny-skia, with a save/restore stack.
//!
//! Rectangles and lines are drawn without anti-aliasing so 1px theme strokes
//! on half-pixel coordinates stay crisp. Arcs, arrows and glyphs are smoothed.

use std::f64::consts::{FRAC_PI_2, TAU};

use image::{Rgba as Pixel, RgbaImage};
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, GradientStop, LineCap, Mask, Path, PathBuilder,
    Pattern, Pixmap, Shader, SpreadMode, StrokeDash, Transform,
};
use tracing::debug;

use crate::render::canvas::{AlphaMask, Arc, Canvas, Paint, Stroke, TitleLayout};
use crate::shared::{Point, Rect};
use crate::theme::color::Rgba;

pub struct RasterCanvas {
    pixmap: Pixmap,
    clip: Rect,
    /// Pixel mask for `clip`; `None` while the clip covers the whole pixmap
    mask: Option<Mask>,
    saved: Vec<(Rect, Option<Mask>)>,
}

impl RasterCanvas {
    /// Transparent canvas of the given size; `None` if either side is zero
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(Self::with_pixmap)
    }

    /// Draw on top of an existing image
    pub fn from_image(image: &RgbaImage) -> Option<Self> {
        Some(Self::with_pixmap(pixmap_from_image(image)?))
    }

    fn with_pixmap(pixmap: Pixmap) -> Self {
        let clip = Rect::new(0.0, 0.0, pixmap.width() as f64, pixmap.height() as f64);
        Self {
            pixmap,
            clip,
            mask: None,
            saved: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Current contents with straight alpha
    pub fn to_image(&self) -> RgbaImage {
        let width = self.pixmap.width();
        let pixels = self.pixmap.pixels();
        RgbaImage::from_fn(width, self.pixmap.height(), |x, y| {
            let c = pixels[(y * width + x) as usize].demultiply();
            Pixel([c.red(), c.green(), c.blue(), c.alpha()])
        })
    }

    pub fn into_image(self) -> RgbaImage {
        self.to_image()
    }

    fn full(&self) -> Rect {
        Rect::new(0.0, 0.0, self.pixmap.width() as f64, self.pixmap.height() as f64)
    }

    /// Rebuild the pixel mask after the clip rectangle changed
    fn update_mask(&mut self) {
        let full = self.full();
        let covers_all = self.clip.x <= 0.0
            && self.clip.y <= 0.0
            && self.clip.right() >= full.width
            && self.clip.bottom() >= full.height;
        if self.clip.is_empty() || covers_all {
            self.mask = None;
            return;
        }

        self.mask = Mask::new(self.pixmap.width(), self.pixmap.height()).and_then(|mut mask| {
            let path = rect_path(self.clip)?;
            mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
            Some(mask)
        });
    }

    fn fill_path(&mut self, path: &Path, color: Rgba, anti_alias: bool) {
        let mut paint = solid(color);
        paint.anti_alias = anti_alias;
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.mask.as_ref(),
        );
    }

    fn stroke_path(&mut self, path: &Path, color: Rgba, stroke: &tiny_skia::Stroke, anti_alias: bool) {
        let mut paint = solid(color);
        paint.anti_alias = anti_alias;
        self.pixmap
            .stroke_path(path, &paint, stroke, Transform::identity(), self.mask.as_ref());
    }

    /// Mask combining the clip with a per-column alpha ramp across `dest`
    fn ramp_mask(&self, dest: Rect, mask: &AlphaMask) -> Option<Mask> {
        let width = self.pixmap.width() as usize;
        let mut ramp = match &self.mask {
            Some(clip) => clip.clone(),
            None => {
                let mut full = Mask::new(self.pixmap.width(), self.pixmap.height())?;
                full.data_mut().fill(255);
                full
            }
        };

        let columns: Vec<u16> = (0..width)
            .map(|x| {
                let t = (x as f64 + 0.5 - dest.x) / dest.width;
                (mask.alpha_at(t) * 255.0).round() as u16
            })
            .collect();
        for row in ramp.data_mut().chunks_mut(width) {
            for (value, &alpha) in row.iter_mut().zip(&columns) {
                *value = ((*value as u16 * alpha + 127) / 255) as u8;
            }
        }
        Some(ramp)
    }
}

fn skia_color(color: Rgba) -> Color {
    let [r, g, b, a] = color.to_rgba8();
    Color::from_rgba8(r, g, b, a)
}

fn solid(color: Rgba) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(skia_color(color));
    paint
}

fn skia_paint(paint: &Paint) -> tiny_skia::Paint<'static> {
    let gradient = match paint {
        Paint::Solid(color) => return solid(*color),
        Paint::Linear(gradient) => gradient,
    };

    let device = |p: Point| {
        tiny_skia::Point::from_xy(
            (gradient.rect.x + p.x * gradient.rect.width) as f32,
            (gradient.rect.y + p.y * gradient.rect.height) as f32,
        )
    };
    let stops = gradient
        .stops
        .iter()
        .map(|&(offset, color)| GradientStop::new(offset as f32, skia_color(color)))
        .collect();

    let shader = tiny_skia::LinearGradient::new(
        device(gradient.start),
        device(gradient.end),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or_else(|| {
        let color = gradient.stops.first().map_or(Rgba::TRANSPARENT, |&(_, c)| c);
        Shader::SolidColor(skia_color(color))
    });

    tiny_skia::Paint {
        shader,
        anti_alias: false,
        ..tiny_skia::Paint::default()
    }
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

fn rect_path(rect: Rect) -> Option<Path> {
    skia_rect(rect).map(PathBuilder::from_rect)
}

fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Signed sweep of `arc`, wrapped the way cairo does and capped at a turn
fn arc_sweep(arc: &Arc) -> f64 {
    let sweep = arc.end - arc.start;
    let sweep = if arc.negative {
        if sweep > 0.0 { sweep - (sweep / TAU).ceil() * TAU } else { sweep }
    } else if sweep < 0.0 {
        sweep + (-sweep / TAU).ceil() * TAU
    } else {
        sweep
    };
    sweep.clamp(-TAU, TAU)
}

/// Elliptical arc as cubic segments of at most a quarter turn; a pie is
/// closed through the center
fn arc_path(arc: &Arc, pie: bool) -> Option<Path> {
    let sweep = arc_sweep(arc);
    if sweep == 0.0 || arc.radius_x <= 0.0 || arc.radius_y <= 0.0 {
        return None;
    }

    let (cx, cy, rx, ry) = (arc.center.x, arc.center.y, arc.radius_x, arc.radius_y);
    let at = |angle: f64| (cx + rx * angle.cos(), cy + ry * angle.sin());
    let tangent = |angle: f64| (-rx * angle.sin(), ry * angle.cos());

    let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / segments as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut pb = PathBuilder::new();
    let (sx, sy) = at(arc.start);
    if pie {
        pb.move_to(cx as f32, cy as f32);
        pb.line_to(sx as f32, sy as f32);
    } else {
        pb.move_to(sx as f32, sy as f32);
    }

    for i in 0..segments {
        let a0 = arc.start + step * i as f64;
        let a1 = a0 + step;
        let (x0, y0) = at(a0);
        let (x1, y1) = at(a1);
        let (dx0, dy0) = tangent(a0);
        let (dx1, dy1) = tangent(a1);
        pb.cubic_to(
            (x0 + k * dx0) as f32,
            (y0 + k * dy0) as f32,
            (x1 - k * dx1) as f32,
            (y1 - k * dy1) as f32,
            x1 as f32,
            y1 as f32,
        );
    }

    if pie {
        pb.close();
    }
    pb.finish()
}

impl Canvas for RasterCanvas {
    fn save(&mut self) {
        self.saved.push((self.clip, self.mask.clone()));
    }

    fn restore(&mut self) {
        if let Some((clip, mask)) = self.saved.pop() {
            self.clip = clip;
            self.mask = mask;
        }
    }

    fn clip(&mut self, rect: Rect) {
        self.clip = self.clip.intersect(&rect);
        self.update_mask();
    }

    fn clip_extents(&self) -> Rect {
        self.clip
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        if self.clip.is_empty() || rect.is_empty() {
            return;
        }
        let Some(area) = skia_rect(rect) else {
            return;
        };
        self.pixmap
            .fill_rect(area, &skia_paint(paint), Transform::identity(), self.mask.as_ref());
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64) {
        if self.clip.is_empty() || width <= 0.0 {
            return;
        }
        let Some(path) = rect_path(rect) else {
            return;
        };
        let stroke = tiny_skia::Stroke {
            width: width as f32,
            ..tiny_skia::Stroke::default()
        };
        self.stroke_path(&path, color, &stroke, false);
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba, stroke: &Stroke) {
        if self.clip.is_empty() || stroke.width <= 0.0 {
            return;
        }

        // A zero length segment only shows up with a square cap, as a square
        if from == to {
            if stroke.square_cap {
                let half = stroke.width / 2.0;
                let square = Rect::new(from.x - half, from.y - half, stroke.width, stroke.width);
                self.fill_rect(square, &Paint::Solid(color));
            }
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };

        let dash = stroke
            .dash
            .and_then(|(on, off)| StrokeDash::new(vec![on as f32, off as f32], 0.0));
        let stroke = tiny_skia::Stroke {
            width: stroke.width as f32,
            line_cap: if stroke.square_cap {
                LineCap::Square
            } else {
                LineCap::Butt
            },
            dash,
            ..tiny_skia::Stroke::default()
        };
        self.stroke_path(&path, color, &stroke, false);
    }

    fn draw_arc(&mut self, arc: &Arc, color: Rgba, filled: bool) {
        if self.clip.is_empty() {
            return;
        }
        let Some(path) = arc_path(arc, filled) else {
            return;
        };

        if filled {
            self.fill_path(&path, color, true);
        } else {
            self.stroke_path(&path, color, &tiny_skia::Stroke::default(), true);
        }
    }

    fn paint_image(&mut self, image: &RgbaImage, dest: Rect, mask: Option<&AlphaMask>) {
        if self.clip.is_empty() || dest.is_empty() {
            return;
        }
        let (Some(source), Some(area)) = (pixmap_from_image(image), skia_rect(dest)) else {
            return;
        };

        let (opacity, ramp) = match mask {
            None => (1.0, None),
            Some(AlphaMask::Constant(a)) => (*a as f32 / 255.0, None),
            Some(ramp) => (1.0, self.ramp_mask(dest, ramp)),
        };

        let transform = Transform::from_row(
            (dest.width / image.width() as f64) as f32,
            0.0,
            0.0,
            (dest.height / image.height() as f64) as f32,
            dest.x as f32,
            dest.y as f32,
        );
        let paint = tiny_skia::Paint {
            shader: Pattern::new(
                source.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Nearest,
                opacity,
                transform,
            ),
            anti_alias: false,
            ..tiny_skia::Paint::default()
        };

        let mask = ramp.as_ref().or(self.mask.as_ref());
        self.pixmap
            .fill_rect(area, &paint, Transform::identity(), mask);
    }

    fn draw_title(
        &mut self,
        title: &TitleLayout,
        origin: Point,
        paint: &Paint,
        ellipsize_width: Option<f64>,
    ) {
        if self.clip.is_empty() {
            return;
        }
        let Some(font) = &title.font else {
            debug!("Title '{}' was measured without a font, not drawn", title.text);
            return;
        };

        let text = match ellipsize_width {
            Some(width) if width < title.logical.width => font.ellipsize(&title.text, width),
            _ => title.text.clone(),
        };

        let (width, height) = (self.pixmap.width() as i32, self.pixmap.height() as i32);
        let Some(mut coverage) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        let data = coverage.data_mut();
        font.rasterize(&text, origin, |x, y, c| {
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let i = (y * width + x) as usize;
            data[i] = data[i].max((c.clamp(0.0, 1.0) * 255.0).round() as u8);
        });

        if let Some(clip) = &self.mask {
            for (value, &m) in data.iter_mut().zip(clip.data()) {
                *value = ((*value as u16 * m as u16 + 127) / 255) as u8;
            }
        }

        let Some(area) = skia_rect(self.clip) else {
            return;
        };
        self.pixmap
            .fill_rect(area, &skia_paint(paint), Transform::identity(), Some(&coverage));
    }

    fn render_arrow(&mut self, angle: f64, x: f64, y: f64, size: f64, color: Rgba) {
        if self.clip.is_empty() || size <= 0.0 {
            return;
        }

        let center = Point::new(x + size / 2.0, y + size / 2.0);
        let (sin, cos) = angle.sin_cos();
        let rotate = |px: f64, py: f64| {
            (
                (center.x + px * cos - py * sin) as f32,
                (center.y + px * sin + py * cos) as f32,
            )
        };

        // Pointing up, then turned clockwise
        let h = size / 2.0;
        let (tx, ty) = rotate(0.0, -h / 2.0);
        let (lx, ly) = rotate(-h, h / 2.0);
        let (rx, ry) = rotate(h, h / 2.0);

        let mut pb = PathBuilder::new();
        pb.move_to(tx, ty);
        pb.line_to(lx, ly);
        pb.line_to(rx, ry);
        pb.close();
        if let Some(path) = pb.finish() {
            self.fill_path(&path, color, true);
        }
    }

    fn render_box(&mut self, rect: Rect, background: Rgba, frame: Option<Rgba>) {
        self.fill_rect(rect, &Paint::Solid(background));
        if let Some(frame) = frame {
            let outline = Rect::new(rect.x + 0.5, rect.y + 0.5, rect.width - 1.0, rect.height - 1.0);
            self.stroke_rect(outline, frame, 1.0);
        }
    }

    fn render_vline(&mut self, x: f64, y1: f64, y2: f64, color: Rgba) {
        let (top, bottom) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        self.fill_rect(Rect::new(x, top, 1.0, bottom - top + 1.0), &Paint::Solid(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::LinearGradient;
    use crate::render::text::tests::system_font;
    use std::f64::consts::PI;

    const RED: Rgba = Rgba::rgb(1.0, 0.0, 0.0);

    fn new_canvas(width: u32, height: u32) -> RasterCanvas {
        RasterCanvas::new(width, height).unwrap()
    }

    fn px(canvas: &RasterCanvas, x: u32, y: u32) -> [u8; 4] {
        canvas.to_image().get_pixel(x, y).0
    }

    fn alpha(canvas: &RasterCanvas, x: u32, y: u32) -> u8 {
        px(canvas, x, y)[3]
    }

    fn count_opaque(canvas: &RasterCanvas) -> usize {
        canvas.to_image().pixels().filter(|p| p.0[3] == 255).count()
    }

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
    }

    #[test]
    fn test_zero_size_canvas() {
        assert!(RasterCanvas::new(0, 10).is_none());
    }

    #[test]
    fn test_image_conversion_keeps_straight_alpha() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Pixel([255, 0, 0, 128]));
        image.put_pixel(1, 0, Pixel([10, 20, 30, 255]));

        let canvas = RasterCanvas::from_image(&image).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (2, 1));
        assert_eq!(px(&canvas, 0, 0), [255, 0, 0, 128]);
        assert_eq!(px(&canvas, 1, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn test_fill_respects_clip_and_restore() {
        let mut canvas = new_canvas(10, 10);
        canvas.save();
        canvas.clip(Rect::new(2.0, 2.0, 3.0, 3.0));
        assert_eq!(canvas.clip_extents(), Rect::new(2.0, 2.0, 3.0, 3.0));
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::Solid(RED));
        assert_eq!(count_opaque(&canvas), 9);
        assert_eq!(px(&canvas, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px(&canvas, 5, 5), [0, 0, 0, 0]);

        canvas.restore();
        assert_eq!(canvas.clip_extents(), Rect::new(0.0, 0.0, 10.0, 10.0));
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::Solid(RED));
        assert_eq!(count_opaque(&canvas), 100);
    }

    #[test]
    fn test_disjoint_clip_draws_nothing() {
        let mut canvas = new_canvas(4, 4);
        canvas.clip(Rect::new(20.0, 20.0, 2.0, 2.0));
        assert!(canvas.clip_extents().is_empty());
        canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), &Paint::Solid(RED));
        canvas.stroke_line(
            Point::new(0.0, 0.5),
            Point::new(4.0, 0.5),
            RED,
            &Stroke::default(),
        );
        assert_eq!(count_opaque(&canvas), 0);
    }

    #[test]
    fn test_source_over_blending() {
        let mut canvas = new_canvas(1, 1);
        let full = Rect::new(0.0, 0.0, 1.0, 1.0);
        canvas.fill_rect(full, &Paint::Solid(Rgba::BLACK));
        canvas.fill_rect(full, &Paint::Solid(Rgba::WHITE.with_alpha(0.5)));
        assert!(close(px(&canvas, 0, 0), [128, 128, 128, 255]));

        let mut empty = new_canvas(1, 1);
        empty.fill_rect(full, &Paint::Solid(RED.with_alpha(0.5)));
        assert!(close(px(&empty, 0, 0), [255, 0, 0, 128]));
    }

    #[test]
    fn test_gradient_fill_samples_pixel_centers() {
        let mut canvas = new_canvas(4, 1);
        let rect = Rect::new(0.0, 0.0, 4.0, 1.0);
        let paint = Paint::Linear(LinearGradient {
            rect,
            start: Point::new(0.0, 0.0),
            end: Point::new(1.0, 0.0),
            stops: vec![(0.0, Rgba::BLACK), (1.0, Rgba::WHITE)],
        });
        canvas.fill_rect(rect, &paint);
        assert!(close(px(&canvas, 0, 0), [32, 32, 32, 255]));
        assert!(close(px(&canvas, 3, 0), [223, 223, 223, 255]));
    }

    #[test]
    fn test_hairline_covers_one_row() {
        let mut canvas = new_canvas(6, 3);
        canvas.stroke_line(
            Point::new(0.0, 1.5),
            Point::new(4.0, 1.5),
            RED,
            &Stroke::default(),
        );
        for x in 0..4 {
            assert_eq!(alpha(&canvas, x, 1), 255);
        }
        assert_eq!(alpha(&canvas, 4, 1), 0);
        assert_eq!(count_opaque(&canvas), 4);
    }

    #[test]
    fn test_dashed_line_skips_gaps() {
        let mut canvas = new_canvas(8, 1);
        let stroke = Stroke {
            dash: Some((2.0, 2.0)),
            ..Stroke::default()
        };
        canvas.stroke_line(Point::new(0.0, 0.5), Point::new(8.0, 0.5), RED, &stroke);
        let alphas: Vec<u8> = (0..8).map(|x| alpha(&canvas, x, 0)).collect();
        assert_eq!(alphas, vec![255, 255, 0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn test_vertical_dashes_with_uneven_lengths() {
        let mut canvas = new_canvas(1, 10);
        let stroke = Stroke {
            dash: Some((3.0, 1.0)),
            ..Stroke::default()
        };
        canvas.stroke_line(Point::new(0.5, 0.0), Point::new(0.5, 10.0), RED, &stroke);
        let alphas: Vec<u8> = (0..10).map(|y| alpha(&canvas, 0, y)).collect();
        assert_eq!(alphas, vec![255, 255, 255, 0, 255, 255, 255, 0, 255, 255]);
    }

    #[test]
    fn test_square_cap_draws_point() {
        let mut canvas = new_canvas(3, 3);
        let stroke = Stroke {
            square_cap: true,
            ..Stroke::default()
        };
        let p = Point::new(1.5, 1.5);
        canvas.stroke_line(p, p, RED, &stroke);
        assert_eq!(count_opaque(&canvas), 1);
        assert_eq!(alpha(&canvas, 1, 1), 255);

        // Without a cap a zero length line leaves no mark
        let mut butt = new_canvas(3, 3);
        butt.stroke_line(p, p, RED, &Stroke::default());
        assert_eq!(count_opaque(&butt), 0);
    }

    #[test]
    fn test_square_cap_extends_line_ends() {
        let mut canvas = new_canvas(8, 3);
        let stroke = Stroke {
            square_cap: true,
            ..Stroke::default()
        };
        canvas.stroke_line(Point::new(2.0, 1.5), Point::new(5.0, 1.5), RED, &stroke);
        let alphas: Vec<u8> = (0..8).map(|x| alpha(&canvas, x, 1)).collect();
        // Half a pixel either side: 1.5 to 5.5 covers centers 1.5 through 4.5
        assert_eq!(alphas, vec![0, 255, 255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn test_stroke_rect_outline() {
        let mut canvas = new_canvas(5, 5);
        canvas.stroke_rect(Rect::new(0.5, 0.5, 4.0, 4.0), RED, 1.0);
        assert_eq!(count_opaque(&canvas), 16);
        assert_eq!(alpha(&canvas, 2, 2), 0);
        assert_eq!(px(&canvas, 4, 4), [255, 0, 0, 255]);

        // Corners are covered once, so a translucent outline stays even
        let mut translucent = new_canvas(5, 5);
        translucent.stroke_rect(Rect::new(0.5, 0.5, 4.0, 4.0), RED.with_alpha(0.5), 1.0);
        let alphas: Vec<u8> = translucent
            .to_image()
            .pixels()
            .map(|p| p.0[3])
            .filter(|&a| a != 0)
            .collect();
        assert_eq!(alphas.len(), 16);
        assert!(alphas.iter().all(|&a| a == alphas[0]));
    }

    fn circle(center: f64) -> Arc {
        Arc {
            center: Point::new(center, center),
            radius_x: 4.0,
            radius_y: 4.0,
            start: 0.0,
            end: 2.0 * PI,
            negative: false,
        }
    }

    #[test]
    fn test_filled_arc_is_pie() {
        let full = circle(5.0);
        let mut canvas = new_canvas(10, 10);
        canvas.draw_arc(&full, RED, true);
        let disc = count_opaque(&canvas);
        assert_eq!(alpha(&canvas, 5, 5), 255);
        assert_eq!(alpha(&canvas, 0, 0), 0);

        // 0 to pi/2 sweeps the lower right quadrant (y grows downwards)
        let quarter = Arc { end: FRAC_PI_2, ..full };
        let mut canvas = new_canvas(10, 10);
        canvas.draw_arc(&quarter, RED, true);
        assert_eq!(alpha(&canvas, 6, 6), 255);
        assert_eq!(alpha(&canvas, 3, 3), 0);
        assert_eq!(alpha(&canvas, 6, 3), 0);
        assert!(count_opaque(&canvas) * 3 < disc);
    }

    #[test]
    fn test_arc_outline_is_hollow() {
        let mut canvas = new_canvas(11, 11);
        canvas.draw_arc(&circle(5.5), RED, false);
        assert_eq!(alpha(&canvas, 5, 5), 0);
        // The 1px ring passes through x = 9.5 on the center row
        assert!(alpha(&canvas, 9, 5) > 200);
        assert_eq!(alpha(&canvas, 10, 0), 0);
    }

    #[test]
    fn test_negative_sweep() {
        let arc = Arc {
            end: -FRAC_PI_2,
            negative: true,
            ..circle(5.0)
        };
        let mut canvas = new_canvas(10, 10);
        canvas.draw_arc(&arc, RED, true);
        assert_eq!(alpha(&canvas, 6, 3), 255);
        assert_eq!(alpha(&canvas, 6, 6), 0);
        assert_eq!(alpha(&canvas, 3, 3), 0);
    }

    #[test]
    fn test_arc_sweep_wraps_like_cairo() {
        let arc = |start: f64, end: f64, negative: bool| Arc {
            start,
            end,
            negative,
            ..circle(5.0)
        };
        assert_eq!(arc_sweep(&arc(0.0, FRAC_PI_2, false)), FRAC_PI_2);
        // A forward arc ending before its start goes the long way round
        assert!((arc_sweep(&arc(FRAC_PI_2, 0.0, false)) - 3.0 * FRAC_PI_2).abs() < 1e-9);
        assert!((arc_sweep(&arc(0.0, FRAC_PI_2, true)) + 3.0 * FRAC_PI_2).abs() < 1e-9);
        assert_eq!(arc_sweep(&arc(0.0, 5.0 * PI, false)), TAU);
        assert!(arc_path(&arc(1.0, 1.0, false), true).is_none());
    }

    #[test]
    fn test_paint_image_scales_and_masks() {
        let source = RgbaImage::from_pixel(1, 1, Pixel([0, 0, 255, 255]));
        let mut canvas = new_canvas(4, 4);
        canvas.paint_image(&source, Rect::new(0.0, 0.0, 4.0, 4.0), None);
        assert_eq!(count_opaque(&canvas), 16);
        assert_eq!(px(&canvas, 3, 3), [0, 0, 255, 255]);

        let mut masked = new_canvas(4, 4);
        masked.paint_image(
            &source,
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Some(&AlphaMask::Constant(0)),
        );
        assert_eq!(masked.to_image().pixels().filter(|p| p.0[3] > 0).count(), 0);

        let mut ramp = new_canvas(4, 1);
        ramp.paint_image(
            &source,
            Rect::new(0.0, 0.0, 4.0, 1.0),
            Some(&AlphaMask::Horizontal(vec![0, 255])),
        );
        assert!(alpha(&ramp, 0, 0) < alpha(&ramp, 3, 0));
        assert!(alpha(&ramp, 0, 0) < 64);
    }

    #[test]
    fn test_image_ramp_respects_clip() {
        let source = RgbaImage::from_pixel(1, 1, Pixel([0, 0, 255, 255]));
        let mut canvas = new_canvas(4, 1);
        canvas.clip(Rect::new(0.0, 0.0, 2.0, 1.0));
        canvas.paint_image(
            &source,
            Rect::new(0.0, 0.0, 4.0, 1.0),
            Some(&AlphaMask::Horizontal(vec![255, 255])),
        );
        assert_eq!(alpha(&canvas, 1, 0), 255);
        assert_eq!(alpha(&canvas, 2, 0), 0);
    }

    /// Painted pixels of `canvas`, with their coordinates
    fn painted(canvas: &RasterCanvas) -> Vec<(u32, u32)> {
        canvas
            .to_image()
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_title_draws_glyphs_inside_ink() {
        let Some(font) = system_font() else {
            return;
        };
        let title = font.layout("Terminal");
        let origin = Point::new(2.0, 3.0);
        let mut canvas = new_canvas(120, 30);
        canvas.draw_title(&title, origin, &Paint::Solid(RED), None);

        let ink = Rect::new(
            origin.x + title.ink.x - 1.0,
            origin.y + title.ink.y - 1.0,
            title.ink.width + 2.0,
            title.ink.height + 2.0,
        );
        let marks = painted(&canvas);
        assert!(!marks.is_empty());
        assert!(marks
            .iter()
            .all(|&(x, y)| ink.contains(Point::new(x as f64 + 0.5, y as f64 + 0.5))));

        // Glyphs, not a filled box
        let box_area = (title.ink.width * title.ink.height) as usize;
        assert!(marks.len() < box_area);
    }

    #[test]
    fn test_title_elided_to_width() {
        let Some(font) = system_font() else {
            return;
        };
        let title = font.layout("A rather long window title");
        let limit = (title.logical.width / 2.0).floor();

        let mut full = new_canvas(400, 30);
        full.draw_title(&title, Point::new(0.0, 0.0), &Paint::Solid(RED), None);
        let mut short = new_canvas(400, 30);
        short.draw_title(&title, Point::new(0.0, 0.0), &Paint::Solid(RED), Some(limit));

        let rightmost = painted(&short).iter().map(|&(x, _)| x).max().unwrap_or(0);
        assert!((rightmost as f64) < limit + 2.0);
        assert!(painted(&short).len() < painted(&full).len());
    }

    #[test]
    fn test_title_respects_clip() {
        let Some(font) = system_font() else {
            return;
        };
        let title = font.layout("WWWW");
        let mut canvas = new_canvas(120, 30);
        canvas.clip(Rect::new(0.0, 0.0, 10.0, 30.0));
        canvas.draw_title(&title, Point::new(0.0, 0.0), &Paint::Solid(RED), None);
        assert!(painted(&canvas).iter().all(|&(x, _)| x < 10));

        let unmeasured = TitleLayout::new("Terminal", 40.0, 12.0);
        let mut blank = new_canvas(60, 20);
        blank.draw_title(&unmeasured, Point::new(0.0, 0.0), &Paint::Solid(RED), None);
        assert!(painted(&blank).is_empty());
    }

    #[test]
    fn test_arrow_points_up_by_default() {
        let mut canvas = new_canvas(8, 8);
        canvas.render_arrow(0.0, 0.0, 0.0, 8.0, RED);
        assert!(count_opaque(&canvas) > 0);
        // Wider at the bottom than at the top
        let row = |c: &RasterCanvas, y: u32| (0..8).filter(|&x| alpha(c, x, y) == 255).count();
        assert!(row(&canvas, 5) > row(&canvas, 3));

        let mut down = new_canvas(8, 8);
        down.render_arrow(PI, 0.0, 0.0, 8.0, RED);
        assert!(row(&down, 2) > row(&down, 4));
    }

    #[test]
    fn test_box_and_vline() {
        let mut canvas = new_canvas(6, 6);
        canvas.render_box(Rect::new(0.0, 0.0, 6.0, 6.0), Rgba::WHITE, Some(Rgba::BLACK));
        assert_eq!(px(&canvas, 0, 0), [0, 0, 0, 255]);
        assert_eq!(px(&canvas, 5, 3), [0, 0, 0, 255]);
        assert_eq!(px(&canvas, 2, 2), [255, 255, 255, 255]);

        let mut line = new_canvas(4, 6);
        line.render_vline(2.0, 4.0, 1.0, RED);
        let column: Vec<u8> = (0..6).map(|y| alpha(&line, 2, y)).collect();
        assert_eq!(column, vec![0, 255, 255, 255, 255, 0]);
        assert_eq!(count_opaque(&line), 4);
    }
}
