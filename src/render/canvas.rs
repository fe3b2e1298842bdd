//! Drawing surface abstraction
//!
//! Draw ops never talk to a concrete backend. They emit primitives through the
//! `Canvas` trait, which the tiny-skia raster backend (and the test recorder)
//! implement.

use image::RgbaImage;

use crate::render::text::TitleFont;
use crate::shared::{Point, Rect};
use crate::theme::color::Rgba;

/// Linear gradient in the unit space of `rect`
///
/// `start` and `end` are fractions of the rect, so (0,0)→(1,0) runs across its
/// full width. With `rect` = (0,0,1,1) the points are plain device coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub rect: Rect,
    pub start: Point,
    pub end: Point,
    /// Offsets in [0, 1], ascending
    pub stops: Vec<(f64, Rgba)>,
}

impl LinearGradient {
    /// Color at a device-space point; padded beyond the end stops
    pub fn color_at(&self, p: Point) -> Rgba {
        let ux = if self.rect.width != 0.0 {
            (p.x - self.rect.x) / self.rect.width
        } else {
            0.0
        };
        let uy = if self.rect.height != 0.0 {
            (p.y - self.rect.y) / self.rect.height
        } else {
            0.0
        };

        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            ((ux - self.start.x) * dx + (uy - self.start.y) * dy) / len2
        } else {
            0.0
        };

        self.color_at_offset(t)
    }

    pub fn color_at_offset(&self, t: f64) -> Rgba {
        let Some(&(first_offset, first)) = self.stops.first() else {
            return Rgba::TRANSPARENT;
        };
        if t <= first_offset {
            return first;
        }

        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let span = o1 - o0;
                let f = if span > 0.0 { (t - o0) / span } else { 1.0 };
                return Rgba::blend(c0, c1, f);
            }
        }

        self.stops.last().map(|&(_, c)| c).unwrap_or(first)
    }
}

/// Fill source
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
}

/// Line stroke parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    /// On/off lengths
    pub dash: Option<(f64, f64)>,
    /// Extend the ends by half the width
    pub square_cap: bool,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            dash: None,
            square_cap: false,
        }
    }
}

/// Alpha applied across the width of a painted image
#[derive(Debug, Clone, PartialEq)]
pub enum AlphaMask {
    Constant(u8),
    /// Evenly spaced stops from left to right
    Horizontal(Vec<u8>),
}

impl AlphaMask {
    /// Alpha in [0, 1] at fraction `t` of the width
    pub fn alpha_at(&self, t: f64) -> f64 {
        match self {
            Self::Constant(a) => *a as f64 / 255.0,
            Self::Horizontal(stops) => match stops.len() {
                0 => 1.0,
                1 => stops[0] as f64 / 255.0,
                n => {
                    let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
                    let i = (pos.floor() as usize).min(n - 2);
                    let f = pos - i as f64;
                    let a = stops[i] as f64 + (stops[i + 1] as f64 - stops[i] as f64) * f;
                    a / 255.0
                }
            },
        }
    }
}

/// Elliptical arc; angles in radians, cairo convention (0 = 3 o'clock)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    pub start: f64,
    pub end: f64,
    /// Sweep from `start` towards decreasing angles
    pub negative: bool,
}

/// Measured window title
///
/// Built by `TitleFont::layout`, which attaches the font so a raster canvas
/// can draw the glyphs. Hosts that measure text themselves use `new`.
#[derive(Debug, Clone)]
pub struct TitleLayout {
    pub text: String,
    /// Logical extents, relative to the layout origin
    pub logical: Rect,
    /// Ink extents, relative to the layout origin
    pub ink: Rect,
    pub font: Option<TitleFont>,
}

impl TitleLayout {
    pub fn new(text: &str, width: f64, height: f64) -> Self {
        Self {
            text: text.to_string(),
            logical: Rect::new(0.0, 0.0, width, height),
            ink: Rect::new(0.0, 0.0, width, height),
            font: None,
        }
    }
}

/// Backend capability used by draw ops
pub trait Canvas {
    fn save(&mut self);
    fn restore(&mut self);
    /// Intersect the current clip with `rect`
    fn clip(&mut self, rect: Rect);
    fn clip_extents(&self) -> Rect;

    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64);
    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba, stroke: &Stroke);
    /// A filled arc is closed through its center
    fn draw_arc(&mut self, arc: &Arc, color: Rgba, filled: bool);

    /// Scale `image` into `dest`, optionally masked
    fn paint_image(&mut self, image: &RgbaImage, dest: Rect, mask: Option<&AlphaMask>);

    /// Draw a title layout with its origin at `origin`; text beyond
    /// `ellipsize_width` is elided
    fn draw_title(
        &mut self,
        title: &TitleLayout,
        origin: Point,
        paint: &Paint,
        ellipsize_width: Option<f64>,
    );

    /// Toolkit arrow pointing at `angle` (0 = up, clockwise)
    fn render_arrow(&mut self, angle: f64, x: f64, y: f64, size: f64, color: Rgba);
    /// Toolkit box: background plus optional frame
    fn render_box(&mut self, rect: Rect, background: Rgba, frame: Option<Rgba>);
    fn render_vline(&mut self, x: f64, y1: f64, y2: f64, color: Rgba);
}

#[cfg(test)]
pub mod testing {
    //! Canvas that records calls instead of drawing

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Clip(Rect),
        FillRect(Rect, Paint),
        StrokeRect(Rect, Rgba, f64),
        Line(Point, Point, Rgba, Stroke),
        Arc(Arc, Rgba, bool),
        Image {
            width: u32,
            height: u32,
            dest: Rect,
            mask: Option<AlphaMask>,
        },
        Title {
            text: String,
            origin: Point,
            paint: Paint,
            ellipsize: Option<f64>,
        },
        Arrow(f64, f64, f64, f64),
        Box(Rect),
        VLine(f64, f64, f64),
    }

    pub struct RecordingCanvas {
        pub calls: Vec<Call>,
        clip: Rect,
        stack: Vec<Rect>,
    }

    impl RecordingCanvas {
        pub fn new(width: f64, height: f64) -> Self {
            Self {
                calls: Vec::new(),
                clip: Rect::new(0.0, 0.0, width, height),
                stack: Vec::new(),
            }
        }

        /// Calls other than clip bookkeeping
        pub fn drawn(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|c| !matches!(c, Call::Clip(_)))
                .collect()
        }
    }

    impl Canvas for RecordingCanvas {
        fn save(&mut self) {
            self.stack.push(self.clip);
        }

        fn restore(&mut self) {
            if let Some(clip) = self.stack.pop() {
                self.clip = clip;
            }
        }

        fn clip(&mut self, rect: Rect) {
            self.clip = self.clip.intersect(&rect);
            self.calls.push(Call::Clip(rect));
        }

        fn clip_extents(&self) -> Rect {
            self.clip
        }

        fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
            self.calls.push(Call::FillRect(rect, paint.clone()));
        }

        fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: f64) {
            self.calls.push(Call::StrokeRect(rect, color, width));
        }

        fn stroke_line(&mut self, from: Point, to: Point, color: Rgba, stroke: &Stroke) {
            self.calls.push(Call::Line(from, to, color, *stroke));
        }

        fn draw_arc(&mut self, arc: &Arc, color: Rgba, filled: bool) {
            self.calls.push(Call::Arc(*arc, color, filled));
        }

        fn paint_image(&mut self, image: &RgbaImage, dest: Rect, mask: Option<&AlphaMask>) {
            self.calls.push(Call::Image {
                width: image.width(),
                height: image.height(),
                dest,
                mask: mask.cloned(),
            });
        }

        fn draw_title(
            &mut self,
            title: &TitleLayout,
            origin: Point,
            paint: &Paint,
            ellipsize_width: Option<f64>,
        ) {
            self.calls.push(Call::Title {
                text: title.text.clone(),
                origin,
                paint: paint.clone(),
                ellipsize: ellipsize_width,
            });
        }

        fn render_arrow(&mut self, angle: f64, x: f64, y: f64, size: f64, _color: Rgba) {
            self.calls.push(Call::Arrow(angle, x, y, size));
        }

        fn render_box(&mut self, rect: Rect, _background: Rgba, _frame: Option<Rgba>) {
            self.calls.push(Call::Box(rect));
        }

        fn render_vline(&mut self, x: f64, y1: f64, y2: f64, _color: Rgba) {
            self.calls.push(Call::VLine(x, y1, y2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_interpolates_in_rect_space() {
        let gradient = LinearGradient {
            rect: Rect::new(10.0, 0.0, 100.0, 10.0),
            start: Point::new(0.0, 0.0),
            end: Point::new(1.0, 0.0),
            stops: vec![(0.0, Rgba::BLACK), (1.0, Rgba::WHITE)],
        };

        assert_eq!(gradient.color_at(Point::new(10.0, 5.0)), Rgba::BLACK);
        assert_eq!(gradient.color_at(Point::new(110.0, 5.0)), Rgba::WHITE);
        let mid = gradient.color_at(Point::new(60.0, 5.0));
        assert!((mid.red - 0.5).abs() < 1e-9);
        // Padded outside the rect
        assert_eq!(gradient.color_at(Point::new(500.0, 5.0)), Rgba::WHITE);
    }

    #[test]
    fn test_alpha_mask_ramp() {
        let mask = AlphaMask::Horizontal(vec![255, 0]);
        assert_eq!(mask.alpha_at(0.0), 1.0);
        assert_eq!(mask.alpha_at(1.0), 0.0);
        assert!((mask.alpha_at(0.5) - 0.5).abs() < 1e-9);
        assert_eq!(AlphaMask::Constant(0).alpha_at(0.3), 0.0);
    }
}
