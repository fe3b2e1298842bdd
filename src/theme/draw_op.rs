//! Draw operations and op lists
//!
//! A `DrawOpList` is the rendering program for one frame piece or button. Lists
//! are shared (`Rc`) between every op that embeds them, and must never end up
//! containing themselves.

use std::cell::{Ref, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::render::canvas::{Arc, Canvas, LinearGradient, Paint, Stroke, TitleLayout};
use crate::render::pixbuf::{self, ImageFillType};
use crate::shared::{Point, Rect};
use crate::theme::color::{ColorComponent, ColorSpec, StyleProvider, WidgetState};
use crate::theme::error::{Result, ThemeError};
use crate::theme::expr::{ExprEnv, Expression};
use crate::theme::gradient::{AlphaGradientSpec, GradientSpec};

/// Per-render inputs supplied by the host
#[derive(Debug, Clone, Copy)]
pub struct DrawInfo<'a> {
    pub scale: i32,
    /// Whole frame size
    pub width: f64,
    pub height: f64,
    pub left_width: f64,
    pub right_width: f64,
    pub top_height: f64,
    pub bottom_height: f64,
    pub mini_icon: Option<&'a RgbaImage>,
    pub icon: Option<&'a RgbaImage>,
    pub title_layout: Option<&'a TitleLayout>,
    /// Width of the fade-out applied to titles that overflow
    pub title_fade_margin: f64,
}

impl Default for DrawInfo<'_> {
    fn default() -> Self {
        Self {
            scale: 1,
            width: 0.0,
            height: 0.0,
            left_width: 0.0,
            right_width: 0.0,
            top_height: 0.0,
            bottom_height: 0.0,
            mini_icon: None,
            icon: None,
            title_layout: None,
            title_fade_margin: 30.0,
        }
    }
}

impl DrawInfo<'_> {
    /// Expression environment for drawing into `rect`
    pub fn env_for(&self, rect: Rect) -> ExprEnv {
        let dims = |img: Option<&RgbaImage>| {
            img.map_or((0.0, 0.0), |i| (i.width() as f64, i.height() as f64))
        };
        let (mini_icon_width, mini_icon_height) = dims(self.mini_icon);
        let (icon_width, icon_height) = dims(self.icon);
        let (title_width, title_height) = self
            .title_layout
            .map_or((0.0, 0.0), |t| (t.logical.width, t.logical.height));

        ExprEnv {
            rect,
            object_width: None,
            object_height: None,
            left_width: self.left_width,
            right_width: self.right_width,
            top_height: self.top_height,
            bottom_height: self.bottom_height,
            title_width,
            title_height,
            frame_x_center: self.width / 2.0 - rect.x,
            frame_y_center: self.height / 2.0 - rect.y,
            mini_icon_width,
            mini_icon_height,
            icon_width,
            icon_height,
            scale: self.scale,
        }
    }
}

// ============================================================================
// Op payloads
// ============================================================================

/// Position and size expressions shared by most ops
#[derive(Debug, Clone, PartialEq)]
pub struct OpRect {
    pub x: Expression,
    pub y: Expression,
    pub width: Expression,
    pub height: Expression,
}

impl OpRect {
    pub fn new(x: Expression, y: Expression, width: Expression, height: Expression) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn eval(&self, env: &ExprEnv) -> Rect {
        Rect::new(
            self.x.parse_x_position(env),
            self.y.parse_y_position(env),
            self.width.parse_size(env),
            self.height.parse_size(env),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl ArrowType {
    /// Radians clockwise from pointing up
    fn angle(&self) -> Option<f64> {
        match self {
            Self::Up => Some(0.0),
            Self::Right => Some(PI / 2.0),
            Self::Down => Some(PI),
            Self::Left => Some(3.0 * PI / 2.0),
            Self::None => None,
        }
    }
}

impl FromStr for ArrowType {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "none" => Ok(Self::None),
            _ => Err(ThemeError::Format(format!(
                "Did not understand arrow \"{}\" for <gtk_arrow> element",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowType {
    None,
    In,
    #[default]
    Out,
    EtchedIn,
    EtchedOut,
}

impl FromStr for ShadowType {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "etched_in" => Ok(Self::EtchedIn),
            "etched_out" => Ok(Self::EtchedOut),
            _ => Err(ThemeError::Format(format!(
                "Did not understand shadow \"{}\" for <gtk_box> element",
                s
            ))),
        }
    }
}

/// Bitmap op; owns its image and the last colorized copy of it
#[derive(Debug)]
pub struct ImageOp {
    pub image: RgbaImage,
    pub colorize: Option<ColorSpec>,
    pub alpha: Option<AlphaGradientSpec>,
    pub rect: OpRect,
    pub fill_type: ImageFillType,
    pub vertical_stripes: bool,
    pub horizontal_stripes: bool,
    /// RGB key the cached bitmap was colorized with
    colorize_cache: RefCell<Option<(u32, RgbaImage)>>,
}

impl ImageOp {
    pub fn new(image: RgbaImage, rect: OpRect) -> Self {
        Self {
            image,
            colorize: None,
            alpha: None,
            rect,
            fill_type: ImageFillType::Scale,
            vertical_stripes: false,
            horizontal_stripes: false,
            colorize_cache: RefCell::new(None),
        }
    }

    /// Run `f` on the source bitmap, recolored first if the op asks for it
    fn with_source<R>(&self, provider: &dyn StyleProvider, f: impl FnOnce(&RgbaImage) -> R) -> R {
        let Some(spec) = &self.colorize else {
            return f(&self.image);
        };

        let color = spec.render(provider);
        let key = color.rgb_key();
        let stale = !matches!(&*self.colorize_cache.borrow(), Some((k, _)) if *k == key);
        if stale {
            *self.colorize_cache.borrow_mut() = Some((key, pixbuf::colorize(&self.image, color)));
        }

        match &*self.colorize_cache.borrow() {
            Some((_, image)) => f(image),
            None => f(&self.image),
        }
    }

    /// Key of the currently cached colorized bitmap
    pub fn colorize_cache_key(&self) -> Option<u32> {
        self.colorize_cache.borrow().as_ref().map(|(key, _)| *key)
    }
}

/// One primitive of the drawing language
#[derive(Debug)]
pub enum DrawOp {
    Line {
        color: ColorSpec,
        dash_on_length: i32,
        dash_off_length: i32,
        width: i32,
        x1: Expression,
        y1: Expression,
        x2: Option<Expression>,
        y2: Option<Expression>,
    },
    Rectangle {
        color: ColorSpec,
        filled: bool,
        rect: OpRect,
    },
    Arc {
        color: ColorSpec,
        filled: bool,
        rect: OpRect,
        /// Degrees, 0 at 12 o'clock
        start_angle: f64,
        /// Degrees, positive sweeps clockwise
        extent_angle: f64,
    },
    Clip {
        rect: OpRect,
    },
    Tint {
        color: ColorSpec,
        alpha: Option<AlphaGradientSpec>,
        rect: OpRect,
    },
    Gradient {
        gradient: GradientSpec,
        alpha: Option<AlphaGradientSpec>,
        rect: OpRect,
    },
    Image(Box<ImageOp>),
    GtkArrow {
        state: WidgetState,
        shadow: ShadowType,
        arrow: ArrowType,
        filled: bool,
        rect: OpRect,
    },
    GtkBox {
        state: WidgetState,
        shadow: ShadowType,
        rect: OpRect,
    },
    GtkVline {
        state: WidgetState,
        x: Expression,
        y1: Expression,
        y2: Expression,
    },
    Icon {
        alpha: Option<AlphaGradientSpec>,
        rect: OpRect,
        fill_type: ImageFillType,
    },
    Title {
        color: ColorSpec,
        x: Expression,
        y: Expression,
        ellipsize_width: Option<Expression>,
    },
    OpList {
        op_list: Rc<DrawOpList>,
        rect: OpRect,
    },
    Tile {
        op_list: Rc<DrawOpList>,
        rect: OpRect,
        tile_xoffset: Expression,
        tile_yoffset: Expression,
        tile_width: Expression,
        tile_height: Expression,
    },
}

impl DrawOp {
    /// Child list embedded by this op, if any
    pub fn child_list(&self) -> Option<&Rc<DrawOpList>> {
        match self {
            Self::OpList { op_list, .. } | Self::Tile { op_list, .. } => Some(op_list),
            _ => None,
        }
    }

    fn draw(
        &self,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        info: &DrawInfo<'_>,
        env: &ExprEnv,
    ) {
        match self {
            Self::Line {
                color,
                dash_on_length,
                dash_off_length,
                width,
                x1,
                y1,
                x2,
                y2,
            } => {
                let color = color.render(provider);
                let x1 = x1.parse_x_position(env);
                let y1 = y1.parse_y_position(env);

                if x2.is_none() && y2.is_none() && *width == 0 {
                    canvas.fill_rect(Rect::new(x1, y1, 1.0, 1.0), &Paint::Solid(color));
                    return;
                }

                let x2 = x2.as_ref().map_or(x1, |e| e.parse_x_position(env));
                let y2 = y2.as_ref().map_or(y1, |e| e.parse_y_position(env));

                let mut stroke = Stroke {
                    width: if *width > 0 { *width as f64 } else { 1.0 },
                    dash: (*dash_on_length > 0 && *dash_off_length > 0)
                        .then(|| (*dash_on_length as f64, *dash_off_length as f64)),
                    square_cap: false,
                };

                // Pixel-align axis-parallel wide lines the way X rasterizes them
                if (y1 == y2 || x1 == x2) && *width != 0 {
                    let offset = if width % 2 != 0 { 0.5 } else { 0.0 };
                    if y1 == y2 {
                        canvas.stroke_line(
                            Point::new(x1, y1 + offset),
                            Point::new(x2, y2 + offset),
                            color,
                            &stroke,
                        );
                    } else {
                        canvas.stroke_line(
                            Point::new(x1 + offset, y1),
                            Point::new(x2 + offset, y2),
                            color,
                            &stroke,
                        );
                    }
                } else {
                    // Zero-width lines include both end points
                    if *width == 0 {
                        stroke.square_cap = true;
                    }
                    canvas.stroke_line(
                        Point::new(x1 + 0.5, y1 + 0.5),
                        Point::new(x2 + 0.5, y2 + 0.5),
                        color,
                        &stroke,
                    );
                }
            }

            Self::Rectangle {
                color,
                filled,
                rect,
            } => {
                let color = color.render(provider);
                let r = rect.eval(env);
                if *filled {
                    canvas.fill_rect(r, &Paint::Solid(color));
                } else {
                    canvas.stroke_rect(Rect::new(r.x + 0.5, r.y + 0.5, r.width, r.height), color, 1.0);
                }
            }

            Self::Arc {
                color,
                filled,
                rect,
                start_angle,
                extent_angle,
            } => {
                let color = color.render(provider);
                let r = rect.eval(env);

                // Start at 12 o'clock instead of 3
                let start = start_angle * (PI / 180.0) - 0.5 * PI;
                let end = start + extent_angle * (PI / 180.0);

                let arc = Arc {
                    center: Point::new(r.x + r.width / 2.0 + 0.5, r.y + r.height / 2.0 + 0.5),
                    radius_x: r.width / 2.0,
                    radius_y: r.height / 2.0,
                    start,
                    end,
                    negative: *extent_angle < 0.0,
                };
                canvas.draw_arc(&arc, color, *filled);
            }

            // Handled by the list
            Self::Clip { .. } => {}

            Self::Tint { color, alpha, rect } => {
                let r = rect.eval(env);
                let color = color.render(provider);
                AlphaGradientSpec::render(alpha.as_ref(), color, canvas, r);
            }

            Self::Gradient {
                gradient,
                alpha,
                rect,
            } => {
                let r = rect.eval(env);
                gradient.render(alpha.as_ref(), canvas, provider, r);
            }

            Self::Image(op) => {
                let scale = info.scale.max(1) as f64;

                // Image dimensions are only visible to this op
                let mut env = *env;
                env.object_width = Some(op.image.width() as f64);
                env.object_height = Some(op.image.height() as f64);

                let width = op.rect.width.parse_size(&env) * scale;
                let height = op.rect.height.parse_size(&env) * scale;

                let surface = op.with_source(provider, |source| {
                    pixbuf::surface_for(
                        source,
                        op.fill_type,
                        width,
                        height,
                        op.vertical_stripes,
                        op.horizontal_stripes,
                    )
                });

                let x = op.rect.x.parse_x_position(&env);
                let y = op.rect.y.parse_y_position(&env);
                let dest = Rect::new(
                    x,
                    y,
                    surface.width() as f64 / scale,
                    surface.height() as f64 / scale,
                );
                let mask = op.alpha.as_ref().and_then(AlphaGradientSpec::mask);
                canvas.paint_image(&surface, dest, mask.as_ref());
            }

            Self::GtkArrow {
                state, arrow, rect, ..
            } => {
                let r = rect.eval(env);
                let size = r.width.max(r.height);
                let Some(angle) = arrow.angle() else {
                    return;
                };
                let color = ColorComponent::Fg.resolve(provider, *state);
                canvas.render_arrow(angle, r.x, r.y, size, color);
            }

            Self::GtkBox {
                state,
                shadow,
                rect,
            } => {
                let r = rect.eval(env);
                let background = ColorComponent::Bg.resolve(provider, *state);
                let frame = (*shadow != ShadowType::None)
                    .then(|| ColorComponent::Dark.resolve(provider, *state));
                canvas.render_box(r, background, frame);
            }

            Self::GtkVline { state, x, y1, y2 } => {
                let x = x.parse_x_position(env);
                let y1 = y1.parse_y_position(env);
                let y2 = y2.parse_y_position(env);
                let color = ColorComponent::Dark.resolve(provider, *state);
                canvas.render_vline(x, y1, y2, color);
            }

            Self::Icon {
                alpha,
                rect,
                fill_type,
            } => {
                let width = rect.width.parse_size(env);
                let height = rect.height.parse_size(env);

                let source = match (info.mini_icon, info.icon) {
                    (Some(mini), _)
                        if width <= mini.width() as f64 && height <= mini.height() as f64 =>
                    {
                        mini
                    }
                    (_, Some(icon)) => icon,
                    _ => return,
                };

                let surface = pixbuf::surface_for(source, *fill_type, width, height, false, false);
                let x = rect.x.parse_x_position(env);
                let y = rect.y.parse_y_position(env);
                let dest = Rect::new(x, y, surface.width() as f64, surface.height() as f64);
                let mask = alpha.as_ref().and_then(AlphaGradientSpec::mask);
                canvas.paint_image(&surface, dest, mask.as_ref());
            }

            Self::Title {
                color,
                x,
                y,
                ellipsize_width,
            } => {
                let Some(layout) = info.title_layout else {
                    return;
                };
                let color = color.render(provider);
                let x = x.parse_x_position(env);
                let y = y.parse_y_position(env);

                let mut paint = Paint::Solid(color);
                let mut ellipsize = None;

                if let Some(expr) = ellipsize_width {
                    let width = expr.parse_x_position(env) - env.rect.x;

                    // Elide against the ink extents, not the logical ones
                    let right_bearing = ((layout.ink.x + layout.ink.width)
                        - (layout.logical.x + layout.logical.width))
                        .max(0.0);
                    let width = (width - right_bearing).max(0.0);

                    if width < layout.logical.width {
                        ellipsize = Some(width);
                    }
                } else if x - env.rect.x + env.title_width >= env.rect.width {
                    let text_space =
                        (env.rect.x + env.rect.width - (x - env.rect.x) - env.right_width).trunc();
                    let start_alpha = 1.0 - info.title_fade_margin / text_space;
                    let start_alpha = if start_alpha.is_finite() {
                        start_alpha.clamp(0.0, 1.0)
                    } else {
                        0.0
                    };

                    paint = Paint::Linear(LinearGradient {
                        rect: Rect::new(0.0, 0.0, 1.0, 1.0),
                        start: Point::new(x, y),
                        end: Point::new(text_space, env.title_height),
                        stops: vec![
                            (0.0, color),
                            (start_alpha, color),
                            (1.0, color.with_alpha(0.0)),
                        ],
                    });
                }

                canvas.draw_title(layout, Point::new(x, y), &paint, ellipsize);
            }

            Self::OpList { op_list, rect } => {
                let r = rect.eval(env);
                op_list.draw(canvas, provider, info, r);
            }

            Self::Tile {
                op_list,
                rect,
                tile_xoffset,
                tile_yoffset,
                tile_width,
                tile_height,
            } => {
                let r = rect.eval(env);

                canvas.save();
                canvas.clip(r);

                // Offsets are relative to the list's own origin
                let xoffset = tile_xoffset.parse_x_position(env) - env.rect.x;
                let yoffset = tile_yoffset.parse_y_position(env) - env.rect.y;

                let width = tile_width.parse_size(env);
                let height = tile_height.parse_size(env);

                // Only tiles that reach the visible part of the rect are drawn
                let visible = canvas.clip_extents();
                let columns = tile_starts(r.x - xoffset, width, visible.x, visible.right());
                let rows = tile_starts(r.y - yoffset, height, visible.y, visible.bottom());

                for &x in &columns {
                    for &y in &rows {
                        op_list.draw(canvas, provider, info, Rect::new(x, y, width, height));
                    }
                }

                canvas.restore();
            }
        }
    }
}

/// Origins of the tiles of a grid anchored at `origin` that overlap
/// `start..end`
///
/// The count is bounded by the span, so offsets far outside the visible area
/// neither stall on float precision nor walk through unseen tiles.
fn tile_starts(origin: f64, size: f64, start: f64, end: f64) -> Vec<f64> {
    if !(size > 0.0) || !origin.is_finite() || !(end > start) {
        return Vec::new();
    }

    let first = ((start - origin) / size).floor().max(0.0);
    let last = ((end - origin) / size).ceil();
    let count = (last - first).min(((end - start) / size).ceil() + 1.0);
    if !(count > 0.0) {
        return Vec::new();
    }

    let mut starts: Vec<f64> = Vec::new();
    for i in 0..count as usize {
        let x = origin + (first + i as f64) * size;
        if x >= end {
            break;
        }
        if starts.last().map_or(true, |&prev| x > prev) {
            starts.push(x);
        }
    }
    starts
}

// ============================================================================
// Op list
// ============================================================================

/// Ordered, shared sequence of draw ops
#[derive(Debug, Default)]
pub struct DrawOpList {
    ops: RefCell<Vec<DrawOp>>,
}

impl DrawOpList {
    pub fn new(n_preallocs: usize) -> Rc<Self> {
        Rc::new(Self {
            ops: RefCell::new(Vec::with_capacity(n_preallocs)),
        })
    }

    /// Append without a containment check
    pub fn append(&self, op: DrawOp) {
        self.ops.borrow_mut().push(op);
    }

    /// Append `op`, refusing it if it would make this list contain itself
    pub fn append_checked(self: &Rc<Self>, op: DrawOp, name: &str) -> Result<()> {
        if let Some(child) = op.child_list() {
            if Rc::ptr_eq(child, self) || child.contains(self) {
                return Err(ThemeError::ListContainsSelf(name.to_string()));
            }
        }
        self.append(op);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ops.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }

    pub fn ops(&self) -> Ref<'_, Vec<DrawOp>> {
        self.ops.borrow()
    }

    /// True if `child` is embedded anywhere below this list
    pub fn contains(&self, child: &Rc<DrawOpList>) -> bool {
        self.ops.borrow().iter().any(|op| match op.child_list() {
            Some(list) => Rc::ptr_eq(list, child) || list.contains(child),
            None => false,
        })
    }

    /// Empty lists are valid
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Run every op against `rect`
    pub fn draw(
        &self,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        info: &DrawInfo<'_>,
        rect: Rect,
    ) {
        let env = info.env_for(rect);

        canvas.save();
        let base = canvas.clip_extents().intersect(&rect);

        for op in self.ops.borrow().iter() {
            if let DrawOp::Clip { rect: clip } = op {
                // Each clip starts over from the list's own bounds
                canvas.restore();
                canvas.save();
                canvas.clip(base);
                canvas.clip(clip.eval(&env));
            } else if !canvas.clip_extents().is_empty() {
                op.draw(canvas, provider, info, &env);
            }
        }

        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::testing::{Call, RecordingCanvas};
    use crate::render::canvas::AlphaMask;
    use crate::theme::color::{Rgba, StaticStyle};
    use image::Rgba as Pixel;

    fn e(src: &str) -> Expression {
        Expression::parse(src).unwrap()
    }

    fn op_rect(x: &str, y: &str, w: &str, h: &str) -> OpRect {
        OpRect::new(e(x), e(y), e(w), e(h))
    }

    fn fill(x: &str, y: &str, w: &str, h: &str) -> DrawOp {
        DrawOp::Rectangle {
            color: ColorSpec::Basic(Rgba::BLACK),
            filled: true,
            rect: op_rect(x, y, w, h),
        }
    }

    fn line(width: i32, x2: Option<&str>, y2: Option<&str>) -> DrawOp {
        DrawOp::Line {
            color: ColorSpec::Basic(Rgba::WHITE),
            dash_on_length: 0,
            dash_off_length: 0,
            width,
            x1: e("0"),
            y1: e("0"),
            x2: x2.map(e),
            y2: y2.map(e),
        }
    }

    fn draw(list: &DrawOpList, rect: Rect) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new(200.0, 200.0);
        list.draw(&mut canvas, &StaticStyle::default(), &DrawInfo::default(), rect);
        canvas
    }

    #[test]
    fn test_line_single_pixel_dot() {
        let list = DrawOpList::new(1);
        list.append(line(0, None, None));
        let canvas = draw(&list, Rect::new(10.0, 20.0, 50.0, 50.0));
        assert_eq!(
            canvas.drawn(),
            vec![&Call::FillRect(Rect::new(10.0, 20.0, 1.0, 1.0), Paint::Solid(Rgba::WHITE))]
        );
    }

    #[test]
    fn test_line_pixel_alignment() {
        let list = DrawOpList::new(2);
        list.append(line(1, Some("10"), None));
        list.append(line(0, Some("10"), Some("5")));
        let canvas = draw(&list, Rect::new(0.0, 0.0, 50.0, 50.0));

        let calls = canvas.drawn();
        let Call::Line(from, to, _, stroke) = calls[0] else {
            panic!("expected line");
        };
        assert_eq!((*from, *to), (Point::new(0.0, 0.5), Point::new(10.0, 0.5)));
        assert_eq!(stroke.width, 1.0);
        assert!(!stroke.square_cap);

        let Call::Line(from, to, _, stroke) = calls[1] else {
            panic!("expected line");
        };
        assert_eq!((*from, *to), (Point::new(0.5, 0.5), Point::new(10.5, 5.5)));
        assert!(stroke.square_cap);
    }

    #[test]
    fn test_line_dash_requires_both_lengths() {
        let list = DrawOpList::new(2);
        for (on, off) in [(2, 3), (2, 0)] {
            list.append(DrawOp::Line {
                color: ColorSpec::Basic(Rgba::WHITE),
                dash_on_length: on,
                dash_off_length: off,
                width: 2,
                x1: e("0"),
                y1: e("0"),
                x2: Some(e("10")),
                y2: None,
            });
        }
        let canvas = draw(&list, Rect::new(0.0, 0.0, 50.0, 50.0));
        let dashes: Vec<_> = canvas
            .drawn()
            .into_iter()
            .map(|c| match c {
                Call::Line(_, _, _, s) => s.dash,
                _ => panic!("expected line"),
            })
            .collect();
        assert_eq!(dashes, vec![Some((2.0, 3.0)), None]);
    }

    #[test]
    fn test_rectangle_stroke_offset_and_arc_angles() {
        let list = DrawOpList::new(2);
        list.append(DrawOp::Rectangle {
            color: ColorSpec::Basic(Rgba::BLACK),
            filled: false,
            rect: op_rect("1", "2", "3", "4"),
        });
        list.append(DrawOp::Arc {
            color: ColorSpec::Basic(Rgba::BLACK),
            filled: true,
            rect: op_rect("0", "0", "10", "20"),
            start_angle: 90.0,
            extent_angle: -180.0,
        });
        let canvas = draw(&list, Rect::new(0.0, 0.0, 50.0, 50.0));
        let calls = canvas.drawn();

        assert_eq!(
            calls[0],
            &Call::StrokeRect(Rect::new(1.5, 2.5, 3.0, 4.0), Rgba::BLACK, 1.0)
        );
        let Call::Arc(arc, _, filled) = calls[1] else {
            panic!("expected arc");
        };
        assert!(*filled);
        assert!(arc.negative);
        assert_eq!(arc.center, Point::new(5.5, 10.5));
        assert_eq!((arc.radius_x, arc.radius_y), (5.0, 10.0));
        assert!((arc.start - 0.0).abs() < 1e-12);
        assert!((arc.end + PI).abs() < 1e-12);
    }

    #[test]
    fn test_clip_skips_invisible_ops() {
        let list = DrawOpList::new(3);
        list.append(DrawOp::Clip {
            rect: op_rect("500", "0", "10", "10"),
        });
        list.append(fill("0", "0", "5", "5"));
        let canvas = draw(&list, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(canvas.drawn().is_empty());
    }

    #[test]
    fn test_clip_resets_to_list_bounds() {
        let list = DrawOpList::new(3);
        list.append(DrawOp::Clip {
            rect: op_rect("0", "0", "10", "10"),
        });
        list.append(DrawOp::Clip {
            rect: op_rect("20", "20", "10", "10"),
        });
        list.append(fill("0", "0", "5", "5"));

        let canvas = draw(&list, Rect::new(0.0, 0.0, 50.0, 50.0));
        // The second clip does not intersect the first one
        assert_eq!(canvas.drawn().len(), 1);
        assert_eq!(canvas.clip_extents(), Rect::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_nested_list_draws_in_evaluated_rect() {
        let child = DrawOpList::new(1);
        child.append(fill("0", "0", "width", "height"));

        let parent = DrawOpList::new(1);
        parent.append(DrawOp::OpList {
            op_list: child.clone(),
            rect: op_rect("2", "3", "width - 4", "8"),
        });

        let canvas = draw(&parent, Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(
            canvas.drawn(),
            vec![&Call::FillRect(Rect::new(12.0, 13.0, 16.0, 8.0), Paint::Solid(Rgba::BLACK))]
        );
    }

    #[test]
    fn test_tile_grid() {
        let child = DrawOpList::new(1);
        child.append(fill("0", "0", "width", "height"));

        let parent = DrawOpList::new(1);
        parent.append(DrawOp::Tile {
            op_list: child,
            rect: op_rect("0", "0", "10", "10"),
            tile_xoffset: e("0"),
            tile_yoffset: e("0"),
            tile_width: e("5"),
            tile_height: e("5"),
        });

        let canvas = draw(&parent, Rect::new(100.0, 0.0, 50.0, 50.0));
        let origins: Vec<(f64, f64)> = canvas
            .drawn()
            .into_iter()
            .map(|c| match c {
                Call::FillRect(r, _) => (r.x, r.y),
                _ => panic!("expected fill"),
            })
            .collect();
        assert_eq!(
            origins,
            vec![(100.0, 0.0), (100.0, 5.0), (105.0, 0.0), (105.0, 5.0)]
        );
    }

    #[test]
    fn test_tile_offset_relative_to_list_origin() {
        let child = DrawOpList::new(1);
        child.append(fill("0", "0", "width", "height"));

        let parent = DrawOpList::new(1);
        parent.append(DrawOp::Tile {
            op_list: child,
            rect: op_rect("0", "0", "6", "4"),
            tile_xoffset: e("2"),
            tile_yoffset: e("0"),
            tile_width: e("4"),
            tile_height: e("4"),
        });

        let canvas = draw(&parent, Rect::new(100.0, 0.0, 50.0, 50.0));
        let xs: Vec<f64> = canvas
            .drawn()
            .into_iter()
            .map(|c| match c {
                Call::FillRect(r, _) => r.x,
                _ => panic!("expected fill"),
            })
            .collect();
        assert_eq!(xs, vec![98.0, 102.0]);
    }

    #[test]
    fn test_tile_huge_offset_terminates() {
        let child = DrawOpList::new(1);
        child.append(fill("0", "0", "width", "height"));

        let parent = DrawOpList::new(1);
        parent.append(DrawOp::Tile {
            op_list: child,
            rect: op_rect("0", "0", "10", "10"),
            tile_xoffset: e("1000000.0 * 1000000.0 * 100000.0"),
            tile_yoffset: e("0"),
            tile_width: e("1"),
            tile_height: e("5"),
        });

        let canvas = draw(&parent, Rect::new(100.0, 0.0, 50.0, 50.0));
        // At most one column per visible pixel, two rows
        assert!(canvas.drawn().len() <= 22);
    }

    #[test]
    fn test_tile_starts_skip_hidden_tiles() {
        assert_eq!(tile_starts(0.0, 5.0, 12.0, 20.0), vec![10.0, 15.0]);
        assert_eq!(tile_starts(98.0, 4.0, 100.0, 106.0), vec![98.0, 102.0]);
        assert!(tile_starts(0.0, 5.0, 20.0, 20.0).is_empty());
        assert!(tile_starts(-1e17, 1.0, 0.0, 4.0).len() <= 5);
        assert!(tile_starts(1e17, 1.0, 0.0, 4.0).is_empty());
    }

    #[test]
    fn test_list_cannot_contain_itself() {
        let a = DrawOpList::new(1);
        let b = DrawOpList::new(1);
        b.append_checked(
            DrawOp::OpList {
                op_list: a.clone(),
                rect: op_rect("0", "0", "1", "1"),
            },
            "b",
        )
        .unwrap();
        assert!(b.contains(&a));
        assert!(!a.contains(&b));

        let err = a
            .append_checked(
                DrawOp::OpList {
                    op_list: b.clone(),
                    rect: op_rect("0", "0", "1", "1"),
                },
                "a",
            )
            .unwrap_err();
        assert!(matches!(err, ThemeError::ListContainsSelf(name) if name == "a"));

        let tile = DrawOp::Tile {
            op_list: b.clone(),
            rect: op_rect("0", "0", "1", "1"),
            tile_xoffset: e("0"),
            tile_yoffset: e("0"),
            tile_width: e("1"),
            tile_height: e("1"),
        };
        assert!(a.append_checked(tile, "a").is_err());

        let direct = DrawOp::OpList {
            op_list: a.clone(),
            rect: op_rect("0", "0", "1", "1"),
        };
        assert!(a.append_checked(direct, "a").is_err());
        assert!(a.is_empty());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_image_sees_object_size() {
        let mut image = RgbaImage::new(2, 3);
        image.put_pixel(0, 0, Pixel([10, 20, 30, 255]));

        let mut op = ImageOp::new(
            image,
            op_rect("1", "1", "object_width * 2", "object_height"),
        );
        op.alpha = Some(AlphaGradientSpec::parse("0.5").unwrap());

        let list = DrawOpList::new(2);
        list.append(DrawOp::Image(Box::new(op)));
        // Dimensions do not leak into later ops
        list.append(fill("0", "0", "object_width", "1"));

        let canvas = draw(&list, Rect::new(0.0, 0.0, 50.0, 50.0));
        let calls = canvas.drawn();
        assert_eq!(
            calls[0],
            &Call::Image {
                width: 4,
                height: 3,
                dest: Rect::new(1.0, 1.0, 4.0, 3.0),
                mask: Some(AlphaMask::Constant(128)),
            }
        );
        assert_eq!(
            calls[1],
            &Call::FillRect(Rect::new(0.0, 0.0, 1.0, 1.0), Paint::Solid(Rgba::BLACK))
        );
    }

    #[test]
    fn test_image_colorize_cache() {
        let mut op = ImageOp::new(RgbaImage::new(1, 1), op_rect("0", "0", "1", "1"));
        op.colorize = Some(ColorSpec::Basic(Rgba::rgb(1.0, 0.0, 0.0)));
        let style = StaticStyle::default();

        assert_eq!(op.colorize_cache_key(), None);
        op.with_source(&style, |_| ());
        assert_eq!(op.colorize_cache_key(), Some(0xff0000));

        op.colorize = Some(ColorSpec::Basic(Rgba::rgb(0.0, 0.0, 1.0)));
        op.with_source(&style, |_| ());
        assert_eq!(op.colorize_cache_key(), Some(0x0000ff));
    }

    #[test]
    fn test_icon_prefers_mini_icon_when_it_fits() {
        let mini = RgbaImage::new(16, 16);
        let icon = RgbaImage::new(48, 48);
        let info = DrawInfo {
            mini_icon: Some(&mini),
            icon: Some(&icon),
            ..DrawInfo::default()
        };

        let list = DrawOpList::new(2);
        list.append(DrawOp::Icon {
            alpha: None,
            rect: op_rect("0", "0", "mini_icon_width", "mini_icon_height"),
            fill_type: ImageFillType::Scale,
        });
        list.append(DrawOp::Icon {
            alpha: None,
            rect: op_rect("0", "0", "icon_width", "icon_height"),
            fill_type: ImageFillType::Scale,
        });

        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        list.draw(&mut canvas, &StaticStyle::default(), &info, Rect::new(0.0, 0.0, 64.0, 64.0));
        let sizes: Vec<(u32, u32)> = canvas
            .drawn()
            .into_iter()
            .map(|c| match c {
                Call::Image { width, height, .. } => (*width, *height),
                _ => panic!("expected image"),
            })
            .collect();
        assert_eq!(sizes, vec![(16, 16), (48, 48)]);
    }

    #[test]
    fn test_title_fade_and_ellipsize() {
        let layout = TitleLayout::new("A long window title", 120.0, 14.0);
        let info = DrawInfo {
            title_layout: Some(&layout),
            ..DrawInfo::default()
        };

        let list = DrawOpList::new(2);
        list.append(DrawOp::Title {
            color: ColorSpec::Basic(Rgba::BLACK),
            x: e("0"),
            y: e("0"),
            ellipsize_width: None,
        });
        list.append(DrawOp::Title {
            color: ColorSpec::Basic(Rgba::BLACK),
            x: e("0"),
            y: e("0"),
            ellipsize_width: Some(e("width")),
        });

        let mut canvas = RecordingCanvas::new(200.0, 200.0);
        list.draw(&mut canvas, &StaticStyle::default(), &info, Rect::new(0.0, 0.0, 100.0, 20.0));
        let calls = canvas.drawn();

        let Call::Title { paint: Paint::Linear(gradient), ellipsize: None, .. } = calls[0] else {
            panic!("expected faded title");
        };
        assert_eq!(gradient.end, Point::new(100.0, 14.0));
        assert!((gradient.stops[1].0 - 0.7).abs() < 1e-9);
        assert_eq!(gradient.stops[2].1.alpha, 0.0);

        let Call::Title { paint, ellipsize, .. } = calls[1] else {
            panic!("expected title");
        };
        assert_eq!(paint, &Paint::Solid(Rgba::BLACK));
        assert_eq!(*ellipsize, Some(100.0));
    }

    #[test]
    fn test_env_from_info() {
        let info = DrawInfo {
            width: 200.0,
            height: 100.0,
            left_width: 4.0,
            scale: 2,
            ..DrawInfo::default()
        };
        let env = info.env_for(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(env.frame_x_center, 90.0);
        assert_eq!(env.frame_y_center, 30.0);
        assert_eq!(env.left_width, 4.0);
        assert_eq!(env.object_width, None);
        assert_eq!(env.scale, 2);
    }
}
