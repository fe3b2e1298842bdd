//! Theme description loader
//!
//! Themes are TOML documents. The file is deserialized into plain description
//! structs first, then built section by section into a `Theme`: constants,
//! geometries, op lists, frame styles, style sets, and finally the window type
//! bindings. Every object is validated as soon as it is complete, so the first
//! error reported is the first problem in the file.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::RgbaImage;
use serde::Deserialize;
use tracing::{debug, info};

use crate::render::pixbuf::{self, ImageFillType};
use crate::theme::color::{ColorSpec, Rgba, WidgetState};
use crate::theme::draw_op::{ArrowType, DrawOp, DrawOpList, ImageOp, OpRect, ShadowType};
use crate::theme::error::{Result, ThemeError};
use crate::theme::expr::{ConstantLookup, Expression};
use crate::theme::flags::FrameType;
use crate::theme::frame_layout::{Border, ButtonSizing, FrameLayout, UNSET};
use crate::theme::frame_style::{
    ButtonFunction, ButtonState, FrameFocus, FramePiece, FrameResize, FrameState, FrameStyle,
    FrameStyleSet,
};
use crate::theme::gradient::{AlphaGradientSpec, GradientSpec, GradientType};
use crate::theme::{Theme, ThemeInfo};

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThemeFile {
    #[serde(default)]
    info: ThemeInfo,
    #[serde(default)]
    constants: ConstantsDesc,
    #[serde(default)]
    geometry: Vec<GeometryDesc>,
    #[serde(default)]
    draw_ops: Vec<DrawOpsDesc>,
    #[serde(default)]
    frame_style: Vec<FrameStyleDesc>,
    #[serde(default)]
    frame_style_set: Vec<StyleSetDesc>,
    /// Frame type name → style set name
    #[serde(default)]
    windows: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstantsDesc {
    #[serde(default)]
    int: BTreeMap<String, i32>,
    #[serde(default)]
    float: BTreeMap<String, f64>,
    #[serde(default)]
    color: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GeometryDesc {
    name: String,
    parent: Option<String>,

    left_width: Option<Distance>,
    right_width: Option<Distance>,
    bottom_height: Option<Distance>,
    title_vertical_pad: Option<Distance>,
    right_titlebar_edge: Option<Distance>,
    left_titlebar_edge: Option<Distance>,

    title_border: Option<Border>,
    button_border: Option<Border>,
    invisible_resize_border: Option<Border>,

    aspect_ratio: Option<f64>,
    button_width: Option<i32>,
    button_height: Option<i32>,

    rounded_top_left: Option<u32>,
    rounded_top_right: Option<u32>,
    rounded_bottom_left: Option<u32>,
    rounded_bottom_right: Option<u32>,

    title_scale: Option<f64>,
    has_title: Option<bool>,
    hide_buttons: Option<bool>,
}

/// Pixel count, given directly or as the name of an integer constant
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Distance {
    Value(i32),
    Constant(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DrawOpsDesc {
    name: String,
    #[serde(default)]
    ops: Vec<OpDesc>,
}

fn zero() -> String {
    "0".to_string()
}

fn full_width() -> String {
    "width".to_string()
}

fn full_height() -> String {
    "height".to_string()
}

fn yes() -> bool {
    true
}

/// One op, tagged by `type`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpDesc {
    Line {
        color: String,
        x1: String,
        y1: String,
        x2: Option<String>,
        y2: Option<String>,
        #[serde(default)]
        width: i32,
        #[serde(default)]
        dash_on_length: i32,
        #[serde(default)]
        dash_off_length: i32,
    },
    Rectangle {
        color: String,
        x: String,
        y: String,
        width: String,
        height: String,
        #[serde(default)]
        filled: bool,
    },
    Arc {
        color: String,
        x: String,
        y: String,
        width: String,
        height: String,
        #[serde(default)]
        filled: bool,
        start_angle: Option<f64>,
        extent_angle: Option<f64>,
        from: Option<f64>,
        to: Option<f64>,
    },
    Clip {
        x: String,
        y: String,
        width: String,
        height: String,
    },
    Tint {
        color: String,
        alpha: String,
        x: String,
        y: String,
        width: String,
        height: String,
    },
    Gradient {
        direction: String,
        colors: Vec<String>,
        alpha: Option<String>,
        x: String,
        y: String,
        width: String,
        height: String,
    },
    Image {
        filename: String,
        colorize: Option<String>,
        alpha: Option<String>,
        #[serde(default)]
        fill_type: ImageFillType,
        #[serde(default)]
        vertical_stripes: bool,
        #[serde(default)]
        horizontal_stripes: bool,
        x: String,
        y: String,
        width: String,
        height: String,
    },
    GtkArrow {
        state: String,
        shadow: String,
        arrow: String,
        #[serde(default = "yes")]
        filled: bool,
        x: String,
        y: String,
        width: String,
        height: String,
    },
    GtkBox {
        state: String,
        shadow: String,
        x: String,
        y: String,
        width: String,
        height: String,
    },
    GtkVline {
        state: String,
        x: String,
        y1: String,
        y2: String,
    },
    Icon {
        alpha: Option<String>,
        #[serde(default)]
        fill_type: ImageFillType,
        x: String,
        y: String,
        width: String,
        height: String,
    },
    Title {
        color: String,
        x: String,
        y: String,
        ellipsize_width: Option<String>,
    },
    Include {
        name: String,
        #[serde(default = "zero")]
        x: String,
        #[serde(default = "zero")]
        y: String,
        #[serde(default = "full_width")]
        width: String,
        #[serde(default = "full_height")]
        height: String,
    },
    Tile {
        name: String,
        #[serde(default = "zero")]
        x: String,
        #[serde(default = "zero")]
        y: String,
        #[serde(default = "full_width")]
        width: String,
        #[serde(default = "full_height")]
        height: String,
        #[serde(default = "zero")]
        tile_xoffset: String,
        #[serde(default = "zero")]
        tile_yoffset: String,
        tile_width: String,
        tile_height: String,
    },
}

/// A named op list or ops written in place
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpsRef {
    Named(String),
    Inline(Vec<OpDesc>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ButtonDesc {
    function: String,
    state: String,
    draw_ops: OpsRef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameStyleDesc {
    name: String,
    parent: Option<String>,
    geometry: Option<String>,
    background: Option<String>,
    alpha: Option<f64>,
    #[serde(default)]
    pieces: BTreeMap<String, OpsRef>,
    #[serde(default)]
    buttons: Vec<ButtonDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameDesc {
    state: String,
    resize: Option<String>,
    focus: String,
    style: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StyleSetDesc {
    name: String,
    parent: Option<String>,
    #[serde(default)]
    frames: Vec<FrameDesc>,
}

// ============================================================================
// Entry points
// ============================================================================

/// Load and validate the theme at `path`. Images are resolved relative to
/// the file's directory.
pub fn load(path: &Path, max_format_version: u32) -> Result<Theme> {
    let text = fs::read_to_string(path).map_err(|source| ThemeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    parse(&text, &id, base_dir, max_format_version)
}

/// Build a theme from TOML text
pub fn parse(text: &str, id: &str, base_dir: &Path, max_format_version: u32) -> Result<Theme> {
    let file: ThemeFile = toml::from_str(text)?;

    let version = file.info.format_version;
    if version == 0 || version > max_format_version {
        return Err(ThemeError::Format(format!(
            "Theme \"{}\" uses format version {} but only versions 1 to {} are supported",
            id, version, max_format_version
        )));
    }

    let mut builder = Builder {
        theme: Theme::new(id),
        base_dir,
        images: HashMap::new(),
    };
    builder.theme.info = file.info;

    for (name, value) in &file.constants.int {
        builder.theme.define_int(name, *value)?;
    }
    for (name, value) in &file.constants.float {
        builder.theme.define_float(name, *value)?;
    }
    for (name, value) in &file.constants.color {
        builder.theme.define_color(name, value)?;
    }

    for desc in &file.geometry {
        builder.add_geometry(desc)?;
    }
    for desc in &file.draw_ops {
        builder.add_draw_ops(desc)?;
    }
    for desc in &file.frame_style {
        builder.add_frame_style(desc)?;
    }
    for desc in &file.frame_style_set {
        builder.add_style_set(desc)?;
    }
    for (type_name, set_name) in &file.windows {
        let frame_type: FrameType = type_name.parse()?;
        builder.theme.assign_style_set(frame_type, set_name)?;
    }

    let theme = builder.theme;
    theme.validate()?;

    info!(
        "Loaded theme \"{}\" (format {})",
        theme.info.name.as_deref().unwrap_or(id),
        version
    );
    Ok(theme)
}

// ============================================================================
// Builder
// ============================================================================

struct Builder<'a> {
    theme: Theme,
    base_dir: &'a Path,
    /// Decoded images by path, shared by every op that names them
    images: HashMap<PathBuf, RgbaImage>,
}

fn unknown_state(state: &str, element: &str) -> ThemeError {
    ThemeError::Format(format!(
        "Did not understand state \"{}\" for <{}> element",
        state, element
    ))
}

impl Builder<'_> {
    fn expr(&self, source: &str) -> Result<Expression> {
        self.theme.expression(source)
    }

    fn opt_expr(&self, source: Option<&String>) -> Result<Option<Expression>> {
        source.map(|s| self.expr(s)).transpose()
    }

    fn rect(&self, x: &str, y: &str, width: &str, height: &str) -> Result<OpRect> {
        Ok(OpRect::new(
            self.expr(x)?,
            self.expr(y)?,
            self.expr(width)?,
            self.expr(height)?,
        ))
    }

    fn distance(&self, distance: &Distance) -> Result<i32> {
        match distance {
            Distance::Value(v) => Ok(*v),
            Distance::Constant(name) => {
                self.theme
                    .constants()
                    .lookup_int(name)
                    .ok_or_else(|| ThemeError::UnknownReference {
                        kind: "integer constant",
                        name: name.clone(),
                    })
            }
        }
    }

    fn color(&self, text: &str) -> Result<ColorSpec> {
        self.theme.color_spec(text)
    }

    fn image(&mut self, filename: &str) -> Result<RgbaImage> {
        let path = self.base_dir.join(filename);
        if let Some(image) = self.images.get(&path) {
            return Ok(image.clone());
        }

        let image = pixbuf::load(&path)?;
        debug!("Loaded theme image {}", path.display());
        self.images.insert(path, image.clone());
        Ok(image)
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    fn add_geometry(&mut self, desc: &GeometryDesc) -> Result<()> {
        // Inherit by copying the parent, then apply overrides
        let mut layout = match &desc.parent {
            Some(parent) => FrameLayout::clone(&*self.theme.layout(parent)?),
            None => FrameLayout::new(),
        };

        for (field, value) in [
            (&mut layout.left_width, &desc.left_width),
            (&mut layout.right_width, &desc.right_width),
            (&mut layout.bottom_height, &desc.bottom_height),
            (&mut layout.title_vertical_pad, &desc.title_vertical_pad),
            (&mut layout.right_titlebar_edge, &desc.right_titlebar_edge),
            (&mut layout.left_titlebar_edge, &desc.left_titlebar_edge),
        ] {
            if let Some(distance) = value {
                *field = self.distance(distance)?;
            }
        }

        if let Some(border) = desc.title_border {
            layout.title_border = border;
        }
        if let Some(border) = desc.button_border {
            layout.button_border = border;
        }
        if let Some(border) = desc.invisible_resize_border {
            layout.invisible_resize_border = border;
        }

        layout.button_sizing = match (desc.aspect_ratio, desc.button_width, desc.button_height) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(ThemeError::FrameGeometry(
                    "Can't specify both button_width/button_height and aspect ratio for buttons"
                        .into(),
                ));
            }
            (Some(aspect), None, None) => ButtonSizing::Aspect(aspect),
            (None, None, None) => layout.button_sizing,
            (None, width, height) => {
                let (parent_width, parent_height) = match layout.button_sizing {
                    ButtonSizing::Fixed { width, height } => (width, height),
                    _ => (UNSET, UNSET),
                };
                ButtonSizing::Fixed {
                    width: width.unwrap_or(parent_width),
                    height: height.unwrap_or(parent_height),
                }
            }
        };

        let corners = &mut layout.corners;
        for (field, value) in [
            (&mut corners.top_left, desc.rounded_top_left),
            (&mut corners.top_right, desc.rounded_top_right),
            (&mut corners.bottom_left, desc.rounded_bottom_left),
            (&mut corners.bottom_right, desc.rounded_bottom_right),
        ] {
            if let Some(v) = value {
                *field = v;
            }
        }

        if let Some(scale) = desc.title_scale {
            layout.title_scale = scale;
        }
        if let Some(has_title) = desc.has_title {
            layout.has_title = has_title;
        }
        if let Some(hide) = desc.hide_buttons {
            layout.hide_buttons = hide;
        }

        layout.validate()?;
        self.theme.insert_layout(&desc.name, Rc::new(layout))
    }

    // ------------------------------------------------------------------------
    // Op lists
    // ------------------------------------------------------------------------

    fn add_draw_ops(&mut self, desc: &DrawOpsDesc) -> Result<()> {
        let list = self.build_list(&desc.ops, &desc.name)?;
        list.validate()?;
        self.theme.insert_draw_op_list(&desc.name, list)
    }

    fn ops_ref(&mut self, ops: &OpsRef, name: &str) -> Result<Rc<DrawOpList>> {
        match ops {
            OpsRef::Named(list) => self.theme.draw_op_list(list),
            OpsRef::Inline(descs) => self.build_list(descs, name),
        }
    }

    fn build_list(&mut self, descs: &[OpDesc], name: &str) -> Result<Rc<DrawOpList>> {
        let list = DrawOpList::new(descs.len());
        for desc in descs {
            let op = self.build_op(desc)?;
            list.append_checked(op, name)?;
        }
        Ok(list)
    }

    fn build_op(&mut self, desc: &OpDesc) -> Result<DrawOp> {
        let op = match desc {
            OpDesc::Line {
                color,
                x1,
                y1,
                x2,
                y2,
                width,
                dash_on_length,
                dash_off_length,
            } => DrawOp::Line {
                color: self.color(color)?,
                dash_on_length: *dash_on_length,
                dash_off_length: *dash_off_length,
                width: *width,
                x1: self.expr(x1)?,
                y1: self.expr(y1)?,
                x2: self.opt_expr(x2.as_ref())?,
                y2: self.opt_expr(y2.as_ref())?,
            },

            OpDesc::Rectangle {
                color,
                x,
                y,
                width,
                height,
                filled,
            } => DrawOp::Rectangle {
                color: self.color(color)?,
                filled: *filled,
                rect: self.rect(x, y, width, height)?,
            },

            OpDesc::Arc {
                color,
                x,
                y,
                width,
                height,
                filled,
                start_angle,
                extent_angle,
                from,
                to,
            } => {
                let start_angle = start_angle.or(*from).ok_or_else(|| {
                    ThemeError::Format("No \"start_angle\" or \"from\" attribute on element <arc>".into())
                })?;
                let extent_angle = extent_angle
                    .or_else(|| to.map(|to| to - start_angle))
                    .ok_or_else(|| {
                        ThemeError::Format(
                            "No \"extent_angle\" or \"to\" attribute on element <arc>".into(),
                        )
                    })?;
                if !(0.0..=360.0).contains(&start_angle) {
                    return Err(ThemeError::Format(format!(
                        "Angle must be between 0.0 and 360.0, was {}",
                        start_angle
                    )));
                }

                DrawOp::Arc {
                    color: self.color(color)?,
                    filled: *filled,
                    rect: self.rect(x, y, width, height)?,
                    start_angle,
                    extent_angle,
                }
            }

            OpDesc::Clip {
                x,
                y,
                width,
                height,
            } => DrawOp::Clip {
                rect: self.rect(x, y, width, height)?,
            },

            OpDesc::Tint {
                color,
                alpha,
                x,
                y,
                width,
                height,
            } => DrawOp::Tint {
                color: self.color(color)?,
                alpha: Some(AlphaGradientSpec::parse(alpha)?),
                rect: self.rect(x, y, width, height)?,
            },

            OpDesc::Gradient {
                direction,
                colors,
                alpha,
                x,
                y,
                width,
                height,
            } => {
                let mut gradient = GradientSpec::new(direction.parse::<GradientType>()?);
                for color in colors {
                    gradient.add_color_spec(self.color(color)?);
                }
                gradient.validate()?;

                let alpha = alpha.as_deref().map(AlphaGradientSpec::parse).transpose()?;
                if let Some(alpha) = &alpha {
                    if alpha.n_alphas() != 1 && alpha.n_alphas() != colors.len() {
                        return Err(ThemeError::Gradient(format!(
                            "Gradient has {} colors but {} alpha values; give one alpha or one per color",
                            colors.len(),
                            alpha.n_alphas()
                        )));
                    }
                }

                DrawOp::Gradient {
                    gradient,
                    alpha,
                    rect: self.rect(x, y, width, height)?,
                }
            }

            OpDesc::Image {
                filename,
                colorize,
                alpha,
                fill_type,
                vertical_stripes,
                horizontal_stripes,
                x,
                y,
                width,
                height,
            } => {
                let image = self.image(filename)?;
                let mut op = ImageOp::new(image, self.rect(x, y, width, height)?);
                op.colorize = colorize.as_deref().map(|c| self.color(c)).transpose()?;
                op.alpha = alpha.as_deref().map(AlphaGradientSpec::parse).transpose()?;
                op.fill_type = *fill_type;
                op.vertical_stripes = *vertical_stripes;
                op.horizontal_stripes = *horizontal_stripes;
                DrawOp::Image(Box::new(op))
            }

            OpDesc::GtkArrow {
                state,
                shadow,
                arrow,
                filled,
                x,
                y,
                width,
                height,
            } => DrawOp::GtkArrow {
                state: state
                    .parse::<WidgetState>()
                    .map_err(|_| unknown_state(state, "gtk_arrow"))?,
                shadow: shadow.parse::<ShadowType>()?,
                arrow: arrow.parse::<ArrowType>()?,
                filled: *filled,
                rect: self.rect(x, y, width, height)?,
            },

            OpDesc::GtkBox {
                state,
                shadow,
                x,
                y,
                width,
                height,
            } => DrawOp::GtkBox {
                state: state
                    .parse::<WidgetState>()
                    .map_err(|_| unknown_state(state, "gtk_box"))?,
                shadow: shadow.parse::<ShadowType>()?,
                rect: self.rect(x, y, width, height)?,
            },

            OpDesc::GtkVline { state, x, y1, y2 } => DrawOp::GtkVline {
                state: state
                    .parse::<WidgetState>()
                    .map_err(|_| unknown_state(state, "gtk_vline"))?,
                x: self.expr(x)?,
                y1: self.expr(y1)?,
                y2: self.expr(y2)?,
            },

            OpDesc::Icon {
                alpha,
                fill_type,
                x,
                y,
                width,
                height,
            } => DrawOp::Icon {
                alpha: alpha.as_deref().map(AlphaGradientSpec::parse).transpose()?,
                rect: self.rect(x, y, width, height)?,
                fill_type: *fill_type,
            },

            OpDesc::Title {
                color,
                x,
                y,
                ellipsize_width,
            } => DrawOp::Title {
                color: self.color(color)?,
                x: self.expr(x)?,
                y: self.expr(y)?,
                ellipsize_width: self.opt_expr(ellipsize_width.as_ref())?,
            },

            OpDesc::Include {
                name,
                x,
                y,
                width,
                height,
            } => DrawOp::OpList {
                op_list: self.theme.draw_op_list(name)?,
                rect: self.rect(x, y, width, height)?,
            },

            OpDesc::Tile {
                name,
                x,
                y,
                width,
                height,
                tile_xoffset,
                tile_yoffset,
                tile_width,
                tile_height,
            } => DrawOp::Tile {
                op_list: self.theme.draw_op_list(name)?,
                rect: self.rect(x, y, width, height)?,
                tile_xoffset: self.expr(tile_xoffset)?,
                tile_yoffset: self.expr(tile_yoffset)?,
                tile_width: self.expr(tile_width)?,
                tile_height: self.expr(tile_height)?,
            },
        };
        Ok(op)
    }

    // ------------------------------------------------------------------------
    // Styles
    // ------------------------------------------------------------------------

    fn add_frame_style(&mut self, desc: &FrameStyleDesc) -> Result<()> {
        let parent = desc
            .parent
            .as_deref()
            .map(|name| self.theme.style(name))
            .transpose()?;

        let layout = match (&desc.geometry, &parent) {
            (Some(name), _) => self.theme.layout(name)?,
            (None, Some(parent)) => parent.layout.clone(),
            (None, None) => {
                return Err(ThemeError::Missing(format!(
                    "No \"geometry\" attribute on <frame_style> \"{}\" and no parent to inherit it from",
                    desc.name
                )));
            }
        };

        let mut style = FrameStyle::new(parent, layout);

        if let Some(color) = &desc.background {
            style.window_background_color = Some(self.color(color)?);
        }
        if let Some(alpha) = desc.alpha {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(ThemeError::Format(format!(
                    "Alpha must be between 0.0 (invisible) and 1.0 (fully opaque), was {}",
                    alpha
                )));
            }
            style.window_background_alpha = Rgba::alpha_byte(alpha);
        }

        for (piece_name, ops) in &desc.pieces {
            let piece: FramePiece = piece_name.parse()?;
            let list = self.ops_ref(ops, &format!("{}/{}", desc.name, piece_name))?;
            style.set_piece(piece, list)?;
        }

        for button in &desc.buttons {
            let function: ButtonFunction = button.function.parse()?;
            let state: ButtonState = button.state.parse()?;
            let list = self.ops_ref(&button.draw_ops, &format!("{}/{}", desc.name, function))?;
            style.set_button(function, state, list)?;
        }

        style.validate(self.theme.format_version())?;
        self.theme.insert_style(&desc.name, Rc::new(style))
    }

    fn add_style_set(&mut self, desc: &StyleSetDesc) -> Result<()> {
        let parent = desc
            .parent
            .as_deref()
            .map(|name| self.theme.style_set(name))
            .transpose()?;
        let mut set = FrameStyleSet::new(parent);

        for frame in &desc.frames {
            let state: FrameState = frame.state.parse()?;
            let resize = frame
                .resize
                .as_deref()
                .map(str::parse::<FrameResize>)
                .transpose()?;
            let focus: FrameFocus = frame.focus.parse()?;
            let style = self.theme.style(&frame.style)?;
            set.set_style(state, resize, focus, style)?;
        }

        set.validate()?;
        self.theme.insert_style_set(&desc.name, Rc::new(set))
    }
}
