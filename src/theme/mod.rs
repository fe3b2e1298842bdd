//! Decoration Theme
//!
//! The `Theme` owns everything a loaded theme defines: metadata, user
//! constants, the named layouts, op lists, styles and style sets, and the
//! style set chosen for each frame type. It answers the two questions a host
//! asks per window: which style applies, and how the frame is painted.

pub mod button_layout;
pub mod color;
pub mod draw_op;
pub mod error;
pub mod expr;
pub mod flags;
pub mod frame_layout;
pub mod frame_style;
pub mod gradient;
pub mod loader;

use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::canvas::{Canvas, TitleLayout};
use crate::shared::Point;

pub use button_layout::ButtonLayout;
pub use color::{ColorSpec, Rgba, StaticStyle, StyleProvider};
pub use draw_op::{DrawInfo, DrawOp, DrawOpList};
pub use error::{ExprError, Result, ThemeError};
pub use expr::{ConstantLookup, ExprEnv, Expression};
pub use flags::{FrameFlags, FrameType};
pub use frame_layout::{FrameGeometry, FrameLayout};
pub use frame_style::{ButtonFunction, ButtonState, FrameStyle, FrameStyleSet};

/// Newest theme format this engine understands
pub const THEME_FORMAT_VERSION: u32 = 3;

// ============================================================================
// Metadata
// ============================================================================

fn default_format_version() -> u32 {
    1
}

/// Descriptive fields every theme must carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeInfo {
    pub name: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

impl Default for ThemeInfo {
    fn default() -> Self {
        Self {
            name: None,
            author: None,
            date: None,
            description: None,
            copyright: None,
            format_version: default_format_version(),
        }
    }
}

impl ThemeInfo {
    /// Metadata fields in the order they are checked
    fn fields(&self) -> [(&'static str, &Option<String>); 5] {
        [
            ("name", &self.name),
            ("author", &self.author),
            ("date", &self.date),
            ("description", &self.description),
            ("copyright", &self.copyright),
        ]
    }
}

// ============================================================================
// Constants
// ============================================================================

/// User-defined named constants
///
/// Integer and float constants are folded into expressions when they are
/// compiled. Color constants are substituted for color strings that equal
/// their name.
#[derive(Debug, Clone, Default)]
pub struct Constants {
    ints: HashMap<String, i32>,
    floats: HashMap<String, f64>,
    colors: HashMap<String, String>,
}

impl Constants {
    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ints.len() + self.floats.len() + self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConstantLookup for Constants {
    fn lookup_int(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    fn lookup_float(&self, name: &str) -> Option<f64> {
        self.floats.get(name).copied()
    }
}

fn check_constant_name(name: &str) -> Result<()> {
    if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ThemeError::Constant(format!(
            "User-defined constants must begin with a capital letter; '{}' does not",
            name
        )))
    }
}

fn insert_constant<V>(table: &mut HashMap<String, V>, name: &str, value: V) -> Result<()> {
    check_constant_name(name)?;
    if table.contains_key(name) {
        return Err(ThemeError::Constant(format!(
            "Constant '{}' has already been defined",
            name
        )));
    }
    table.insert(name.to_string(), value);
    Ok(())
}

// ============================================================================
// Registries
// ============================================================================

fn register<T>(
    map: &mut HashMap<String, Rc<T>>,
    element: &str,
    name: &str,
    value: Rc<T>,
) -> Result<()> {
    if map.contains_key(name) {
        return Err(ThemeError::Format(format!(
            "<{}> name \"{}\" used a second time",
            element, name
        )));
    }
    debug!("Registered <{}> '{}'", element, name);
    map.insert(name.to_string(), value);
    Ok(())
}

fn lookup<T>(map: &HashMap<String, Rc<T>>, kind: &'static str, name: &str) -> Result<Rc<T>> {
    map.get(name)
        .cloned()
        .ok_or_else(|| ThemeError::UnknownReference {
            kind,
            name: name.to_string(),
        })
}

// ============================================================================
// Per-window render inputs
// ============================================================================

/// Content and button states of one window, supplied per paint
#[derive(Debug, Clone)]
pub struct FrameInfo<'a> {
    pub title: Option<&'a TitleLayout>,
    pub mini_icon: Option<&'a RgbaImage>,
    pub icon: Option<&'a RgbaImage>,
    /// Buttons not listed are drawn in the normal state
    pub button_states: HashMap<ButtonFunction, ButtonState>,
    pub scale: i32,
    pub title_fade_margin: f64,
}

impl Default for FrameInfo<'_> {
    fn default() -> Self {
        Self {
            title: None,
            mini_icon: None,
            icon: None,
            button_states: HashMap::new(),
            scale: 1,
            title_fade_margin: 30.0,
        }
    }
}

impl FrameInfo<'_> {
    /// Height of the title text in whole pixels
    pub fn text_height(&self) -> i32 {
        self.title.map_or(0, |t| t.logical.height.ceil() as i32)
    }
}

/// Counts reported by the validator
#[derive(Debug, Clone, Serialize)]
pub struct ThemeSummary {
    pub id: String,
    pub name: Option<String>,
    pub format_version: u32,
    pub constants: usize,
    pub geometries: usize,
    pub draw_ops: usize,
    pub frame_styles: usize,
    pub frame_style_sets: usize,
    pub window_types: Vec<FrameType>,
}

// ============================================================================
// Theme
// ============================================================================

#[derive(Debug)]
pub struct Theme {
    /// Identifier used in messages, usually the file stem
    pub id: String,
    pub info: ThemeInfo,
    /// Titlebar button arrangement used when computing geometry
    pub button_layout: ButtonLayout,
    constants: Constants,
    layouts: HashMap<String, Rc<FrameLayout>>,
    draw_op_lists: HashMap<String, Rc<DrawOpList>>,
    styles: HashMap<String, Rc<FrameStyle>>,
    style_sets: HashMap<String, Rc<FrameStyleSet>>,
    style_sets_by_type: HashMap<FrameType, Rc<FrameStyleSet>>,
}

impl Theme {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            info: ThemeInfo::default(),
            button_layout: ButtonLayout::default(),
            constants: Constants::default(),
            layouts: HashMap::new(),
            draw_op_lists: HashMap::new(),
            styles: HashMap::new(),
            style_sets: HashMap::new(),
            style_sets_by_type: HashMap::new(),
        }
    }

    pub fn format_version(&self) -> u32 {
        self.info.format_version
    }

    // ------------------------------------------------------------------------
    // Constants
    // ------------------------------------------------------------------------

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn define_int(&mut self, name: &str, value: i32) -> Result<()> {
        insert_constant(&mut self.constants.ints, name, value)
    }

    pub fn define_float(&mut self, name: &str, value: f64) -> Result<()> {
        insert_constant(&mut self.constants.floats, name, value)
    }

    /// The value must itself be a valid color
    pub fn define_color(&mut self, name: &str, value: &str) -> Result<()> {
        ColorSpec::parse(value)?;
        insert_constant(&mut self.constants.colors, name, value.to_string())
    }

    /// Compile an expression with this theme's constants folded in
    pub fn expression(&self, source: &str) -> Result<Expression> {
        Expression::new(source, &self.constants).map_err(|source_err| ThemeError::Expression {
            expr: source.to_string(),
            source: source_err,
        })
    }

    /// Parse a color, substituting a color constant of the same name
    pub fn color_spec(&self, text: &str) -> Result<ColorSpec> {
        ColorSpec::parse(self.constants.color(text).unwrap_or(text))
    }

    // ------------------------------------------------------------------------
    // Named objects
    // ------------------------------------------------------------------------

    pub fn insert_layout(&mut self, name: &str, layout: Rc<FrameLayout>) -> Result<()> {
        register(&mut self.layouts, "frame_geometry", name, layout)
    }

    pub fn layout(&self, name: &str) -> Result<Rc<FrameLayout>> {
        lookup(&self.layouts, "frame geometry", name)
    }

    pub fn insert_draw_op_list(&mut self, name: &str, list: Rc<DrawOpList>) -> Result<()> {
        register(&mut self.draw_op_lists, "draw_ops", name, list)
    }

    pub fn draw_op_list(&self, name: &str) -> Result<Rc<DrawOpList>> {
        lookup(&self.draw_op_lists, "draw op list", name)
    }

    pub fn insert_style(&mut self, name: &str, style: Rc<FrameStyle>) -> Result<()> {
        register(&mut self.styles, "frame_style", name, style)
    }

    pub fn style(&self, name: &str) -> Result<Rc<FrameStyle>> {
        lookup(&self.styles, "frame style", name)
    }

    pub fn insert_style_set(&mut self, name: &str, set: Rc<FrameStyleSet>) -> Result<()> {
        register(&mut self.style_sets, "frame_style_set", name, set)
    }

    pub fn style_set(&self, name: &str) -> Result<Rc<FrameStyleSet>> {
        lookup(&self.style_sets, "frame style set", name)
    }

    /// Bind a frame type to a named style set; each type is bound once
    pub fn assign_style_set(&mut self, frame_type: FrameType, set_name: &str) -> Result<()> {
        if self.style_sets_by_type.contains_key(&frame_type) {
            return Err(ThemeError::Format(format!(
                "Window type \"{}\" has already been assigned a style set",
                frame_type
            )));
        }
        let set = self.style_set(set_name)?;
        self.style_sets_by_type.insert(frame_type, set);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Style set for a frame type. Attached windows without their own set
    /// look like borders, and everything else falls back to normal windows.
    pub fn style_set_for(&self, frame_type: FrameType) -> Option<Rc<FrameStyleSet>> {
        let by_type = |t: FrameType| self.style_sets_by_type.get(&t).cloned();

        by_type(frame_type)
            .or_else(|| {
                (frame_type == FrameType::Attached)
                    .then(|| by_type(FrameType::Border))
                    .flatten()
            })
            .or_else(|| by_type(FrameType::Normal))
    }

    pub fn resolve_frame_style(
        &self,
        frame_type: FrameType,
        flags: FrameFlags,
    ) -> Option<Rc<FrameStyle>> {
        let set = self.style_set_for(frame_type)?;
        set.get_style(flags.frame_state(), flags.frame_resize(), flags.frame_focus())
    }

    /// Buttons the theme format can draw, in the configured arrangement
    fn effective_button_layout(&self) -> ButtonLayout {
        if self.format_version() < 2 {
            self.button_layout.without(ButtonFunction::is_toggle)
        } else {
            self.button_layout.clone()
        }
    }

    pub fn calc_geometry(
        &self,
        frame_type: FrameType,
        flags: FrameFlags,
        text_height: i32,
        client_width: i32,
        client_height: i32,
    ) -> Option<FrameGeometry> {
        let style = self.resolve_frame_style(frame_type, flags)?;
        Some(style.layout.calc_geometry(
            text_height,
            flags,
            client_width,
            client_height,
            &self.effective_button_layout(),
        ))
    }

    /// Paint a whole frame with its top-left corner at the canvas origin.
    /// Returns the geometry used, or `None` if no style applies.
    pub fn draw_frame(
        &self,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        frame_type: FrameType,
        flags: FrameFlags,
        client_width: i32,
        client_height: i32,
        frame: &FrameInfo<'_>,
    ) -> Option<FrameGeometry> {
        let Some(style) = self.resolve_frame_style(frame_type, flags) else {
            debug!("No frame style for {} window with flags {:?}", frame_type, flags);
            return None;
        };

        let geometry = style.layout.calc_geometry(
            frame.text_height(),
            flags,
            client_width,
            client_height,
            &self.effective_button_layout(),
        );

        let info = DrawInfo {
            scale: frame.scale,
            mini_icon: frame.mini_icon,
            icon: frame.icon,
            title_layout: frame.title,
            title_fade_margin: frame.title_fade_margin,
            ..DrawInfo::default()
        };

        style.draw_window_background(canvas, provider, geometry.client_rect().to_rect());
        style.draw(
            canvas,
            provider,
            &info,
            &geometry,
            &frame.button_states,
            Point::new(0.0, 0.0),
        );

        Some(geometry)
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Require every metadata field and a style set for normal windows
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.info.fields() {
            if value.is_none() {
                return Err(ThemeError::Missing(format!(
                    "No <{}> set for theme \"{}\"",
                    field, self.id
                )));
            }
        }

        if !self.style_sets_by_type.contains_key(&FrameType::Normal) {
            let normal = FrameType::Normal.as_str();
            return Err(ThemeError::Missing(format!(
                "No frame style set for window type \"{}\" in theme \"{}\", add a <window type=\"{}\" style_set=\"whatever\"/> element",
                normal, self.id, normal
            )));
        }

        Ok(())
    }

    pub fn summary(&self) -> ThemeSummary {
        let window_types = FrameType::ALL
            .into_iter()
            .filter(|t| self.style_sets_by_type.contains_key(t))
            .collect();

        ThemeSummary {
            id: self.id.clone(),
            name: self.info.name.clone(),
            format_version: self.info.format_version,
            constants: self.constants.len(),
            geometries: self.layouts.len(),
            draw_ops: self.draw_op_lists.len(),
            frame_styles: self.styles.len(),
            frame_style_sets: self.style_sets.len(),
            window_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::testing::{Call, RecordingCanvas};
    use crate::render::canvas::Paint;
    use crate::shared::Rect;
    use crate::theme::frame_layout::{Border, ButtonSizing};
    use crate::theme::frame_style::{FrameFocus, FrameResize, FrameState};

    fn layout() -> FrameLayout {
        FrameLayout {
            left_width: 3,
            right_width: 3,
            bottom_height: 4,
            title_border: Border::new(2, 2, 1, 1),
            title_vertical_pad: 2,
            right_titlebar_edge: 3,
            left_titlebar_edge: 3,
            button_sizing: ButtonSizing::Fixed {
                width: 16,
                height: 16,
            },
            button_border: Border::new(1, 1, 1, 1),
            ..FrameLayout::new()
        }
    }

    fn style_set_with(style: Rc<FrameStyle>) -> FrameStyleSet {
        let mut set = FrameStyleSet::new(None);
        for focus in FrameFocus::ALL {
            set.set_style(FrameState::Normal, Some(FrameResize::Both), focus, style.clone())
                .unwrap();
        }
        set
    }

    fn theme_with_normal_set() -> (Theme, Rc<FrameStyle>) {
        let style = Rc::new(FrameStyle::new(None, Rc::new(layout())));
        let mut theme = Theme::new("test");
        theme
            .insert_style_set("normal", Rc::new(style_set_with(style.clone())))
            .unwrap();
        theme.assign_style_set(FrameType::Normal, "normal").unwrap();
        (theme, style)
    }

    #[test]
    fn test_constant_names_must_be_capitalized() {
        let mut theme = Theme::new("test");
        let err = theme.define_int("foo", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User-defined constants must begin with a capital letter; 'foo' does not"
        );
        assert!(theme.define_float("", 1.0).is_err());
    }

    #[test]
    fn test_constant_duplicates_per_table() {
        let mut theme = Theme::new("test");
        theme.define_int("Foo", 1).unwrap();
        let err = theme.define_int("Foo", 2).unwrap_err();
        assert_eq!(err.to_string(), "Constant 'Foo' has already been defined");

        // Separate tables
        theme.define_float("Foo", 2.5).unwrap();
        assert_eq!(theme.constants().len(), 2);
    }

    #[test]
    fn test_constants_fold_into_expressions() {
        let mut theme = Theme::new("test");
        theme.define_int("Pad", 4).unwrap();
        theme.define_float("Half", 0.5).unwrap();

        let expr = theme.expression("Pad * 2 + Half").unwrap();
        assert!(expr.is_constant());
        assert_eq!(expr.evaluate(&ExprEnv::default()).unwrap(), 8.5);

        let err = theme.expression("Pad / 0").unwrap_err();
        assert!(matches!(
            err,
            ThemeError::Expression { source: ExprError::DivideByZero, .. }
        ));
    }

    #[test]
    fn test_color_constants_substitute() {
        let mut theme = Theme::new("test");
        assert!(theme.define_color("Bad", "gtk:fg").is_err());
        theme.define_color("Accent", "#ff0000").unwrap();

        let provider = StaticStyle::default();
        let spec = theme.color_spec("Accent").unwrap();
        assert_eq!(spec.render(&provider), Rgba::rgb(1.0, 0.0, 0.0));
        assert!(theme.color_spec("accent").is_err());
    }

    #[test]
    fn test_registry_names_are_unique() {
        let mut theme = Theme::new("test");
        theme.insert_layout("g", Rc::new(layout())).unwrap();
        let err = theme.insert_layout("g", Rc::new(layout())).unwrap_err();
        assert_eq!(err.to_string(), "<frame_geometry> name \"g\" used a second time");

        let err = theme.draw_op_list("missing").unwrap_err();
        assert_eq!(err.to_string(), "No draw op list named 'missing' has been defined");
        assert!(theme.assign_style_set(FrameType::Dialog, "nope").is_err());
    }

    #[test]
    fn test_window_type_assigned_once() {
        let (mut theme, _) = theme_with_normal_set();
        let err = theme.assign_style_set(FrameType::Normal, "normal").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Window type \"normal\" has already been assigned a style set"
        );
    }

    #[test]
    fn test_attached_falls_back_to_border_then_normal() {
        let (mut theme, normal) = theme_with_normal_set();
        let flags = FrameFlags::default() | FrameFlags::HAS_FOCUS;

        let found = theme.resolve_frame_style(FrameType::Attached, flags).unwrap();
        assert!(Rc::ptr_eq(&found, &normal));

        let border = Rc::new(FrameStyle::new(None, Rc::new(layout())));
        theme
            .insert_style_set("border", Rc::new(style_set_with(border.clone())))
            .unwrap();
        theme.assign_style_set(FrameType::Border, "border").unwrap();

        let found = theme.resolve_frame_style(FrameType::Attached, flags).unwrap();
        assert!(Rc::ptr_eq(&found, &border));

        // Only attached windows borrow the border set
        let found = theme.resolve_frame_style(FrameType::Dialog, flags).unwrap();
        assert!(Rc::ptr_eq(&found, &normal));
    }

    #[test]
    fn test_flashing_selects_other_focus_style() {
        let focused = Rc::new(FrameStyle::new(None, Rc::new(layout())));
        let unfocused = Rc::new(FrameStyle::new(None, Rc::new(layout())));
        let mut set = FrameStyleSet::new(None);
        set.set_style(FrameState::Normal, Some(FrameResize::Both), FrameFocus::Yes, focused.clone())
            .unwrap();
        set.set_style(FrameState::Normal, Some(FrameResize::Both), FrameFocus::No, unfocused.clone())
            .unwrap();

        let mut theme = Theme::new("test");
        theme.insert_style_set("s", Rc::new(set)).unwrap();
        theme.assign_style_set(FrameType::Normal, "s").unwrap();

        let flashing = FrameFlags::default() | FrameFlags::IS_FLASHING;
        let found = theme.resolve_frame_style(FrameType::Normal, flashing).unwrap();
        assert!(Rc::ptr_eq(&found, &focused));

        let found = theme
            .resolve_frame_style(FrameType::Normal, flashing | FrameFlags::HAS_FOCUS)
            .unwrap();
        assert!(Rc::ptr_eq(&found, &unfocused));
    }

    #[test]
    fn test_old_formats_hide_toggle_buttons() {
        let (mut theme, _) = theme_with_normal_set();
        theme.button_layout = ButtonLayout::parse("menu:shade,close");

        let geometry = theme
            .calc_geometry(FrameType::Normal, FrameFlags::default(), 12, 200, 100)
            .unwrap();
        let functions: Vec<ButtonFunction> = geometry.buttons.iter().map(|b| b.function).collect();
        assert_eq!(functions, vec![ButtonFunction::Close, ButtonFunction::Menu]);

        theme.info.format_version = 2;
        let geometry = theme
            .calc_geometry(FrameType::Normal, FrameFlags::default(), 12, 200, 100)
            .unwrap();
        assert!(geometry.button(ButtonFunction::Shade).is_some());
        assert!(geometry.button(ButtonFunction::Unshade).is_none());
    }

    #[test]
    fn test_validate_metadata_then_style_sets() {
        let mut theme = Theme::new("Crux");
        theme.info.name = Some("Crux".into());
        let err = theme.validate().unwrap_err();
        assert_eq!(err.to_string(), "No <author> set for theme \"Crux\"");

        theme.info.author = Some("a".into());
        theme.info.date = Some("d".into());
        theme.info.description = Some("d".into());
        theme.info.copyright = Some("c".into());
        let err = theme.validate().unwrap_err();
        assert!(err.to_string().starts_with("No frame style set for window type \"normal\""));

        let (mut complete, _) = theme_with_normal_set();
        complete.info = theme.info.clone();
        assert!(complete.validate().is_ok());
    }

    #[test]
    fn test_draw_frame_paints_background_first() {
        let mut style = FrameStyle::new(None, Rc::new(layout()));
        style.window_background_color = Some(ColorSpec::Basic(Rgba::WHITE));
        let titlebar = DrawOpList::new(1);
        titlebar.append(DrawOp::Rectangle {
            color: ColorSpec::Basic(Rgba::BLACK),
            filled: true,
            rect: draw_op::OpRect::new(
                Expression::parse("0").unwrap(),
                Expression::parse("0").unwrap(),
                Expression::parse("width").unwrap(),
                Expression::parse("height").unwrap(),
            ),
        });
        style
            .set_piece(frame_style::FramePiece::Titlebar, titlebar)
            .unwrap();

        let mut theme = Theme::new("test");
        theme
            .insert_style_set("s", Rc::new(style_set_with(Rc::new(style))))
            .unwrap();
        theme.assign_style_set(FrameType::Normal, "s").unwrap();

        let title = TitleLayout::new("Terminal", 60.0, 12.0);
        let frame = FrameInfo {
            title: Some(&title),
            ..FrameInfo::default()
        };

        let mut canvas = RecordingCanvas::new(400.0, 400.0);
        let geometry = theme
            .draw_frame(
                &mut canvas,
                &StaticStyle::default(),
                FrameType::Normal,
                FrameFlags::default(),
                200,
                100,
                &frame,
            )
            .unwrap();

        assert_eq!(geometry.borders.visible.top, 18);
        assert_eq!(
            canvas.drawn(),
            vec![
                &Call::FillRect(Rect::new(3.0, 18.0, 200.0, 100.0), Paint::Solid(Rgba::WHITE)),
                &Call::FillRect(Rect::new(0.0, 0.0, 206.0, 18.0), Paint::Solid(Rgba::BLACK)),
            ]
        );
    }

    #[test]
    fn test_draw_frame_without_style() {
        let theme = Theme::new("empty");
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        let drawn = theme.draw_frame(
            &mut canvas,
            &StaticStyle::default(),
            FrameType::Normal,
            FrameFlags::default(),
            10,
            10,
            &FrameInfo::default(),
        );
        assert!(drawn.is_none());
        assert!(canvas.calls.is_empty());
    }
}
