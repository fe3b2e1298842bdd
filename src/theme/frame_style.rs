//! Frame styles and style sets
//!
//! A `FrameStyle` binds a layout to the op lists for every frame piece and
//! button. A `FrameStyleSet` picks the style for a (state, resize, focus)
//! triple. Both inherit from an optional parent.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::canvas::{Canvas, Paint};
use crate::shared::{Geometry, Point, Rect};
use crate::theme::color::{ColorSpec, StyleProvider};
use crate::theme::draw_op::{DrawInfo, DrawOpList};
use crate::theme::error::{Result, ThemeError};
use crate::theme::frame_layout::{FrameGeometry, FrameLayout};

fn parse_name<T: Copy>(all: &[T], name: fn(&T) -> &'static str, s: &str) -> Option<T> {
    all.iter().copied().find(|v| name(v) == s)
}

// ============================================================================
// Buttons
// ============================================================================

/// What a button does; backgrounds come first so they are drawn first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonFunction {
    LeftLeftBackground,
    LeftMiddleBackground,
    LeftRightBackground,
    LeftSingleBackground,
    RightLeftBackground,
    RightMiddleBackground,
    RightRightBackground,
    RightSingleBackground,
    Close,
    Maximize,
    Minimize,
    Menu,
    Shade,
    Above,
    Stick,
    Unshade,
    Unabove,
    Unstick,
}

impl ButtonFunction {
    pub const ALL: [ButtonFunction; 18] = [
        Self::LeftLeftBackground,
        Self::LeftMiddleBackground,
        Self::LeftRightBackground,
        Self::LeftSingleBackground,
        Self::RightLeftBackground,
        Self::RightMiddleBackground,
        Self::RightRightBackground,
        Self::RightSingleBackground,
        Self::Close,
        Self::Maximize,
        Self::Minimize,
        Self::Menu,
        Self::Shade,
        Self::Above,
        Self::Stick,
        Self::Unshade,
        Self::Unabove,
        Self::Unstick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftLeftBackground => "left_left_background",
            Self::LeftMiddleBackground => "left_middle_background",
            Self::LeftRightBackground => "left_right_background",
            Self::LeftSingleBackground => "left_single_background",
            Self::RightLeftBackground => "right_left_background",
            Self::RightMiddleBackground => "right_middle_background",
            Self::RightRightBackground => "right_right_background",
            Self::RightSingleBackground => "right_single_background",
            Self::Close => "close",
            Self::Maximize => "maximize",
            Self::Minimize => "minimize",
            Self::Menu => "menu",
            Self::Shade => "shade",
            Self::Above => "above",
            Self::Stick => "stick",
            Self::Unshade => "unshade",
            Self::Unabove => "unabove",
            Self::Unstick => "unstick",
        }
    }

    pub fn is_background(&self) -> bool {
        *self < Self::Close
    }

    /// Toggles hidden from themes older than format 2
    pub fn is_toggle(&self) -> bool {
        matches!(
            self,
            Self::Shade | Self::Above | Self::Stick | Self::Unshade | Self::Unabove | Self::Unstick
        )
    }

    /// First theme format version that knows about this button
    pub fn earliest_version(&self) -> u32 {
        if self.is_toggle() { 2 } else { 1 }
    }

    /// The other half of a toggle pair
    pub fn opposite(&self) -> Option<ButtonFunction> {
        match self {
            Self::Shade => Some(Self::Unshade),
            Self::Unshade => Some(Self::Shade),
            Self::Above => Some(Self::Unabove),
            Self::Unabove => Some(Self::Above),
            Self::Stick => Some(Self::Unstick),
            Self::Unstick => Some(Self::Stick),
            _ => None,
        }
    }

    /// Next function to try when nothing draws this one
    fn fallback(&self) -> Option<ButtonFunction> {
        match self {
            Self::LeftSingleBackground => Some(Self::LeftLeftBackground),
            Self::RightSingleBackground => Some(Self::RightRightBackground),
            Self::LeftLeftBackground | Self::LeftRightBackground => Some(Self::LeftMiddleBackground),
            Self::RightLeftBackground | Self::RightRightBackground => {
                Some(Self::RightMiddleBackground)
            }
            _ => None,
        }
    }
}

impl FromStr for ButtonFunction {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, Self::as_str, s)
            .ok_or_else(|| ThemeError::Format(format!("Unknown function \"{}\" for button", s)))
    }
}

impl fmt::Display for ButtonFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    #[default]
    Normal,
    Pressed,
    Prelight,
}

impl ButtonState {
    pub const ALL: [ButtonState; 3] = [Self::Normal, Self::Pressed, Self::Prelight];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Pressed => "pressed",
            Self::Prelight => "prelight",
        }
    }
}

impl FromStr for ButtonState {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, Self::as_str, s)
            .ok_or_else(|| ThemeError::Format(format!("Unknown state \"{}\" for button", s)))
    }
}

// ============================================================================
// Frame pieces and states
// ============================================================================

/// Decoration regions, in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePiece {
    EntireBackground,
    Titlebar,
    TitlebarMiddle,
    LeftTitlebarEdge,
    RightTitlebarEdge,
    TopTitlebarEdge,
    BottomTitlebarEdge,
    Title,
    LeftEdge,
    RightEdge,
    BottomEdge,
    Overlay,
}

impl FramePiece {
    pub const ALL: [FramePiece; 12] = [
        Self::EntireBackground,
        Self::Titlebar,
        Self::TitlebarMiddle,
        Self::LeftTitlebarEdge,
        Self::RightTitlebarEdge,
        Self::TopTitlebarEdge,
        Self::BottomTitlebarEdge,
        Self::Title,
        Self::LeftEdge,
        Self::RightEdge,
        Self::BottomEdge,
        Self::Overlay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntireBackground => "entire_background",
            Self::Titlebar => "titlebar",
            Self::TitlebarMiddle => "titlebar_middle",
            Self::LeftTitlebarEdge => "left_titlebar_edge",
            Self::RightTitlebarEdge => "right_titlebar_edge",
            Self::TopTitlebarEdge => "top_titlebar_edge",
            Self::BottomTitlebarEdge => "bottom_titlebar_edge",
            Self::Title => "title",
            Self::LeftEdge => "left_edge",
            Self::RightEdge => "right_edge",
            Self::BottomEdge => "bottom_edge",
            Self::Overlay => "overlay",
        }
    }

    /// Area covered by this piece, relative to the frame origin
    pub fn rect(&self, geometry: &FrameGeometry) -> Geometry {
        let b = &geometry.borders.visible;
        let titlebar = Geometry::new(0, 0, geometry.width, b.top);
        let edge_height = titlebar.height - geometry.top_titlebar_edge - geometry.bottom_titlebar_edge;
        let side_height = geometry.height - b.top - b.bottom;

        match self {
            Self::EntireBackground | Self::Overlay => {
                Geometry::new(0, 0, geometry.width, geometry.height)
            }
            Self::Titlebar => titlebar,
            Self::TitlebarMiddle => Geometry::new(
                geometry.left_titlebar_edge,
                geometry.top_titlebar_edge,
                titlebar.width - geometry.left_titlebar_edge - geometry.right_titlebar_edge,
                edge_height,
            ),
            Self::LeftTitlebarEdge => Geometry::new(
                0,
                geometry.top_titlebar_edge,
                geometry.left_titlebar_edge,
                edge_height,
            ),
            Self::RightTitlebarEdge => Geometry::new(
                titlebar.width - geometry.right_titlebar_edge,
                geometry.top_titlebar_edge,
                geometry.right_titlebar_edge,
                edge_height,
            ),
            Self::TopTitlebarEdge => {
                Geometry::new(0, 0, titlebar.width, geometry.top_titlebar_edge)
            }
            Self::BottomTitlebarEdge => Geometry::new(
                0,
                titlebar.height - geometry.bottom_titlebar_edge,
                titlebar.width,
                geometry.bottom_titlebar_edge,
            ),
            Self::Title => geometry.title_rect,
            Self::LeftEdge => Geometry::new(0, b.top, b.left, side_height),
            Self::RightEdge => {
                Geometry::new(geometry.width - b.right, b.top, b.right, side_height)
            }
            Self::BottomEdge => {
                Geometry::new(0, geometry.height - b.bottom, geometry.width, b.bottom)
            }
        }
    }
}

impl FromStr for FramePiece {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, Self::as_str, s).ok_or_else(|| {
            ThemeError::Format(format!("Unknown position \"{}\" for frame piece", s))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameState {
    Normal,
    Maximized,
    TiledLeft,
    TiledRight,
    Shaded,
    MaximizedAndShaded,
    TiledLeftAndShaded,
    TiledRightAndShaded,
}

impl FrameState {
    pub const ALL: [FrameState; 8] = [
        Self::Normal,
        Self::Maximized,
        Self::TiledLeft,
        Self::TiledRight,
        Self::Shaded,
        Self::MaximizedAndShaded,
        Self::TiledLeftAndShaded,
        Self::TiledRightAndShaded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Maximized => "maximized",
            Self::TiledLeft => "tiled_left",
            Self::TiledRight => "tiled_right",
            Self::Shaded => "shaded",
            Self::MaximizedAndShaded => "maximized_and_shaded",
            Self::TiledLeftAndShaded => "tiled_left_and_shaded",
            Self::TiledRightAndShaded => "tiled_right_and_shaded",
        }
    }

    /// Normal and shaded styles are also indexed by resize capability
    pub fn uses_resize(&self) -> bool {
        matches!(self, Self::Normal | Self::Shaded)
    }
}

impl FromStr for FrameState {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, Self::as_str, s).ok_or_else(|| {
            ThemeError::Format(format!("\"{}\" is not a valid value for state attribute", s))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameResize {
    None,
    Vertical,
    Horizontal,
    Both,
}

impl FrameResize {
    pub const ALL: [FrameResize; 4] = [Self::None, Self::Vertical, Self::Horizontal, Self::Both];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
            Self::Both => "both",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for FrameResize {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, Self::as_str, s).ok_or_else(|| {
            ThemeError::Format(format!("\"{}\" is not a valid value for resize attribute", s))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFocus {
    No,
    Yes,
}

impl FrameFocus {
    pub const ALL: [FrameFocus; 2] = [Self::No, Self::Yes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Yes => "yes",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl From<bool> for FrameFocus {
    fn from(focused: bool) -> Self {
        if focused { Self::Yes } else { Self::No }
    }
}

impl FromStr for FrameFocus {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, Self::as_str, s).ok_or_else(|| {
            ThemeError::Format(format!("\"{}\" is not a valid value for focus attribute", s))
        })
    }
}

// ============================================================================
// Frame style
// ============================================================================

/// Op lists and layout for one look of the frame
#[derive(Debug)]
pub struct FrameStyle {
    pub parent: Option<Rc<FrameStyle>>,
    pub layout: Rc<FrameLayout>,
    buttons: HashMap<(ButtonFunction, ButtonState), Rc<DrawOpList>>,
    pieces: HashMap<FramePiece, Rc<DrawOpList>>,
    pub window_background_color: Option<ColorSpec>,
    pub window_background_alpha: u8,
}

impl FrameStyle {
    pub fn new(parent: Option<Rc<FrameStyle>>, layout: Rc<FrameLayout>) -> Self {
        Self {
            parent,
            layout,
            buttons: HashMap::new(),
            pieces: HashMap::new(),
            window_background_color: None,
            window_background_alpha: 255,
        }
    }

    /// Ancestors starting with this style
    fn chain(&self) -> impl Iterator<Item = &FrameStyle> {
        std::iter::successors(Some(self), |style| style.parent.as_deref())
    }

    pub fn set_button(
        &mut self,
        function: ButtonFunction,
        state: ButtonState,
        list: Rc<DrawOpList>,
    ) -> Result<()> {
        if self.buttons.contains_key(&(function, state)) {
            return Err(ThemeError::Format(format!(
                "Frame style already has a button for function {} state {}",
                function.as_str(),
                state.as_str()
            )));
        }
        self.buttons.insert((function, state), list);
        Ok(())
    }

    pub fn set_piece(&mut self, piece: FramePiece, list: Rc<DrawOpList>) -> Result<()> {
        if self.pieces.contains_key(&piece) {
            return Err(ThemeError::Format(format!(
                "Frame style already has a piece at position {}",
                piece.as_str()
            )));
        }
        self.pieces.insert(piece, list);
        Ok(())
    }

    /// Op list for a button, walking parents and then the fixed fallback
    /// table. Each fallback restarts the whole search.
    pub fn get_button(&self, function: ButtonFunction, state: ButtonState) -> Option<Rc<DrawOpList>> {
        let found = self
            .chain()
            .find_map(|style| style.buttons.get(&(function, state)).cloned());
        if found.is_some() {
            return found;
        }

        if let Some(next) = function.fallback() {
            return self.get_button(next, state);
        }

        if state == ButtonState::Prelight {
            return self.get_button(function, ButtonState::Normal);
        }

        None
    }

    pub fn get_piece(&self, piece: FramePiece) -> Option<Rc<DrawOpList>> {
        self.chain().find_map(|style| style.pieces.get(&piece).cloned())
    }

    /// Every real button must be drawable in every state the theme format
    /// knows about. Background buttons stay optional.
    pub fn validate(&self, theme_version: u32) -> Result<()> {
        for function in ButtonFunction::ALL.iter().filter(|f| !f.is_background()) {
            for state in ButtonState::ALL {
                if function.earliest_version() <= theme_version
                    && self.get_button(*function, state).is_none()
                {
                    return Err(ThemeError::Missing(format!(
                        "<button function='{}' state='{}' draw_ops='whatever'/> must be specified for this frame style",
                        function.as_str(),
                        state.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Paint the pieces and buttons of a frame whose top-left corner is at
    /// `origin`. `info` supplies the per-window content (icons, title, scale);
    /// its measurements are replaced by those of `geometry`.
    pub fn draw(
        &self,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        info: &DrawInfo<'_>,
        geometry: &FrameGeometry,
        button_states: &HashMap<ButtonFunction, ButtonState>,
        origin: Point,
    ) {
        let borders = &geometry.borders.visible;
        let info = DrawInfo {
            width: geometry.width as f64,
            height: geometry.height as f64,
            left_width: borders.left as f64,
            right_width: borders.right as f64,
            top_height: borders.top as f64,
            bottom_height: borders.bottom as f64,
            ..*info
        };

        let place = |g: Geometry| {
            Rect::new(origin.x + g.x as f64, origin.y + g.y as f64, g.width as f64, g.height as f64)
        };

        for piece in FramePiece::ALL {
            if piece == FramePiece::Overlay {
                self.draw_buttons(canvas, provider, &info, geometry, button_states, origin);
            }

            let rect = place(piece.rect(geometry));
            if canvas.clip_extents().intersect(&rect).is_empty() {
                continue;
            }

            if let Some(list) = self.get_piece(piece) {
                list.draw(canvas, provider, &info, rect);
            }
        }
    }

    fn draw_buttons(
        &self,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        info: &DrawInfo<'_>,
        geometry: &FrameGeometry,
        button_states: &HashMap<ButtonFunction, ButtonState>,
        origin: Point,
    ) {
        let state_of = |f: ButtonFunction| button_states.get(&f).copied().unwrap_or_default();

        // Every background goes under every button
        let backgrounds = geometry
            .buttons
            .iter()
            .map(|slot| (slot.background, state_of(slot.function), slot.rect));
        let buttons = geometry
            .buttons
            .iter()
            .map(|slot| (slot.function, state_of(slot.function), slot.rect));

        for (function, state, rect) in backgrounds.chain(buttons) {
            let rect = Rect::new(
                origin.x + rect.x as f64,
                origin.y + rect.y as f64,
                rect.width as f64,
                rect.height as f64,
            );
            if canvas.clip_extents().intersect(&rect).is_empty() {
                continue;
            }

            match self.get_button(function, state) {
                Some(list) => list.draw(canvas, provider, info, rect),
                None => debug!("No op list for button {} ({})", function, state.as_str()),
            }
        }
    }

    /// Fill the client area with the window background color, if any
    pub fn draw_window_background(
        &self,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        client: Rect,
    ) {
        let Some(spec) = self
            .chain()
            .find_map(|style| style.window_background_color.as_ref())
        else {
            return;
        };

        let color = spec.render(provider);
        let alpha = color.alpha * self.window_background_alpha as f64 / 255.0;
        canvas.fill_rect(client, &Paint::Solid(color.with_alpha(alpha)));
    }
}

// ============================================================================
// Frame style set
// ============================================================================

type FocusStyles = [Option<Rc<FrameStyle>>; 2];

/// Frame styles for every window state of one frame type
#[derive(Debug, Default)]
pub struct FrameStyleSet {
    pub parent: Option<Rc<FrameStyleSet>>,
    normal: [FocusStyles; 4],
    shaded: [FocusStyles; 4],
    maximized: FocusStyles,
    tiled_left: FocusStyles,
    tiled_right: FocusStyles,
    maximized_and_shaded: FocusStyles,
    tiled_left_and_shaded: FocusStyles,
    tiled_right_and_shaded: FocusStyles,
}

impl FrameStyleSet {
    pub fn new(parent: Option<Rc<FrameStyleSet>>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    fn focus_styles(&self, state: FrameState, resize: FrameResize) -> &FocusStyles {
        match state {
            FrameState::Normal => &self.normal[resize.index()],
            FrameState::Shaded => &self.shaded[resize.index()],
            FrameState::Maximized => &self.maximized,
            FrameState::TiledLeft => &self.tiled_left,
            FrameState::TiledRight => &self.tiled_right,
            FrameState::MaximizedAndShaded => &self.maximized_and_shaded,
            FrameState::TiledLeftAndShaded => &self.tiled_left_and_shaded,
            FrameState::TiledRightAndShaded => &self.tiled_right_and_shaded,
        }
    }

    fn focus_styles_mut(&mut self, state: FrameState, resize: FrameResize) -> &mut FocusStyles {
        match state {
            FrameState::Normal => &mut self.normal[resize.index()],
            FrameState::Shaded => &mut self.shaded[resize.index()],
            FrameState::Maximized => &mut self.maximized,
            FrameState::TiledLeft => &mut self.tiled_left,
            FrameState::TiledRight => &mut self.tiled_right,
            FrameState::MaximizedAndShaded => &mut self.maximized_and_shaded,
            FrameState::TiledLeftAndShaded => &mut self.tiled_left_and_shaded,
            FrameState::TiledRightAndShaded => &mut self.tiled_right_and_shaded,
        }
    }

    /// Register `style` for a slot. Resize is required for normal and shaded
    /// frames and not allowed for the other states.
    pub fn set_style(
        &mut self,
        state: FrameState,
        resize: Option<FrameResize>,
        focus: FrameFocus,
        style: Rc<FrameStyle>,
    ) -> Result<()> {
        let resize = match (state.uses_resize(), resize) {
            (true, Some(resize)) => resize,
            (true, None) => {
                return Err(ThemeError::Format(
                    "No \"resize\" attribute on element <frame>".into(),
                ));
            }
            (false, Some(_)) => {
                return Err(ThemeError::Format(
                    "Should not have \"resize\" attribute on <frame> element for maximized/shaded states"
                        .into(),
                ));
            }
            (false, None) => FrameResize::Both,
        };

        let slot = &mut self.focus_styles_mut(state, resize)[focus.index()];
        if slot.is_some() {
            let message = if state.uses_resize() {
                format!(
                    "Style has already been specified for state {} resize {} focus {}",
                    state.as_str(),
                    resize.as_str(),
                    focus.as_str()
                )
            } else {
                format!(
                    "Style has already been specified for state {} focus {}",
                    state.as_str(),
                    focus.as_str()
                )
            };
            return Err(ThemeError::Format(message));
        }

        *slot = Some(style);
        Ok(())
    }

    /// Resolve the style for a window state
    ///
    /// Normal and shaded frames try this set, then the parent, then this set
    /// again with `Both` resize. The single-axis states fall back from tiled
    /// to the untiled state of this set before asking the parent.
    pub fn get_style(
        &self,
        state: FrameState,
        resize: FrameResize,
        focus: FrameFocus,
    ) -> Option<Rc<FrameStyle>> {
        let mut style = self.focus_styles(state, resize)[focus.index()].clone();

        if state.uses_resize() {
            if style.is_none() {
                style = self
                    .parent
                    .as_ref()
                    .and_then(|parent| parent.get_style(state, resize, focus));
            }
            if style.is_none() && resize != FrameResize::Both {
                style = self.get_style(state, FrameResize::Both, focus);
            }
        } else {
            if style.is_none() {
                style = match state {
                    FrameState::TiledLeft | FrameState::TiledRight => {
                        self.get_style(FrameState::Normal, resize, focus)
                    }
                    FrameState::TiledLeftAndShaded | FrameState::TiledRightAndShaded => {
                        self.get_style(FrameState::Shaded, resize, focus)
                    }
                    _ => None,
                };
            }
            if style.is_none() {
                style = self
                    .parent
                    .as_ref()
                    .and_then(|parent| parent.get_style(state, resize, focus));
            }
        }

        style
    }

    pub fn validate(&self) -> Result<()> {
        let missing = |state: FrameState, resize: FrameResize, focus: FrameFocus| {
            ThemeError::Missing(format!(
                "Missing <frame state='{}' resize='{}' focus='{}' style='whatever' />",
                state.as_str(),
                resize.as_str(),
                focus.as_str()
            ))
        };

        for resize in FrameResize::ALL {
            for focus in FrameFocus::ALL {
                if self.get_style(FrameState::Normal, resize, focus).is_none() {
                    return Err(missing(FrameState::Normal, resize, focus));
                }
            }
        }

        for state in [
            FrameState::Shaded,
            FrameState::Maximized,
            FrameState::MaximizedAndShaded,
        ] {
            for focus in FrameFocus::ALL {
                if self.get_style(state, FrameResize::None, focus).is_none() {
                    return Err(missing(state, FrameResize::None, focus));
                }
            }
        }

        Ok(())
    }
}
