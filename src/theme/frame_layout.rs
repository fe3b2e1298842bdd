//! Frame layout and geometry
//!
//! `FrameLayout` holds the numeric knobs of a decoration (border widths,
//! button sizing, corner radii). `calc_geometry` turns a layout plus window
//! state into concrete rectangles for the titlebar, title and buttons.

use serde::{Deserialize, Serialize};

use crate::shared::Geometry;
use crate::theme::button_layout::ButtonLayout;
use crate::theme::error::{Result, ThemeError};
use crate::theme::flags::FrameFlags;
use crate::theme::frame_style::ButtonFunction;

/// Sentinel for dimensions the theme has not set yet
pub const UNSET: i32 = -1;

/// Per-edge widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Border {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Border {
    pub const UNSET: Border = Border::new(UNSET, UNSET, UNSET, UNSET);

    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// First unset side, checked top, bottom, left, right
    fn unset_side(&self) -> Option<&'static str> {
        if self.top < 0 {
            Some("top")
        } else if self.bottom < 0 {
            Some("bottom")
        } else if self.left < 0 {
            Some("left")
        } else if self.right < 0 {
            Some("right")
        } else {
            None
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match self.unset_side() {
            Some(side) => Err(ThemeError::FrameGeometry(format!(
                "frame geometry does not specify dimension '{}' for border '{}'",
                side, name
            ))),
            None => Ok(()),
        }
    }
}

fn validate_value(value: i32, name: &str) -> Result<()> {
    if value < 0 {
        return Err(ThemeError::FrameGeometry(format!(
            "frame geometry does not specify '{}' dimension",
            name
        )));
    }
    Ok(())
}

/// How button sizes are derived
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ButtonSizing {
    #[default]
    Unset,
    /// Height fills the titlebar, width = height / aspect
    Aspect(f64),
    Fixed { width: i32, height: i32 },
}

/// Corner radii; 0 is a square corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: u32,
    pub top_right: u32,
    pub bottom_left: u32,
    pub bottom_right: u32,
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub left_width: i32,
    pub right_width: i32,
    pub bottom_height: i32,

    /// Space around the title text
    pub title_border: Border,
    /// Extra vertical space added to the title text height
    pub title_vertical_pad: i32,

    pub right_titlebar_edge: i32,
    pub left_titlebar_edge: i32,

    pub button_sizing: ButtonSizing,
    /// Space around each button
    pub button_border: Border,

    /// Grab area outside the visible frame
    pub invisible_resize_border: Border,

    pub corners: Corners,
    pub title_scale: f64,
    pub has_title: bool,
    pub hide_buttons: bool,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLayout {
    /// Layout with every required dimension unset
    pub fn new() -> Self {
        Self {
            left_width: UNSET,
            right_width: UNSET,
            bottom_height: UNSET,
            title_border: Border::UNSET,
            title_vertical_pad: UNSET,
            right_titlebar_edge: UNSET,
            left_titlebar_edge: UNSET,
            button_sizing: ButtonSizing::Unset,
            button_border: Border::UNSET,
            invisible_resize_border: Border::new(10, 10, 10, 10),
            corners: Corners::default(),
            title_scale: 1.0,
            has_title: true,
            hide_buttons: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_value(self.left_width, "left_width")?;
        validate_value(self.right_width, "right_width")?;
        validate_value(self.bottom_height, "bottom_height")?;
        self.title_border.validate("title_border")?;
        validate_value(self.title_vertical_pad, "title_vertical_pad")?;
        validate_value(self.right_titlebar_edge, "right_titlebar_edge")?;
        validate_value(self.left_titlebar_edge, "left_titlebar_edge")?;

        match self.button_sizing {
            ButtonSizing::Aspect(aspect) => {
                if !(0.1..=15.0).contains(&aspect) {
                    return Err(ThemeError::FrameGeometry(format!(
                        "Button aspect ratio {} is not reasonable",
                        aspect
                    )));
                }
            }
            ButtonSizing::Fixed { width, height } => {
                validate_value(width, "button_width")?;
                validate_value(height, "button_height")?;
            }
            ButtonSizing::Unset => {
                return Err(ThemeError::FrameGeometry(
                    "Frame geometry does not specify size of buttons".into(),
                ));
            }
        }

        self.button_border.validate("button_border")
    }

    /// Border sizes for a title of `text_height` pixels
    pub fn get_borders(&self, text_height: i32, flags: FrameFlags) -> FrameBorders {
        let text_height = if self.has_title { text_height } else { 0 };

        let button_height = match self.button_sizing {
            ButtonSizing::Fixed { height, .. } => height,
            _ => 0,
        };
        let buttons_height = button_height + self.button_border.top + self.button_border.bottom;
        let title_height = text_height
            + self.title_vertical_pad
            + self.title_border.top
            + self.title_border.bottom;

        let mut visible = Border::new(
            self.left_width,
            self.right_width,
            buttons_height.max(title_height),
            if flags.contains(FrameFlags::SHADED) {
                0
            } else {
                self.bottom_height
            },
        );

        if flags.contains(FrameFlags::FULLSCREEN) {
            visible = Border::default();
        }

        FrameBorders {
            visible,
            invisible: self.invisible_resize_border,
        }
    }

    fn button_size(&self, top_height: i32) -> (i32, i32) {
        match self.button_sizing {
            ButtonSizing::Aspect(aspect) => {
                let height = top_height - self.button_border.top - self.button_border.bottom;
                ((height as f64 / aspect) as i32, height)
            }
            ButtonSizing::Fixed { width, height } => (width, height),
            ButtonSizing::Unset => (0, 0),
        }
    }

    /// Full frame geometry for a client of the given size
    pub fn calc_geometry(
        &self,
        text_height: i32,
        flags: FrameFlags,
        client_width: i32,
        client_height: i32,
        button_layout: &ButtonLayout,
    ) -> FrameGeometry {
        let borders = self.get_borders(text_height, flags);
        let b = borders.visible;

        let width = client_width + b.left + b.right;
        let client_height = if flags.contains(FrameFlags::SHADED) {
            0
        } else {
            client_height
        };
        let height = client_height + b.top + b.bottom;

        let (button_width, button_height) = self.button_size(b.top);
        let bb = self.button_border;

        let visible = |functions: &[ButtonFunction]| -> Vec<ButtonFunction> {
            if self.hide_buttons {
                return Vec::new();
            }
            functions
                .iter()
                .copied()
                .filter(|f| button_allowed(*f, flags))
                .collect()
        };
        let mut left = visible(&button_layout.left);
        let mut right = visible(&button_layout.right);

        // Drop buttons until everything fits
        let space_available = width - self.left_titlebar_edge - self.right_titlebar_edge;
        let per_button = button_width + bb.left + bb.right;
        while !left.is_empty() || !right.is_empty() {
            let used = (left.len() + right.len()) as i32 * per_button;
            if used <= space_available {
                break;
            }
            if !strip_one(&mut left, &mut right) {
                break;
            }
        }

        let button_y = (b.top - (button_height + bb.top + bb.bottom)) / 2 + bb.top;
        let mut buttons = Vec::with_capacity(left.len() + right.len());

        // Right corner, from the outer edge inwards
        let mut x = width - self.right_titlebar_edge;
        for (i, function) in right.iter().enumerate().rev() {
            if x < 0 {
                break;
            }
            let rect = Geometry::new(x - bb.right - button_width, button_y, button_width, button_height);
            buttons.push(ButtonSlot {
                function: *function,
                background: right_background(i, right.len()),
                rect,
            });
            x = rect.x - bb.left;
        }
        let title_right_edge = x - self.title_border.right;

        // Left corner, from the outer edge inwards
        let mut x = self.left_titlebar_edge;
        for (i, function) in left.iter().enumerate() {
            let rect = Geometry::new(x + bb.left, button_y, button_width, button_height);
            buttons.push(ButtonSlot {
                function: *function,
                background: left_background(i, left.len()),
                rect,
            });
            x = rect.x + rect.width + bb.right;
        }

        let mut title_rect = Geometry::new(
            x + self.title_border.left,
            self.title_border.top,
            0,
            b.top - self.title_border.top - self.title_border.bottom,
        );
        title_rect.width = title_right_edge - title_rect.x;
        if title_rect.width < 0 || title_rect.height < 0 {
            title_rect.width = 0;
            title_rect.height = 0;
        }

        let min_size = if flags.contains(FrameFlags::SHADED) { 0 } else { 3 };
        let mut corners = Corners::default();
        if b.top >= min_size {
            if b.left >= min_size {
                corners.top_left = self.corners.top_left;
            }
            if b.right >= min_size {
                corners.top_right = self.corners.top_right;
            }
        }
        if b.bottom >= min_size {
            if b.left >= min_size {
                corners.bottom_left = self.corners.bottom_left;
            }
            if b.right >= min_size {
                corners.bottom_right = self.corners.bottom_right;
            }
        }

        FrameGeometry {
            borders,
            width,
            height,
            top_titlebar_edge: self.title_border.top,
            bottom_titlebar_edge: self.title_border.bottom,
            left_titlebar_edge: self.left_titlebar_edge,
            right_titlebar_edge: self.right_titlebar_edge,
            title_rect,
            buttons,
            corners,
        }
    }
}

/// Whether the window's flags let `function` appear at all
fn button_allowed(function: ButtonFunction, flags: FrameFlags) -> bool {
    use ButtonFunction::*;

    match function {
        Menu => flags.contains(FrameFlags::ALLOWS_MENU),
        Minimize => flags.contains(FrameFlags::ALLOWS_MINIMIZE),
        Maximize => flags.contains(FrameFlags::ALLOWS_MAXIMIZE),
        Close => flags.contains(FrameFlags::ALLOWS_DELETE),
        Shade => flags.contains(FrameFlags::ALLOWS_SHADE) && !flags.contains(FrameFlags::SHADED),
        Unshade => flags.contains(FrameFlags::ALLOWS_SHADE) && flags.contains(FrameFlags::SHADED),
        Above => !flags.contains(FrameFlags::ABOVE),
        Unabove => flags.contains(FrameFlags::ABOVE),
        Stick => !flags.contains(FrameFlags::STUCK),
        Unstick => flags.contains(FrameFlags::STUCK),
        _ => false,
    }
}

/// Remove the least useful remaining button. Returns false if none of the
/// candidates is present.
fn strip_one(left: &mut Vec<ButtonFunction>, right: &mut Vec<ButtonFunction>) -> bool {
    use ButtonFunction::*;

    let mut order: Vec<(ButtonFunction, bool)> = Vec::new();
    for function in [Shade, Unshade, Above, Unabove, Stick, Unstick, Minimize, Maximize, Close] {
        order.push((function, true));
        order.push((function, false));
    }
    // Menu is the most useful, and prefers to stay on the left
    order.push((Menu, false));
    order.push((Menu, true));

    for (function, on_left) in order {
        let side = if on_left { &mut *left } else { &mut *right };
        if let Some(pos) = side.iter().position(|f| *f == function) {
            side.remove(pos);
            return true;
        }
    }
    false
}

fn left_background(i: usize, n: usize) -> ButtonFunction {
    if n == 1 {
        ButtonFunction::LeftSingleBackground
    } else if i == 0 {
        ButtonFunction::LeftLeftBackground
    } else if i == n - 1 {
        ButtonFunction::LeftRightBackground
    } else {
        ButtonFunction::LeftMiddleBackground
    }
}

fn right_background(i: usize, n: usize) -> ButtonFunction {
    if n == 1 {
        ButtonFunction::RightSingleBackground
    } else if i == n - 1 {
        ButtonFunction::RightRightBackground
    } else if i == 0 {
        ButtonFunction::RightLeftBackground
    } else {
        ButtonFunction::RightMiddleBackground
    }
}

// ============================================================================
// Geometry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameBorders {
    pub visible: Border,
    pub invisible: Border,
}

impl FrameBorders {
    /// Visible plus invisible on every side
    pub fn total(&self) -> Border {
        Border::new(
            self.visible.left + self.invisible.left,
            self.visible.right + self.invisible.right,
            self.visible.top + self.invisible.top,
            self.visible.bottom + self.invisible.bottom,
        )
    }
}

/// One placed button and the background drawn under it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonSlot {
    pub function: ButtonFunction,
    pub background: ButtonFunction,
    pub rect: Geometry,
}

/// Concrete frame measurements, relative to the frame's top-left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGeometry {
    pub borders: FrameBorders,
    pub width: i32,
    pub height: i32,

    pub top_titlebar_edge: i32,
    pub bottom_titlebar_edge: i32,
    pub left_titlebar_edge: i32,
    pub right_titlebar_edge: i32,

    pub title_rect: Geometry,
    pub buttons: Vec<ButtonSlot>,
    /// Radii actually applied; corners next to thin borders stay square
    pub corners: Corners,
}

impl FrameGeometry {
    pub fn button(&self, function: ButtonFunction) -> Option<&ButtonSlot> {
        self.buttons.iter().find(|slot| slot.function == function)
    }

    /// Client area relative to the frame origin
    pub fn client_rect(&self) -> Geometry {
        let b = &self.borders.visible;
        Geometry::new(
            b.left,
            b.top,
            self.width - b.left - b.right,
            self.height - b.top - b.bottom,
        )
    }
}
