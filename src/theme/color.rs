//! Colors and color specifications
//!
//! A `ColorSpec` is the parsed form of a theme color string. It is resolved
//! against a `StyleProvider` at render time, so palette-relative colors follow
//! the host toolkit's current colors.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::theme::error::{Result, ThemeError};
use crate::theme::expr::parse_leading_float;

/// Multiplier applied to the background color for `light`
const LIGHTNESS_MULT: f64 = 1.3;
/// Multiplier applied to the background color for `dark`
const DARKNESS_MULT: f64 = 0.7;

/// Slack allowed on blend alpha and shade factor bounds
const RANGE_TOLERANCE: f64 = 1e-6;

// ============================================================================
// RGBA / HSLA
// ============================================================================

/// Floating point RGBA color, channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::rgb(red as f64 / 255.0, green as f64 / 255.0, blue as f64 / 255.0)
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    /// Channels as bytes, rounded and clamped
    pub fn to_rgba8(&self) -> [u8; 4] {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            byte(self.red),
            byte(self.green),
            byte(self.blue),
            byte(self.alpha),
        ]
    }

    /// Alpha in [0, 1] as a byte, rounded and clamped
    pub fn alpha_byte(alpha: f64) -> u8 {
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Packed 0xRRGGBB key with channels truncated to bytes
    pub fn rgb_key(&self) -> u32 {
        let byte = |v: f64| ((v * 255.0) as i64 & 0xff) as u32;
        (byte(self.red) << 16) | (byte(self.green) << 8) | byte(self.blue)
    }

    /// Linear interpolation of every channel, alpha included
    pub fn blend(bg: Rgba, fg: Rgba, alpha: f64) -> Rgba {
        Rgba::new(
            bg.red + (fg.red - bg.red) * alpha,
            bg.green + (fg.green - bg.green) * alpha,
            bg.blue + (fg.blue - bg.blue) * alpha,
            bg.alpha + (fg.alpha - bg.alpha) * alpha,
        )
    }

    /// Scale saturation and lightness by `factor`, keeping hue and alpha
    pub fn shade(&self, factor: f64) -> Rgba {
        Hsla::from_rgba(self).shade(factor).to_rgba()
    }

    /// Mean of the RGB channels; alpha is taken from `self`
    fn average_rgb(&self, other: &Rgba) -> Rgba {
        Rgba::new(
            (self.red + other.red) / 2.0,
            (self.green + other.green) / 2.0,
            (self.blue + other.blue) / 2.0,
            self.alpha,
        )
    }

    /// Parse a literal color: `#rgb`, `#rrggbb`, `#rrrgggbbb`, `#rrrrggggbbbb`,
    /// `rgb(r,g,b)`, `rgba(r,g,b,a)` or a color name
    pub fn parse(text: &str) -> Option<Rgba> {
        let text = text.trim();

        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex);
        }

        if let Some(args) = text.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 4 {
                return None;
            }
            let alpha = parts[3].parse::<f64>().ok()?.clamp(0.0, 1.0);
            return Some(Rgba::new(
                parse_channel(parts[0])?,
                parse_channel(parts[1])?,
                parse_channel(parts[2])?,
                alpha,
            ));
        }

        if let Some(args) = text.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return None;
            }
            return Some(Rgba::rgb(
                parse_channel(parts[0])?,
                parse_channel(parts[1])?,
                parse_channel(parts[2])?,
            ));
        }

        named_color(text)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if hex.is_empty() || hex.len() % 3 != 0 || hex.len() > 12 {
        return None;
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let digits = hex.len() / 3;
    let max = ((1u32 << (4 * digits)) - 1) as f64;
    let channel = |i: usize| -> Option<f64> {
        let v = u32::from_str_radix(&hex[i * digits..(i + 1) * digits], 16).ok()?;
        Some(v as f64 / max)
    };

    Some(Rgba::rgb(channel(0)?, channel(1)?, channel(2)?))
}

/// `rgb()` channel: an integer 0..255 or a percentage
fn parse_channel(text: &str) -> Option<f64> {
    if let Some(percent) = text.strip_suffix('%') {
        let v = percent.trim().parse::<f64>().ok()?;
        return Some((v / 100.0).clamp(0.0, 1.0));
    }
    let v = text.parse::<f64>().ok()?;
    Some((v / 255.0).clamp(0.0, 1.0))
}

/// Color names resolve like the toolkit does, from the X11 table. CSS and
/// X11 disagree on a handful of names; the X11 value wins for those.
fn named_color(name: &str) -> Option<Rgba> {
    let name = name.to_ascii_lowercase();
    let (r, g, b) = match name.as_str() {
        "transparent" => return Some(Rgba::TRANSPARENT),
        "gray" | "grey" => (190, 190, 190),
        "green" => (0, 255, 0),
        "maroon" => (176, 48, 96),
        "purple" => (160, 32, 240),
        other => palette::named::from_str(other)?.into_components(),
    };
    Some(Rgba::from_rgb8(r, g, b))
}

/// Hue in degrees, saturation and lightness in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub alpha: f64,
}

impl Hsla {
    pub fn from_rgba(rgba: &Rgba) -> Self {
        let (red, green, blue) = (rgba.red, rgba.green, rgba.blue);

        let (max, min) = if red > green {
            (
                if red > blue { red } else { blue },
                if green < blue { green } else { blue },
            )
        } else {
            (
                if green > blue { green } else { blue },
                if red < blue { red } else { blue },
            )
        };

        let mut hsla = Hsla {
            hue: 0.0,
            saturation: 0.0,
            lightness: (max + min) / 2.0,
            alpha: rgba.alpha,
        };

        if max != min {
            hsla.saturation = if hsla.lightness <= 0.5 {
                (max - min) / (max + min)
            } else {
                (max - min) / (2.0 - max - min)
            };

            let delta = max - min;
            if red == max {
                hsla.hue = (green - blue) / delta;
            } else if green == max {
                hsla.hue = 2.0 + (blue - red) / delta;
            } else {
                hsla.hue = 4.0 + (red - green) / delta;
            }

            hsla.hue *= 60.0;
            if hsla.hue < 0.0 {
                hsla.hue += 360.0;
            }
        }

        hsla
    }

    pub fn to_rgba(&self) -> Rgba {
        let (s, l) = (self.saturation, self.lightness);

        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;

        if s == 0.0 {
            return Rgba::new(l, l, l, self.alpha);
        }

        let channel = |hue: f64| {
            let mut hue = hue;
            while hue > 360.0 {
                hue -= 360.0;
            }
            while hue < 0.0 {
                hue += 360.0;
            }

            if hue < 60.0 {
                m1 + (m2 - m1) * hue / 60.0
            } else if hue < 180.0 {
                m2
            } else if hue < 240.0 {
                m1 + (m2 - m1) * (240.0 - hue) / 60.0
            } else {
                m1
            }
        };

        Rgba::new(
            channel(self.hue + 120.0),
            channel(self.hue),
            channel(self.hue - 120.0),
            self.alpha,
        )
    }

    pub fn shade(&self, factor: f64) -> Hsla {
        Hsla {
            hue: self.hue,
            saturation: (self.saturation * factor).clamp(0.0, 1.0),
            lightness: (self.lightness * factor).clamp(0.0, 1.0),
            alpha: self.alpha,
        }
    }
}

// ============================================================================
// Style provider
// ============================================================================

/// Widget state a palette color is queried for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetState {
    Normal,
    Prelight,
    Active,
    Selected,
    Insensitive,
    Inconsistent,
    Focused,
    Backdrop,
}

impl WidgetState {
    pub const ALL: [WidgetState; 8] = [
        Self::Normal,
        Self::Prelight,
        Self::Active,
        Self::Selected,
        Self::Insensitive,
        Self::Inconsistent,
        Self::Focused,
        Self::Backdrop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Prelight => "prelight",
            Self::Active => "active",
            Self::Selected => "selected",
            Self::Insensitive => "insensitive",
            Self::Inconsistent => "inconsistent",
            Self::Focused => "focused",
            Self::Backdrop => "backdrop",
        }
    }
}

impl FromStr for WidgetState {
    type Err = ();

    /// Case-insensitive
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorComponent {
    Fg,
    Bg,
    Light,
    Dark,
    Mid,
    Text,
    Base,
    TextAa,
}

impl ColorComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fg => "fg",
            Self::Bg => "bg",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Mid => "mid",
            Self::Text => "text",
            Self::Base => "base",
            Self::TextAa => "text_aa",
        }
    }

    /// Resolve against `provider`; only fg and bg are stored, the rest derive
    pub fn resolve(&self, provider: &dyn StyleProvider, state: WidgetState) -> Rgba {
        match self {
            Self::Bg | Self::Base => provider.background_color(state),
            Self::Fg | Self::Text => provider.foreground_color(state),
            Self::TextAa => {
                let text = provider.foreground_color(state);
                text.average_rgb(&provider.background_color(state))
            }
            Self::Mid => {
                let light = Self::Light.resolve(provider, state);
                light.average_rgb(&Self::Dark.resolve(provider, state))
            }
            Self::Light => provider.background_color(state).shade(LIGHTNESS_MULT),
            Self::Dark => provider.background_color(state).shade(DARKNESS_MULT),
        }
    }
}

impl FromStr for ColorComponent {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "fg" => Self::Fg,
            "bg" => Self::Bg,
            "light" => Self::Light,
            "dark" => Self::Dark,
            "mid" => Self::Mid,
            "text" => Self::Text,
            "base" => Self::Base,
            "text_aa" => Self::TextAa,
            _ => return Err(()),
        })
    }
}

/// Host capability answering palette questions
pub trait StyleProvider {
    /// Named palette entry (`gtk:custom(name,...)`)
    fn lookup_color(&self, name: &str) -> Option<Rgba>;
    fn background_color(&self, state: WidgetState) -> Rgba;
    fn foreground_color(&self, state: WidgetState) -> Rgba;
}

/// Fixed palette, used by the CLI and tests
#[derive(Debug, Clone)]
pub struct StaticStyle {
    pub background: HashMap<WidgetState, Rgba>,
    pub foreground: HashMap<WidgetState, Rgba>,
    pub named: HashMap<String, Rgba>,
}

impl StaticStyle {
    /// Uniform palette: every state gets the same pair
    pub fn new(background: Rgba, foreground: Rgba) -> Self {
        Self {
            background: HashMap::from([(WidgetState::Normal, background)]),
            foreground: HashMap::from([(WidgetState::Normal, foreground)]),
            named: HashMap::new(),
        }
    }

    pub fn with_named(mut self, name: &str, color: Rgba) -> Self {
        self.named.insert(name.to_string(), color);
        self
    }

    fn pick(map: &HashMap<WidgetState, Rgba>, state: WidgetState, fallback: Rgba) -> Rgba {
        map.get(&state)
            .or_else(|| map.get(&WidgetState::Normal))
            .copied()
            .unwrap_or(fallback)
    }
}

impl Default for StaticStyle {
    fn default() -> Self {
        let mut style = Self::new(Rgba::from_rgb8(0xf6, 0xf5, 0xf4), Rgba::from_rgb8(0x2e, 0x34, 0x36));
        style
            .background
            .insert(WidgetState::Selected, Rgba::from_rgb8(0x35, 0x84, 0xe4));
        style
            .foreground
            .insert(WidgetState::Selected, Rgba::WHITE);
        style
            .background
            .insert(WidgetState::Prelight, Rgba::from_rgb8(0xf9, 0xf9, 0xf8));
        style
            .foreground
            .insert(WidgetState::Insensitive, Rgba::from_rgb8(0x92, 0x95, 0x95));
        style
            .foreground
            .insert(WidgetState::Backdrop, Rgba::from_rgb8(0x91, 0x94, 0x94));
        style
    }
}

impl StyleProvider for StaticStyle {
    fn lookup_color(&self, name: &str) -> Option<Rgba> {
        self.named.get(name).copied()
    }

    fn background_color(&self, state: WidgetState) -> Rgba {
        Self::pick(&self.background, state, Rgba::WHITE)
    }

    fn foreground_color(&self, state: WidgetState) -> Rgba {
        Self::pick(&self.foreground, state, Rgba::BLACK)
    }
}

// ============================================================================
// ColorSpec
// ============================================================================

/// Parsed theme color
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    Basic(Rgba),
    Gtk {
        component: ColorComponent,
        state: WidgetState,
    },
    Custom {
        name: String,
        fallback: Box<ColorSpec>,
    },
    Blend {
        background: Box<ColorSpec>,
        foreground: Box<ColorSpec>,
        alpha: f64,
        /// Last rendered color
        cache: Cell<Option<Rgba>>,
    },
    Shade {
        base: Box<ColorSpec>,
        factor: f64,
        cache: Cell<Option<Rgba>>,
    },
}

impl ColorSpec {
    pub fn blend(background: ColorSpec, foreground: ColorSpec, alpha: f64) -> Self {
        Self::Blend {
            background: Box::new(background),
            foreground: Box::new(foreground),
            alpha,
            cache: Cell::new(None),
        }
    }

    pub fn shade(base: ColorSpec, factor: f64) -> Self {
        Self::Shade {
            base: Box::new(base),
            factor,
            cache: Cell::new(None),
        }
    }

    /// Parse one of the textual color forms
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(rest) = text.strip_prefix("gtk:custom") {
            Self::parse_custom(text, rest)
        } else if let Some(rest) = text.strip_prefix("gtk:") {
            Self::parse_gtk(text, rest)
        } else if text.starts_with("blend/") {
            Self::parse_blend(text)
        } else if text.starts_with("shade/") {
            Self::parse_shade(text)
        } else {
            Rgba::parse(text)
                .map(Self::Basic)
                .ok_or_else(|| ThemeError::Format(format!("Could not parse color '{}'", text)))
        }
    }

    fn parse_custom(text: &str, rest: &str) -> Result<Self> {
        let Some(args) = rest.strip_prefix('(') else {
            return Err(ThemeError::Format(format!(
                "GTK custom color specification must have color name and fallback in parentheses, e.g. gtk:custom(foo,bar); could not parse '{}'",
                text
            )));
        };

        let name_end = args.find(',').unwrap_or(args.len());
        let name = &args[..name_end];
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ThemeError::Format(format!(
                "Invalid character '{}' in color_name parameter of gtk:custom, only A-Za-z0-9-_ are valid",
                bad
            )));
        }

        let fallback_start = (name_end + 1).min(args.len());
        let fallback_end = args.rfind(')');
        let bad_format = || {
            ThemeError::Format(format!(
                "Gtk:custom format is 'gtk:custom(color_name,fallback)', '{}' does not fit the format",
                text
            ))
        };

        let fallback_end = fallback_end.ok_or_else(bad_format)?;
        if name.is_empty() || fallback_start >= args.len() || fallback_end < fallback_start {
            return Err(bad_format());
        }

        let fallback = Self::parse(&args[fallback_start..fallback_end])?;
        Ok(Self::Custom {
            name: name.to_string(),
            fallback: Box::new(fallback),
        })
    }

    fn parse_gtk(text: &str, rest: &str) -> Result<Self> {
        let Some(open) = rest.find('[') else {
            return Err(ThemeError::Format(format!(
                "GTK color specification must have the state in brackets, e.g. gtk:fg[NORMAL] where NORMAL is the state; could not parse '{}'",
                text
            )));
        };
        let Some(close) = rest[open + 1..].find(']').map(|i| i + open + 1) else {
            return Err(ThemeError::Format(format!(
                "GTK color specification must have a close bracket after the state, e.g. gtk:fg[NORMAL] where NORMAL is the state; could not parse '{}'",
                text
            )));
        };

        let state_name = &rest[open + 1..close];
        let state = state_name.parse::<WidgetState>().map_err(|_| {
            ThemeError::Format(format!(
                "Did not understand state '{}' in color specification",
                state_name
            ))
        })?;

        let component_name = &rest[..open];
        let component = component_name.parse::<ColorComponent>().map_err(|_| {
            ThemeError::Format(format!(
                "Did not understand color component '{}' in color specification",
                component_name
            ))
        })?;

        Ok(Self::Gtk { component, state })
    }

    fn parse_blend(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.splitn(4, '/').collect();
        let [_, bg, fg, alpha_text] = parts[..] else {
            return Err(ThemeError::Format(format!(
                "Blend format is 'blend/bg_color/fg_color/alpha', '{}' does not fit the format",
                text
            )));
        };

        let alpha = parse_leading_float(alpha_text).ok_or_else(|| {
            ThemeError::Format(format!(
                "Could not parse alpha value '{}' in blended color",
                alpha_text
            ))
        })?;

        if !(-RANGE_TOLERANCE..=1.0 + RANGE_TOLERANCE).contains(&alpha) {
            return Err(ThemeError::Format(format!(
                "Alpha value '{}' in blended color is not between 0.0 and 1.0",
                alpha_text
            )));
        }

        let background = Self::parse(bg)?;
        let foreground = Self::parse(fg)?;
        Ok(Self::blend(background, foreground, alpha))
    }

    fn parse_shade(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.splitn(3, '/').collect();
        let [_, base, factor_text] = parts[..] else {
            return Err(ThemeError::Format(format!(
                "Shade format is 'shade/base_color/factor', '{}' does not fit the format",
                text
            )));
        };

        let factor = parse_leading_float(factor_text).ok_or_else(|| {
            ThemeError::Format(format!(
                "Could not parse shade factor '{}' in shaded color",
                factor_text
            ))
        })?;

        if factor < -RANGE_TOLERANCE {
            return Err(ThemeError::Format(format!(
                "Shade factor '{}' in shaded color is negative",
                factor_text
            )));
        }

        Ok(Self::shade(Self::parse(base)?, factor))
    }

    /// Resolve to a concrete color
    pub fn render(&self, provider: &dyn StyleProvider) -> Rgba {
        match self {
            Self::Basic(color) => *color,
            Self::Gtk { component, state } => component.resolve(provider, *state),
            Self::Custom { name, fallback } => provider
                .lookup_color(name)
                .unwrap_or_else(|| fallback.render(provider)),
            Self::Blend {
                background,
                foreground,
                alpha,
                cache,
            } => {
                let bg = background.render(provider);
                let fg = foreground.render(provider);
                let color = Rgba::blend(bg, fg, *alpha);
                cache.set(Some(color));
                color
            }
            Self::Shade {
                base,
                factor,
                cache,
            } => {
                let color = base.render(provider).shade(*factor);
                cache.set(Some(color));
                color
            }
        }
    }

    /// Most recently rendered blend or shade color
    pub fn cached(&self) -> Option<Rgba> {
        match self {
            Self::Blend { cache, .. } | Self::Shade { cache, .. } => cache.get(),
            _ => None,
        }
    }
}

impl FromStr for ColorSpec {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
