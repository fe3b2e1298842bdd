//! Titlebar button layout
//!
//! Parsed from strings like `"menu:minimize,maximize,close"`: buttons left of
//! the colon go in the left corner, the rest in the right corner.

use std::str::FromStr;

use tracing::debug;

use crate::theme::frame_style::ButtonFunction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonLayout {
    pub left: Vec<ButtonFunction>,
    pub right: Vec<ButtonFunction>,
}

impl Default for ButtonLayout {
    fn default() -> Self {
        Self::parse("menu:minimize,maximize,close")
    }
}

impl ButtonLayout {
    /// Unknown or repeated names are skipped. Naming one half of a toggle
    /// pair adds both halves; flags decide which one is shown.
    pub fn parse(layout: &str) -> Self {
        let (left, right) = layout.split_once(':').unwrap_or((layout, ""));
        let mut used = Vec::new();
        let left = Self::parse_side(left, &mut used);
        let right = Self::parse_side(right, &mut used);
        Self { left, right }
    }

    fn parse_side(side: &str, used: &mut Vec<ButtonFunction>) -> Vec<ButtonFunction> {
        let mut buttons = Vec::new();

        for name in side.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let function = match name.parse::<ButtonFunction>() {
                Ok(f) if !f.is_background() && !used.contains(&f) => f,
                _ => {
                    debug!("Ignoring unknown or already-used button name - '{}'", name);
                    continue;
                }
            };

            used.push(function);
            buttons.push(function);
            if let Some(opposite) = function.opposite() {
                used.push(opposite);
                buttons.push(opposite);
            }
        }

        buttons
    }

    /// Mirror image for right-to-left locales
    pub fn inverted(&self) -> Self {
        Self {
            left: self.right.iter().rev().copied().collect(),
            right: self.left.iter().rev().copied().collect(),
        }
    }

    /// Layout with some functions taken out
    pub fn without(&self, hidden: impl Fn(&ButtonFunction) -> bool) -> Self {
        Self {
            left: self.left.iter().filter(|f| !hidden(f)).copied().collect(),
            right: self.right.iter().filter(|f| !hidden(f)).copied().collect(),
        }
    }
}

impl FromStr for ButtonLayout {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = ButtonLayout::default();
        assert_eq!(layout.left, vec![ButtonFunction::Menu]);
        assert_eq!(
            layout.right,
            vec![
                ButtonFunction::Minimize,
                ButtonFunction::Maximize,
                ButtonFunction::Close
            ]
        );
    }

    #[test]
    fn test_parse_skips_unknown_duplicate_and_background() {
        let layout = ButtonLayout::parse("close,bogus,close:left_left_background,menu,close");
        assert_eq!(layout.left, vec![ButtonFunction::Close]);
        assert_eq!(layout.right, vec![ButtonFunction::Menu]);
    }

    #[test]
    fn test_toggles_add_both_halves() {
        let layout = ButtonLayout::parse("shade:unstick");
        assert_eq!(layout.left, vec![ButtonFunction::Shade, ButtonFunction::Unshade]);
        assert_eq!(layout.right, vec![ButtonFunction::Unstick, ButtonFunction::Stick]);
    }

    #[test]
    fn test_no_colon_is_left_only() {
        let layout = ButtonLayout::parse("menu");
        assert_eq!(layout.left, vec![ButtonFunction::Menu]);
        assert!(layout.right.is_empty());
    }

    #[test]
    fn test_inverted_and_without() {
        let layout = ButtonLayout::parse("menu:minimize,close").inverted();
        assert_eq!(layout.left, vec![ButtonFunction::Close, ButtonFunction::Minimize]);
        assert_eq!(layout.right, vec![ButtonFunction::Menu]);

        let trimmed = layout.without(|f| *f == ButtonFunction::Minimize);
        assert_eq!(trimmed.left, vec![ButtonFunction::Close]);
    }
}
