//! Frame Flags
//!
//! Window state bits the host passes in when asking for a frame style or a
//! frame geometry, plus the frame type taxonomy.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::theme::error::ThemeError;
use crate::theme::frame_style::{FrameFocus, FrameResize, FrameState};

bitflags! {
    /// Frame flags - capabilities and state of the decorated window
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u32 {
        const ALLOWS_DELETE            = 1 << 0;
        const ALLOWS_MENU              = 1 << 1;
        const ALLOWS_APPMENU           = 1 << 2;
        const ALLOWS_MINIMIZE          = 1 << 3;
        const ALLOWS_MAXIMIZE          = 1 << 4;
        const ALLOWS_VERTICAL_RESIZE   = 1 << 5;
        const ALLOWS_HORIZONTAL_RESIZE = 1 << 6;
        const HAS_FOCUS                = 1 << 7;
        const SHADED                   = 1 << 8;
        const STUCK                    = 1 << 9;
        const MAXIMIZED                = 1 << 10;
        const ALLOWS_SHADE             = 1 << 11;
        const ALLOWS_MOVE              = 1 << 12;
        const FULLSCREEN               = 1 << 13;
        const IS_FLASHING              = 1 << 14;
        const ABOVE                    = 1 << 15;
        const TILED_LEFT               = 1 << 16;
        const TILED_RIGHT              = 1 << 17;
    }
}

impl Default for FrameFlags {
    /// An ordinary resizable, focused-capable toplevel
    fn default() -> Self {
        Self::ALLOWS_DELETE
            | Self::ALLOWS_MENU
            | Self::ALLOWS_MINIMIZE
            | Self::ALLOWS_MAXIMIZE
            | Self::ALLOWS_VERTICAL_RESIZE
            | Self::ALLOWS_HORIZONTAL_RESIZE
            | Self::ALLOWS_SHADE
            | Self::ALLOWS_MOVE
    }
}

impl FrameFlags {
    pub fn is_tiled(&self) -> bool {
        self.intersects(Self::TILED_LEFT | Self::TILED_RIGHT)
    }

    /// Focus used for style selection; flashing inverts it
    pub fn draws_focused(&self) -> bool {
        self.contains(Self::HAS_FOCUS) != self.contains(Self::IS_FLASHING)
    }

    /// Maximized wins over tiling; tiled left and right never coexist
    pub fn frame_state(&self) -> FrameState {
        let shaded = self.contains(Self::SHADED);
        if self.contains(Self::MAXIMIZED) {
            if shaded { FrameState::MaximizedAndShaded } else { FrameState::Maximized }
        } else if self.contains(Self::TILED_LEFT) {
            if shaded { FrameState::TiledLeftAndShaded } else { FrameState::TiledLeft }
        } else if self.contains(Self::TILED_RIGHT) {
            if shaded { FrameState::TiledRightAndShaded } else { FrameState::TiledRight }
        } else if shaded {
            FrameState::Shaded
        } else {
            FrameState::Normal
        }
    }

    pub fn frame_resize(&self) -> FrameResize {
        match (
            self.contains(Self::ALLOWS_VERTICAL_RESIZE),
            self.contains(Self::ALLOWS_HORIZONTAL_RESIZE),
        ) {
            (false, false) => FrameResize::None,
            (true, false) => FrameResize::Vertical,
            (false, true) => FrameResize::Horizontal,
            (true, true) => FrameResize::Both,
        }
    }

    pub fn frame_focus(&self) -> FrameFocus {
        FrameFocus::from(self.draws_focused())
    }
}

/// Kind of window being decorated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Normal,
    Dialog,
    ModalDialog,
    Utility,
    Menu,
    Border,
    Attached,
}

impl FrameType {
    pub const ALL: [FrameType; 7] = [
        Self::Normal,
        Self::Dialog,
        Self::ModalDialog,
        Self::Utility,
        Self::Menu,
        Self::Border,
        Self::Attached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Dialog => "dialog",
            Self::ModalDialog => "modal_dialog",
            Self::Utility => "utility",
            Self::Menu => "menu",
            Self::Border => "border",
            Self::Attached => "attached",
        }
    }
}

impl FromStr for FrameType {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ThemeError::Format(format!("Unknown type \"{}\" on <window> element", s)))
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
