//! Theme error types
//!
//! `ExprError` covers coordinate expressions, `ThemeError` everything that can
//! stop a theme from loading. Render-time problems never surface here; they
//! are logged and replaced with safe defaults by the draw code.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while tokenizing or evaluating a coordinate expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Coordinate expression contains character '{0}' which is not allowed")]
    BadCharacter(char),

    #[error("Coordinate expression contained unknown operator at the start of this text: \"{0}\"")]
    UnknownOperator(String),

    #[error("Coordinate expression contains floating point number '{0}' which could not be parsed")]
    BadFloat(String),

    #[error("Coordinate expression contains integer '{0}' which could not be parsed")]
    BadInteger(String),

    #[error("Coordinate expression was empty or not understood")]
    Empty,

    #[error("Coordinate expression had a close parenthesis with no open parenthesis")]
    UnmatchedClose,

    #[error("Coordinate expression had an open parenthesis with no close parenthesis")]
    UnmatchedOpen,

    #[error("Coordinate expression had unknown variable or constant '{0}'")]
    UnknownVariable(String),

    #[error("Coordinate expression results in division by zero")]
    DivideByZero,

    #[error("{0}")]
    Malformed(String),
}

impl ExprError {
    /// Parenthesis mismatches form their own class of failure
    pub fn is_bad_parens(&self) -> bool {
        matches!(self, Self::UnmatchedClose | Self::UnmatchedOpen)
    }
}

/// Failure while building or validating a theme
#[derive(Error, Debug)]
pub enum ThemeError {
    /// Malformed attribute text (color specs, enum names, alpha lists)
    #[error("{0}")]
    Format(String),

    #[error("{0}")]
    FrameGeometry(String),

    #[error("Bad expression '{expr}': {source}")]
    Expression {
        expr: String,
        #[source]
        source: ExprError,
    },

    #[error("{0}")]
    Gradient(String),

    /// A required element is absent (button, style, frame state, metadata)
    #[error("{0}")]
    Missing(String),

    #[error("{0}")]
    Constant(String),

    #[error("Draw op list '{0}' would end up containing itself")]
    ListContainsSelf(String),

    #[error("No {kind} named '{name}' has been defined")]
    UnknownReference { kind: &'static str, name: String },

    #[error("Failed to load image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read theme file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode font: {0}")]
    FontData(#[from] ab_glyph::InvalidFont),

    #[error("No usable font found for '{0}'")]
    NoFont(String),

    #[error("Failed to parse theme description: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ThemeError>;
