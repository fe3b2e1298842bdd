//! Color and alpha gradients

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::render::canvas::{AlphaMask, Canvas, LinearGradient, Paint};
use crate::shared::{Point, Rect};
use crate::theme::color::{ColorSpec, Rgba, StyleProvider};
use crate::theme::error::{Result, ThemeError};

/// Gradient direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    Vertical,
    Horizontal,
    Diagonal,
}

impl GradientType {
    /// Unit-space end point; every direction starts at the top-left corner
    fn end_point(&self) -> Point {
        match self {
            Self::Horizontal => Point::new(1.0, 0.0),
            Self::Vertical => Point::new(0.0, 1.0),
            Self::Diagonal => Point::new(1.0, 1.0),
        }
    }
}

impl FromStr for GradientType {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vertical" => Ok(Self::Vertical),
            "horizontal" => Ok(Self::Horizontal),
            "diagonal" => Ok(Self::Diagonal),
            _ => Err(ThemeError::Format(format!(
                "Did not understand value \"{}\" for type of gradient",
                s
            ))),
        }
    }
}

/// Offset of stop `i` out of `n`, evenly spread over [0, 1]
fn stop_offset(i: usize, n: usize) -> f64 {
    if n > 1 {
        i as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

/// Direction plus an ordered list of colors
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    pub gradient_type: GradientType,
    pub color_specs: Vec<ColorSpec>,
}

impl GradientSpec {
    pub fn new(gradient_type: GradientType) -> Self {
        Self {
            gradient_type,
            color_specs: Vec::new(),
        }
    }

    pub fn add_color_spec(&mut self, spec: ColorSpec) {
        self.color_specs.push(spec);
    }

    pub fn validate(&self) -> Result<()> {
        if self.color_specs.len() < 2 {
            return Err(ThemeError::Gradient(
                "Gradients should have at least two colors".into(),
            ));
        }
        Ok(())
    }

    /// Resolve into a paint over `rect`. Without an alpha spec every stop is
    /// opaque; a single alpha applies to all stops.
    pub fn to_paint(
        &self,
        alpha_spec: Option<&AlphaGradientSpec>,
        provider: &dyn StyleProvider,
        rect: Rect,
    ) -> Option<Paint> {
        let n = self.color_specs.len();
        if n == 0 {
            return None;
        }

        let stops = self
            .color_specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let color = spec.render(provider);
                let alpha = alpha_spec.map_or(1.0, |a| a.alpha_for_stop(i) as f64 / 255.0);
                (stop_offset(i, n), color.with_alpha(alpha))
            })
            .collect();

        Some(Paint::Linear(LinearGradient {
            rect,
            start: Point::new(0.0, 0.0),
            end: self.gradient_type.end_point(),
            stops,
        }))
    }

    pub fn render(
        &self,
        alpha_spec: Option<&AlphaGradientSpec>,
        canvas: &mut dyn Canvas,
        provider: &dyn StyleProvider,
        rect: Rect,
    ) {
        if let Some(paint) = self.to_paint(alpha_spec, provider, rect) {
            canvas.fill_rect(rect, &paint);
        }
    }
}

/// Direction plus an ordered list of alpha bytes
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaGradientSpec {
    pub gradient_type: GradientType,
    pub alphas: Vec<u8>,
}

impl AlphaGradientSpec {
    pub fn new(gradient_type: GradientType, alphas: &[f64]) -> Self {
        Self {
            gradient_type,
            alphas: alphas.iter().map(|&a| Rgba::alpha_byte(a)).collect(),
        }
    }

    /// Parse a colon separated list such as `"1.0:0.5"`
    pub fn parse(text: &str) -> Result<Self> {
        let alphas = text
            .split(':')
            .map(|part| {
                let part = part.trim();
                let value = part.parse::<f64>().map_err(|_| {
                    ThemeError::Format(format!(
                        "Could not parse \"{}\" as a floating point number",
                        part
                    ))
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(ThemeError::Format(format!(
                        "Alpha must be between 0.0 (invisible) and 1.0 (fully opaque), was {}",
                        value
                    )));
                }
                Ok(value)
            })
            .collect::<Result<Vec<f64>>>()?;

        // Alpha ramps are always horizontal
        Ok(Self::new(GradientType::Horizontal, &alphas))
    }

    pub fn n_alphas(&self) -> usize {
        self.alphas.len()
    }

    pub fn alpha(&self, i: usize) -> u8 {
        self.alphas.get(i).copied().unwrap_or(255)
    }

    fn alpha_for_stop(&self, i: usize) -> u8 {
        if self.alphas.len() == 1 {
            self.alphas[0]
        } else {
            self.alpha(i)
        }
    }

    /// Fill `rect` with `color` modulated by this ramp. No spec or a single
    /// alpha gives a flat fill.
    pub fn render(spec: Option<&Self>, color: Rgba, canvas: &mut dyn Canvas, rect: Rect) {
        match spec {
            Some(spec) if spec.alphas.len() > 1 => {
                let n = spec.alphas.len();
                let stops = spec
                    .alphas
                    .iter()
                    .enumerate()
                    .map(|(i, a)| (stop_offset(i, n), color.with_alpha(*a as f64 / 255.0)))
                    .collect();
                let paint = Paint::Linear(LinearGradient {
                    rect,
                    start: Point::new(0.0, 0.0),
                    end: Point::new(1.0, 0.0),
                    stops,
                });
                canvas.fill_rect(rect, &paint);
            }
            Some(spec) => {
                let color = color.with_alpha(spec.alpha(0) as f64 / 255.0);
                canvas.fill_rect(rect, &Paint::Solid(color));
            }
            None => canvas.fill_rect(rect, &Paint::Solid(color)),
        }
    }

    pub fn mask(&self) -> Option<AlphaMask> {
        match self.alphas.len() {
            0 => None,
            1 => Some(AlphaMask::Constant(self.alphas[0])),
            _ => Some(AlphaMask::Horizontal(self.alphas.clone())),
        }
    }
}
