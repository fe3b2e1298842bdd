//! Title text
//!
//! Fonts come from the system font database (fontdb) and are laid out and
//! rasterized with ab_glyph. Layout is a single line: kerning pairs are
//! applied but there is no shaping beyond that.

use std::fmt;

use ab_glyph::{point, Font, FontArc, FontVec, Glyph, PxScale, ScaleFont};
use fontdb::{Database, Family, Query};
use tracing::{debug, warn};

use crate::render::canvas::TitleLayout;
use crate::shared::{Point, Rect};
use crate::theme::error::{Result, ThemeError};

const ELLIPSIS: &str = "\u{2026}";

/// Families tried after the requested one
const FALLBACK_FAMILIES: &[&str] = &["Cantarell", "Noto Sans", "DejaVu Sans"];

/// A font at a fixed pixel size
#[derive(Clone)]
pub struct TitleFont {
    font: FontArc,
    scale: PxScale,
}

impl fmt::Debug for TitleFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleFont").field("size", &self.scale.y).finish()
    }
}

impl TitleFont {
    pub fn new(font: FontArc, size: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(size),
        }
    }

    /// Font from TrueType/OpenType data
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self> {
        let font = FontVec::try_from_vec(data)?;
        Ok(Self::new(FontArc::new(font), size))
    }

    /// First installed face out of `family`, a few common sans families and
    /// the generic sans-serif; any face at all as a last resort
    pub fn load_system(family: Option<&str>, size: f32) -> Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();

        let mut families: Vec<Family<'_>> = Vec::new();
        if let Some(name) = family {
            families.push(Family::Name(name));
        }
        families.extend(FALLBACK_FAMILIES.iter().map(|&name| Family::Name(name)));
        families.push(Family::SansSerif);

        for candidate in families {
            if let Some(id) = db.query(&Query {
                families: &[candidate],
                ..Default::default()
            }) && let Some(font) = load_face(&db, id)
            {
                return Ok(Self::new(font, size));
            }
        }

        for face in db.faces() {
            if let Some(font) = load_face(&db, face.id) {
                return Ok(Self::new(font, size));
            }
        }

        Err(ThemeError::NoFont(family.unwrap_or("sans-serif").to_string()))
    }

    pub fn size(&self) -> f32 {
        self.scale.y
    }

    /// Glyphs positioned on a baseline `ascent` below the origin, and the
    /// total advance
    fn glyphs(&self, text: &str) -> (Vec<Glyph>, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = scaled.ascent();

        let mut caret = 0.0f32;
        let mut previous = None;
        let mut glyphs = Vec::new();
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        (glyphs, caret.max(0.0))
    }

    /// Horizontal advance of `text`
    pub fn advance(&self, text: &str) -> f64 {
        self.glyphs(text).1 as f64
    }

    /// Measure `text`; the layout keeps this font so a canvas can draw it
    pub fn layout(&self, text: &str) -> TitleLayout {
        let scaled = self.font.as_scaled(self.scale);
        let (glyphs, advance) = self.glyphs(text);

        let mut ink: Option<Rect> = None;
        for glyph in glyphs {
            let Some(outline) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let b = outline.px_bounds();
            let r = Rect::new(
                b.min.x as f64,
                b.min.y as f64,
                (b.max.x - b.min.x) as f64,
                (b.max.y - b.min.y) as f64,
            );
            ink = Some(match ink {
                Some(u) => union(u, r),
                None => r,
            });
        }

        TitleLayout {
            text: text.to_string(),
            logical: Rect::new(
                0.0,
                0.0,
                advance as f64,
                (scaled.ascent() - scaled.descent()) as f64,
            ),
            ink: ink.unwrap_or_default(),
            font: Some(self.clone()),
        }
    }

    /// `text` cut at the end with an ellipsis so its advance fits `width`
    pub fn ellipsize(&self, text: &str, width: f64) -> String {
        if self.advance(text) <= width {
            return text.to_string();
        }
        if self.advance(ELLIPSIS) > width {
            return String::new();
        }

        let mut kept = String::new();
        for ch in text.chars() {
            let mut candidate = kept.clone();
            candidate.push(ch);
            candidate.push_str(ELLIPSIS);
            if self.advance(&candidate) > width {
                break;
            }
            kept.push(ch);
        }

        let mut result = kept.trim_end().to_string();
        result.push_str(ELLIPSIS);
        result
    }

    /// Coverage of every pixel `text` touches when laid out at `origin`
    pub fn rasterize(&self, text: &str, origin: Point, mut plot: impl FnMut(i32, i32, f32)) {
        let (glyphs, _) = self.glyphs(text);
        for mut glyph in glyphs {
            glyph.position = point(
                glyph.position.x + origin.x as f32,
                glyph.position.y + origin.y as f32,
            );
            if let Some(outline) = self.font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                outline.draw(|x, y, coverage| {
                    plot(
                        bounds.min.x as i32 + x as i32,
                        bounds.min.y as i32 + y as i32,
                        coverage,
                    );
                });
            }
        }
    }
}

/// Faces that fail to decode are skipped
fn load_face(db: &Database, id: fontdb::ID) -> Option<FontArc> {
    let font = db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
    })?;

    match font {
        Ok(font) => {
            if let Some(face) = db.face(id) {
                debug!("Using font {:?} for titles", face.post_script_name);
            }
            Some(FontArc::new(font))
        }
        Err(e) => {
            warn!("Skipping undecodable font face {:?}: {}", id, e);
            None
        }
    }
}

fn union(a: Rect, b: Rect) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    Rect::new(x, y, a.right().max(b.right()) - x, a.bottom().max(b.bottom()) - y)
}
