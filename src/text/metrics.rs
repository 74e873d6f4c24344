use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};

use crate::error::{PosterError, PosterResult};

/// Tight ink box of a rendered string, relative to its baseline origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct TextExtents {
    /// Distance from the baseline up to the highest ink.
    pub ascent: f32,
    /// Distance from the baseline down to the lowest ink.
    pub descent: f32,
    pub ink_width: f32,
    pub ink_height: f32,
}

/// Measures strings for the layout engine.
///
/// Implementations must be pure: identical arguments give identical extents.
pub trait FontMetrics {
    fn measure(
        &self,
        text: &str,
        font_file: &Path,
        font_size: u32,
        angle: f32,
    ) -> PosterResult<TextExtents>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    pub id: u16,
    /// Pen offset from the run origin, in pixels.
    pub x: f32,
}

/// A parsed TrueType/OpenType face plus the blob handed to the rasterizer.
pub struct LoadedFont {
    face: OwnedFace,
    data: vello_cpu::peniko::FontData,
}

impl fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFont")
            .field("units_per_em", &self.face.as_face_ref().units_per_em())
            .field("glyphs", &self.face.as_face_ref().number_of_glyphs())
            .finish_non_exhaustive()
    }
}

impl LoadedFont {
    pub fn from_bytes(bytes: Vec<u8>) -> PosterResult<Self> {
        let data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes.clone()), 0);
        let face = OwnedFace::from_vec(bytes, 0)
            .map_err(|e| PosterError::invalid_font(format!("cannot parse font face: {e}")))?;
        Ok(Self { face, data })
    }

    pub fn load(path: &Path) -> PosterResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            PosterError::invalid_font(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_bytes(bytes).map_err(|e| match e {
            PosterError::InvalidFont(msg) => {
                PosterError::invalid_font(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.data
    }

    fn scale(&self, size: f32) -> f32 {
        size / f32::from(self.face.as_face_ref().units_per_em().max(1))
    }

    fn glyph_for(&self, ch: char) -> GlyphId {
        let face = self.face.as_face_ref();
        face.glyph_index(ch)
            .or_else(|| face.glyph_index('\u{FFFD}'))
            .or_else(|| face.glyph_index('?'))
            .unwrap_or(GlyphId(0))
    }

    /// Pen positions of every char of `text`; spaces get `word_spacing` extra pixels.
    pub fn positioned_glyphs(
        &self,
        text: &str,
        size: f32,
        word_spacing: f32,
    ) -> Vec<PositionedGlyph> {
        let face = self.face.as_face_ref();
        let scale = self.scale(size);
        let mut pen = 0.0f32;
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let gid = self.glyph_for(ch);
            out.push(PositionedGlyph { id: gid.0, x: pen });
            pen += scale * f32::from(face.glyph_hor_advance(gid).unwrap_or_default());
            if ch == ' ' {
                pen += word_spacing;
            }
        }
        out
    }

    /// Box that any glyph of the run fits in, relative to the run origin (y down).
    pub fn run_bounds(&self, glyphs: &[PositionedGlyph], size: f32) -> kurbo::Rect {
        let bb = self.face.as_face_ref().global_bounding_box();
        let scale = f64::from(self.scale(size));
        let first = glyphs.first().map_or(0.0, |g| f64::from(g.x));
        let last = glyphs.last().map_or(0.0, |g| f64::from(g.x));
        kurbo::Rect::new(
            first + scale * f64::from(bb.x_min),
            -scale * f64::from(bb.y_max),
            last + scale * f64::from(bb.x_max),
            -scale * f64::from(bb.y_min),
        )
    }

    /// Ink box of `text` at `size`, rotated counter-clockwise by `angle` degrees.
    pub fn extents(&self, text: &str, size: f32, angle: f32) -> TextExtents {
        let face = self.face.as_face_ref();
        let scale = self.scale(size);

        // corners in screen space (y grows downwards from the baseline)
        let mut corners: Vec<(f32, f32)> = Vec::new();
        for glyph in self.positioned_glyphs(text, size, 0.0) {
            let Some(bb) = face.glyph_bounding_box(GlyphId(glyph.id)) else {
                continue;
            };
            let left = glyph.x + scale * f32::from(bb.x_min);
            let right = glyph.x + scale * f32::from(bb.x_max);
            let top = -scale * f32::from(bb.y_max);
            let bottom = -scale * f32::from(bb.y_min);
            corners.extend([(left, top), (right, top), (left, bottom), (right, bottom)]);
        }
        if corners.is_empty() {
            return TextExtents::default();
        }

        if angle != 0.0 {
            let (sin, cos) = angle.to_radians().sin_cos();
            for (x, y) in &mut corners {
                let (rx, ry) = (*x * cos + *y * sin, -*x * sin + *y * cos);
                *x = rx;
                *y = ry;
            }
        }

        let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        TextExtents {
            ascent: -min_y,
            descent: max_y,
            ink_width: max_x - min_x,
            ink_height: max_y - min_y,
        }
    }
}

/// Loads fonts from disk on first use and keeps them for the owner's lifetime.
#[derive(Clone, Debug, Default)]
pub struct FontCache {
    fonts: RefCell<HashMap<PathBuf, Arc<LoadedFont>>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> PosterResult<Arc<LoadedFont>> {
        if let Some(font) = self.fonts.borrow().get(path) {
            return Ok(Arc::clone(font));
        }

        let font = Arc::new(LoadedFont::load(path)?);
        tracing::debug!(path = %path.display(), "loaded font");
        self.fonts
            .borrow_mut()
            .insert(path.to_path_buf(), Arc::clone(&font));
        Ok(font)
    }
}

impl FontMetrics for FontCache {
    fn measure(
        &self,
        text: &str,
        font_file: &Path,
        font_size: u32,
        angle: f32,
    ) -> PosterResult<TextExtents> {
        let font = self.get(font_file)?;
        Ok(font.extents(text, font_size as f32, angle))
    }
}
