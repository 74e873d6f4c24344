use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    color::{Rgb8, Rgba8},
    error::PosterResult,
    surface::PixelRect,
};

use super::{
    fit::FitSolver,
    layout::{LayoutResult, place},
    metrics::FontMetrics,
    model::{Boundary, BoundingBox, TextStyle},
};

const DEBUG_OPACITY: u8 = 50;

/// One line handed to the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font_file: &'a Path,
    pub font_size: u32,
    pub angle: f32,
    pub x: f32,
    pub baseline: f32,
    pub word_spacing: f32,
    pub color: Rgba8,
}

/// Drawing operations the text renderer needs from a canvas.
pub trait TextSurface {
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba8) -> PosterResult<()>;
    fn draw_text(&mut self, run: &TextRun<'_>) -> PosterResult<()>;
}

/// Random light colour with every channel in `150..=255`.
pub fn pastel_color(seed: Option<u64>) -> Rgb8 {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Rgb8::new(
        rng.gen_range(150..=255),
        rng.gen_range(150..=255),
        rng.gen_range(150..=255),
    )
}

pub struct TextRenderer<'a, M: ?Sized> {
    metrics: &'a M,
}

impl<'a, M: FontMetrics + ?Sized> TextRenderer<'a, M> {
    pub fn new(metrics: &'a M) -> Self {
        Self { metrics }
    }

    /// Fits and places `text` without drawing anything.
    pub fn layout(
        &self,
        text: &str,
        bbox: &BoundingBox,
        style: &TextStyle,
    ) -> PosterResult<LayoutResult> {
        let fit = FitSolver::new(self.metrics).fit(text, bbox, style)?;
        let mut layout = place(fit.lines, bbox, style, fit.font_size);
        layout.converged = fit.converged;
        Ok(layout)
    }

    #[tracing::instrument(skip(self, surface, text, style), fields(chars = text.len()))]
    pub fn draw<S: TextSurface + ?Sized>(
        &self,
        surface: &mut S,
        text: &str,
        bbox: &BoundingBox,
        style: &TextStyle,
    ) -> PosterResult<Boundary> {
        let layout = self.layout(text, bbox, style)?;
        let font_file = style.validate()?;

        if style.debug {
            let rect = PixelRect::new(
                i64::from(bbox.x),
                i64::from(bbox.y),
                bbox.width,
                bbox.height,
            );
            let pastel = pastel_color(style.debug_seed).with_opacity(DEBUG_OPACITY);
            surface.fill_rect(rect, pastel)?;
        }

        let color = style.color.with_opacity(style.opacity);
        for line in layout.lines.iter().filter(|l| !l.text.is_empty()) {
            surface.draw_text(&TextRun {
                text: &line.text,
                font_file,
                font_size: layout.font_size,
                angle: style.angle,
                x: line.x,
                baseline: line.baseline,
                word_spacing: line.word_spacing,
                color,
            })?;
        }

        tracing::debug!(
            font_size = layout.font_size,
            lines = layout.lines.len(),
            converged = layout.converged,
            "text block drawn"
        );
        Ok(layout.boundary)
    }
}
